// src/constants.rs

pub const UI_WIDTH: usize = 88;
pub const MAX_FILENAME_BYTES: usize = 200;
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = concat!(clap::crate_name!(), ".log");
pub const LOG_FALLBACK_FILE_NAME: &str = "fallback.log";

pub const DEFAULT_START_URL: &str = "https://www.douyin.com/video/7595199982089571619";
pub const DEFAULT_VIDEOS_DIR: &str = "videos";
pub const DEFAULT_RESULTS_FILE: &str = "crawled_data.json";
pub const DEFAULT_PROFILE_DIR: &str = ".browser_data";
pub const DEFAULT_ITEM_COUNT: usize = 50;

/// 小于等于该大小的媒体文件视为下载不完整或损坏 (100 KiB)
pub const MIN_MEDIA_BYTES: u64 = 102_400;
pub const MEDIA_EXTENSION: &str = "mp4";

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_REFERER: &str = "https://www.douyin.com/";

pub mod naming {
    pub const UNKNOWN_SERIES_SENTINEL: &str = "Unknown";
    pub const FALLBACK_SERIES_NAME: &str = "UnknownDrama";
    pub const FALLBACK_EPISODE_TITLE: &str = "Unknown Episode";
    pub const SERIES_SEPARATOR: char = '·';
    pub const TITLE_SEPARATOR: char = '|';
    pub const TITLE_MAX_CHARS: usize = 50;
}

pub mod capture {
    /// URL 中出现任意一项即视为可能的媒体请求
    pub const MEDIA_URL_MARKERS: &[&str] = &[".mp4", ".m3u8", "/video/"];
    pub const DEFAULT_CDN_TOKENS: &[&str] = &["tos-cn", "douyinvod"];
    pub const BLOB_SCHEME: &str = "blob:";
}

pub mod selectors {
    pub const VIDEO: &str = "video";
    pub const VIDEO_SOURCE: &str = "video source";
    pub const TITLE_HEADING: &str = "h1";
    pub const DESCRIPTION: &str = "[data-e2e='video-desc']";
    pub const LOGIN_CLOSE: &str = ".dy-account-close";
    pub const DRAMA_KEYWORDS: &[&str] = &["短剧", "剧场"];
    pub const MEDIA_URL_ATTRIBUTES: &[&str] = &["data-src", "data-video-src", "data-url"];
}
