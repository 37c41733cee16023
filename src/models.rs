// src/models.rs

use crate::{constants, symbols, utils};
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 结果文件中的一条记录 (一集)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    #[serde(rename = "episode_index")]
    pub index: usize,
    /// 页面中 video 元素的播放地址，通常是 blob: 句柄
    #[serde(rename = "url")]
    pub source_url: String,
    pub title: String,
    #[serde(rename = "collection_raw")]
    pub series_raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloaded: Option<bool>,
}

impl EpisodeRecord {
    pub fn new(index: usize, source_url: impl Into<String>) -> Self {
        Self {
            index,
            source_url: source_url.into(),
            title: format!("Episode_{}", index),
            series_raw: constants::naming::UNKNOWN_SERIES_SENTINEL.to_string(),
            local_path: None,
            downloaded: None,
        }
    }

    pub fn mark_downloaded(&mut self, path: PathBuf) {
        self.local_path = Some(path);
        self.downloaded = Some(true);
    }

    pub fn mark_failed(&mut self) {
        self.local_path = None;
        self.downloaded = Some(false);
    }
}

/// 下载候选目标，按可信度从高到低排列
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadCandidate {
    /// 从网络响应中直接观察到的媒体地址
    Captured(String),
    /// 页面 video 元素上的播放地址，可能是不透明的 blob: 句柄
    Element(String),
}

impl DownloadCandidate {
    pub fn target(&self) -> &str {
        match self {
            DownloadCandidate::Captured(url) | DownloadCandidate::Element(url) => url,
        }
    }

    /// 可以在浏览器外直接请求的地址
    pub fn direct_url(&self) -> Option<&str> {
        match self {
            DownloadCandidate::Captured(url) => Some(url),
            DownloadCandidate::Element(url) if utils::is_http_url(url) => Some(url),
            DownloadCandidate::Element(_) => None,
        }
    }
}

/// 浏览器观察到的一次网络响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedResponse {
    pub url: String,
    pub status: u16,
    pub content_type: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DownloadStatus {
    Success,
    Skipped,
    Failed,
    MetadataOnly,
    NoMedia,
    Errored,
}

impl DownloadStatus {
    pub fn get_display_info(
        &self,
    ) -> (
        &'static ColoredString,
        fn(ColoredString) -> ColoredString,
        &'static str,
    ) {
        match self {
            DownloadStatus::Success => (&symbols::OK, |s| s.green(), "下载并校验成功"),
            DownloadStatus::Skipped => (&symbols::INFO, |s| s.cyan(), "文件已存在，跳过"),
            DownloadStatus::Failed => (&symbols::ERROR, |s| s.red(), "所有下载方式均失败"),
            DownloadStatus::MetadataOnly => (&symbols::INFO, |s| s.cyan(), "仅记录元数据"),
            DownloadStatus::NoMedia => (&symbols::WARN, |s| s.yellow(), "未找到视频地址"),
            DownloadStatus::Errored => (&symbols::ERROR, |s| s.red(), "处理时发生错误"),
        }
    }
}

/// 单集处理结果
#[derive(Debug, Clone)]
pub struct ItemResult {
    pub label: String,
    pub status: DownloadStatus,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_keys() {
        let mut record = EpisodeRecord::new(3, "blob:https://www.douyin.com/x");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["episode_index"], 3);
        assert_eq!(json["url"], "blob:https://www.douyin.com/x");
        assert_eq!(json["title"], "Episode_3");
        assert_eq!(json["collection_raw"], "Unknown");
        assert!(json.get("local_path").is_none());
        assert!(json.get("downloaded").is_none());

        record.mark_downloaded(PathBuf::from("videos/剧/第3集.mp4"));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["downloaded"], true);
        assert_eq!(json["local_path"], "videos/剧/第3集.mp4");
    }

    #[test]
    fn test_candidate_direct_url() {
        assert_eq!(DownloadCandidate::Captured("https://cdn/a.mp4".into()).direct_url(), Some("https://cdn/a.mp4"));
        assert_eq!(DownloadCandidate::Element("https://cdn/b.mp4".into()).direct_url(), Some("https://cdn/b.mp4"));
        assert_eq!(DownloadCandidate::Element("blob:https://www.douyin.com/c".into()).direct_url(), None);
    }
}
