// src/namer.rs

//! 由页面上抓取到的原始文本推导剧集目录名和单集文件名。
//! 所有函数都是纯函数，对任意输入都返回非空且可用作文件名的字符串。

use crate::{
    constants::{self, naming},
    models::EpisodeRecord,
    utils,
};
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

static ILLEGAL_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());

const WINDOWS_RESERVED: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// 剧集名: 取 `·` 之后的部分，例如 "短剧 · 某某剧" -> "某某剧"
pub fn derive_series_name(series_raw: Option<&str>) -> String {
    let raw = match series_raw {
        Some(raw) if !raw.trim().is_empty() && raw != naming::UNKNOWN_SERIES_SENTINEL => raw,
        _ => return naming::FALLBACK_SERIES_NAME.to_string(),
    };

    let name = match raw.split_once(naming::SERIES_SEPARATOR) {
        Some((_, after)) => after,
        None => raw,
    };

    sanitize_or(name.trim(), naming::FALLBACK_SERIES_NAME)
}

/// 单集标题: 有 `|` 时取其前的部分，否则取前 50 个字符
pub fn derive_episode_title(title_raw: Option<&str>) -> String {
    let raw = match title_raw {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return naming::FALLBACK_EPISODE_TITLE.to_string(),
    };

    let title = match raw.split_once(naming::TITLE_SEPARATOR) {
        Some((before, _)) => before,
        None => utils::take_chars(raw, naming::TITLE_MAX_CHARS),
    };

    sanitize_or(title.trim(), naming::FALLBACK_EPISODE_TITLE)
}

/// `<videos_dir>/<剧集名>/<单集标题>.mp4`
pub fn episode_path(videos_dir: &Path, record: &EpisodeRecord) -> PathBuf {
    let series = derive_series_name(Some(&record.series_raw));
    let episode = derive_episode_title(Some(&record.title));
    videos_dir
        .join(series)
        .join(format!("{}.{}", episode, constants::MEDIA_EXTENSION))
}

pub fn sanitize_filename(name: &str) -> String {
    let replaced = ILLEGAL_CHARS_RE.replace_all(name.trim(), "_");
    let replaced: String = replaced
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();
    let trimmed = replaced.trim().trim_matches(|c: char| c == '.' || c == ' ');

    let mut name = if WINDOWS_RESERVED.contains(&trimmed.to_uppercase().as_str()) {
        format!("_{}", trimmed)
    } else {
        trimmed.to_string()
    };

    if name.len() > constants::MAX_FILENAME_BYTES {
        name = safe_truncate_utf8(&name, constants::MAX_FILENAME_BYTES)
            .trim_end_matches(|c: char| c == '.' || c == ' ')
            .to_string();
    }
    name
}

fn sanitize_or(name: &str, fallback: &str) -> String {
    let sanitized = sanitize_filename(name);
    if sanitized.is_empty() { fallback.to_string() } else { sanitized }
}

fn safe_truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes { return s; }
    let mut i = max_bytes;
    while i > 0 && !s.is_char_boundary(i) { i -= 1; }
    &s[..i]
}
