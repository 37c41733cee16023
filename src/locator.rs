// src/locator.rs

use crate::{
    browser::PageController,
    config::SelectorConfig,
    constants,
    error::AppResult,
    models::{DownloadCandidate, ObservedResponse},
    symbols, utils,
};
use log::{debug, info};
use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tokio::time::Instant;

/// 判断一次网络响应是否像是视频文件
#[derive(Debug, Clone)]
pub struct MediaMatcher {
    cdn_tokens: Vec<String>,
}

impl MediaMatcher {
    pub fn new(cdn_tokens: Vec<String>) -> Self {
        Self { cdn_tokens }
    }

    pub fn is_media_url(&self, url: &str) -> bool {
        constants::capture::MEDIA_URL_MARKERS.iter().any(|m| url.contains(m))
            || self.cdn_tokens.iter().any(|t| !t.is_empty() && url.contains(t.as_str()))
    }

    pub fn matches(&self, response: &ObservedResponse) -> bool {
        (200..300).contains(&response.status)
            && response.content_type.to_lowercase().contains("video")
            && self.is_media_url(&response.url)
    }
}

/// 当前这一集捕获到的媒体地址，按观察顺序保存且不重复。
///
/// 由网络事件任务写入、主循环读取；切换到下一集时清空。
#[derive(Clone, Default)]
pub struct CaptureScope {
    urls: Arc<Mutex<Vec<String>>>,
}

impl CaptureScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个新地址，已存在则忽略并返回 false
    pub fn push(&self, url: &str) -> bool {
        let mut urls = self.urls.lock().unwrap_or_else(PoisonError::into_inner);
        if urls.iter().any(|u| u == url) {
            return false;
        }
        urls.push(url.to_string());
        true
    }

    pub fn observe(&self, response: &ObservedResponse, matcher: &MediaMatcher) -> bool {
        if !matcher.matches(response) {
            return false;
        }
        let added = self.push(&response.url);
        if added {
            debug!("捕获到视频地址: {}", response.url);
            println!("  {} 捕获到视频地址: {}", *symbols::CAPTURE, utils::truncate_text(&response.url, 80));
        }
        added
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn latest(&self) -> Option<String> {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }

    pub fn len(&self) -> usize {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut urls = self.urls.lock().unwrap_or_else(PoisonError::into_inner);
        if !urls.is_empty() {
            debug!("清空 {} 个已捕获的视频地址", urls.len());
        }
        urls.clear();
    }
}

/// 为当前显示的视频找出下载候选
pub struct MediaLocator<'a> {
    page: &'a dyn PageController,
    selectors: &'a SelectorConfig,
}

impl<'a> MediaLocator<'a> {
    pub fn new(page: &'a dyn PageController, selectors: &'a SelectorConfig) -> Self {
        Self { page, selectors }
    }

    /// video 元素的 src，没有时取第一个 source 子元素的 src
    pub async fn element_reference(&self) -> AppResult<Option<String>> {
        let src = self
            .page
            .element_attribute(&self.selectors.video, "src")
            .await?
            .filter(|s| !s.trim().is_empty());
        if src.is_some() {
            return Ok(src);
        }
        Ok(self
            .page
            .element_attribute(&self.selectors.video_source, "src")
            .await?
            .filter(|s| !s.trim().is_empty()))
    }

    /// 在限定时间内等待 video 元素出现
    pub async fn wait_for_media(&self, timeout: Duration) -> AppResult<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.page.element_exists(&self.selectors.video).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                info!("等待 video 元素超时 ({:?})", timeout);
                return Ok(false);
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    pub async fn locate(&self, scope: &CaptureScope) -> AppResult<Vec<DownloadCandidate>> {
        let element_ref = self.element_reference().await?;
        Ok(rank_candidates(element_ref.as_deref(), scope))
    }
}

/// 捕获到的地址从新到旧排在前面，页面元素地址放在最后
pub fn rank_candidates(element_ref: Option<&str>, scope: &CaptureScope) -> Vec<DownloadCandidate> {
    let mut candidates: Vec<DownloadCandidate> = scope
        .snapshot()
        .into_iter()
        .rev()
        .map(DownloadCandidate::Captured)
        .collect();
    if let Some(reference) = element_ref {
        candidates.push(DownloadCandidate::Element(reference.to_string()));
    }
    candidates
}
