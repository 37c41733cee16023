// src/downloader/in_browser.rs

use super::strategy::DownloadStrategy;
use crate::{
    browser::PageController,
    error::{AppError, AppResult},
    models::DownloadCandidate,
};
use async_trait::async_trait;
use log::debug;
use std::{fs, path::Path, sync::Arc};

/// 让页面自己读取 video 元素上的地址，适用于 blob: 这类只在页面内有效的句柄
pub struct InBrowserRead {
    page: Arc<dyn PageController>,
}

impl InBrowserRead {
    pub fn new(page: Arc<dyn PageController>) -> Self {
        Self { page }
    }

    fn element_handle(candidates: &[DownloadCandidate]) -> Option<&str> {
        candidates.iter().find_map(|c| match c {
            DownloadCandidate::Element(handle) => Some(handle.as_str()),
            DownloadCandidate::Captured(_) => None,
        })
    }
}

#[async_trait]
impl DownloadStrategy for InBrowserRead {
    fn name(&self) -> &'static str {
        "浏览器内读取"
    }

    fn is_applicable(&self, candidates: &[DownloadCandidate]) -> bool {
        Self::element_handle(candidates).is_some()
    }

    async fn attempt(&self, candidates: &[DownloadCandidate], dest: &Path) -> AppResult<()> {
        let handle = Self::element_handle(candidates)
            .ok_or_else(|| AppError::StrategyUnavailable("没有页面内的视频句柄".into()))?;
        let bytes = self.page.read_media_bytes(handle).await?;
        debug!("浏览器内读取到 {} 字节", bytes.len());
        fs::write(dest, bytes)?;
        Ok(())
    }
}
