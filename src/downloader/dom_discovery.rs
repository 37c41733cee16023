// src/downloader/dom_discovery.rs

use super::{direct::fetch_to_file, strategy::DownloadStrategy};
use crate::{
    browser::{PageController, scripts},
    client::RobustClient,
    constants,
    error::{AppError, AppResult},
    models::DownloadCandidate,
    utils,
};
use async_trait::async_trait;
use log::{debug, info};
use std::{path::Path, sync::Arc, time::Duration};

/// 重新检查 video 元素及其属性，寻找真实的 http(s) 地址再直接下载
pub struct DomDiscovery {
    page: Arc<dyn PageController>,
    client: Arc<RobustClient>,
    video_selector: String,
    settle_delay: Duration,
}

impl DomDiscovery {
    pub fn new(
        page: Arc<dyn PageController>,
        client: Arc<RobustClient>,
        video_selector: String,
        settle_delay: Duration,
    ) -> Self {
        Self {
            page,
            client,
            video_selector,
            settle_delay,
        }
    }

    async fn discover(&self) -> AppResult<Option<String>> {
        let value = self
            .page
            .evaluate(&scripts::media_sources(&self.video_selector))
            .await?;
        let sources: Vec<String> = serde_json::from_value(value)?;
        debug!("页面中找到 {} 个候选地址: {:?}", sources.len(), sources);
        Ok(pick_real_url(&sources))
    }
}

/// 第一个非 blob: 的 http(s) 地址
fn pick_real_url(sources: &[String]) -> Option<String> {
    sources
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.starts_with(constants::capture::BLOB_SCHEME) && utils::is_http_url(s))
        .map(str::to_string)
}

#[async_trait]
impl DownloadStrategy for DomDiscovery {
    fn name(&self) -> &'static str {
        "页面地址发现"
    }

    fn is_applicable(&self, _candidates: &[DownloadCandidate]) -> bool {
        true
    }

    async fn attempt(&self, _candidates: &[DownloadCandidate], dest: &Path) -> AppResult<()> {
        tokio::time::sleep(self.settle_delay).await;
        let url = self
            .discover()
            .await?
            .ok_or_else(|| AppError::StrategyUnavailable("页面中没有可直接下载的地址".into()))?;
        info!("从页面中发现真实地址: {}", url);
        fetch_to_file(&self.client, &url, dest).await.map(drop)
    }
}
