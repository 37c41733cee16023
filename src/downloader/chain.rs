// src/downloader/chain.rs

use super::{
    direct::DirectTransfer, dom_discovery::DomDiscovery, in_browser::InBrowserRead,
    strategy::DownloadStrategy,
};
use crate::{
    browser::PageController,
    client::RobustClient,
    config::AppConfig,
    constants,
    error::AppResult,
    models::DownloadCandidate,
    symbols, utils,
};
use log::{debug, info, warn};
use std::{fs, path::Path, sync::Arc, time::Duration};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// 目标文件已存在且大小可信，没有发起任何传输
    AlreadyPresent { size: u64 },
    Downloaded { strategy: &'static str, size: u64 },
    Failed { reason: String },
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, DownloadOutcome::Failed { .. })
    }
}

/// 按固定顺序尝试各个下载策略，每个策略独立重试
pub struct Downloader {
    strategies: Vec<Box<dyn DownloadStrategy>>,
    attempts: u32,
    retry_delay: Duration,
}

impl Downloader {
    /// 默认策略顺序：直接下载 → 浏览器内读取 → 页面地址发现
    pub fn new(client: Arc<RobustClient>, page: Arc<dyn PageController>, config: &AppConfig) -> Self {
        let strategies: Vec<Box<dyn DownloadStrategy>> = vec![
            Box::new(DirectTransfer::new(client.clone())),
            Box::new(InBrowserRead::new(page.clone())),
            Box::new(DomDiscovery::new(
                page,
                client,
                config.selectors.video.clone(),
                config.settle_delay,
            )),
        ];
        Self::with_strategies(strategies, config.attempts_per_strategy, config.retry_delay)
    }

    /// 每个策略至少尝试两次
    pub fn with_strategies(
        strategies: Vec<Box<dyn DownloadStrategy>>,
        attempts: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            strategies,
            attempts: attempts.max(2),
            retry_delay,
        }
    }

    pub async fn download(
        &self,
        candidates: &[DownloadCandidate],
        dest: &Path,
    ) -> AppResult<DownloadOutcome> {
        if utils::is_plausible_media(dest) {
            let size = utils::file_size(dest).unwrap_or_default();
            info!("文件已存在且大小正常 ({}): {}", utils::human_megabytes(size), dest.display());
            return Ok(DownloadOutcome::AlreadyPresent { size });
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut last_reason = String::from("没有可用的下载策略");
        for strategy in &self.strategies {
            if !strategy.is_applicable(candidates) {
                debug!("策略 '{}' 不适用，跳过", strategy.name());
                continue;
            }
            for attempt in 1..=self.attempts {
                if attempt > 1 {
                    tokio::time::sleep(self.retry_delay).await;
                }
                debug!("策略 '{}' 第 {}/{} 次尝试", strategy.name(), attempt, self.attempts);
                match strategy.attempt(candidates, dest).await {
                    Ok(()) => {
                        let size = utils::file_size(dest).unwrap_or_default();
                        if size > constants::MIN_MEDIA_BYTES {
                            info!("策略 '{}' 成功，文件大小 {}", strategy.name(), utils::human_megabytes(size));
                            return Ok(DownloadOutcome::Downloaded {
                                strategy: strategy.name(),
                                size,
                            });
                        }
                        last_reason = format!("{}: 文件过小 ({} 字节)", strategy.name(), size);
                        warn!("{}，删除后重试", last_reason);
                    }
                    Err(e) => {
                        last_reason = format!("{}: {}", strategy.name(), e);
                        warn!("策略 '{}' 第 {} 次尝试失败: {}", strategy.name(), attempt, e);
                    }
                }
                remove_partial(dest);
            }
            println!(
                "  {} 下载方式 '{}' 失败，尝试下一种...",
                *symbols::WARN,
                strategy.name()
            );
        }
        Ok(DownloadOutcome::Failed { reason: last_reason })
    }
}

fn remove_partial(dest: &Path) {
    if !dest.exists() {
        return;
    }
    if let Err(e) = fs::remove_file(dest) {
        warn!("删除不完整文件 '{}' 失败: {}", dest.display(), e);
    }
}
