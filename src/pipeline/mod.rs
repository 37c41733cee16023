// src/pipeline/mod.rs

mod advance;
mod extract;

pub use advance::advance;
pub use extract::{extract_series, extract_title};

use crate::{
    CrawlContext,
    browser::PageController,
    downloader::{DownloadOutcome, Downloader},
    error::{AppError, AppResult},
    locator::{CaptureScope, MediaLocator, MediaMatcher, rank_candidates},
    models::{DownloadStatus, EpisodeRecord, ItemResult},
    namer,
    store::ResultStore,
    ui, utils,
};
use colored::*;
use log::{debug, error, info, warn};
use std::{
    fs,
    sync::{Arc, atomic::Ordering},
};

/// 逐集驱动：定位 → 命名 → 下载 (可选) → 记录 → 切换
pub struct PipelineDriver {
    context: CrawlContext,
    page: Arc<dyn PageController>,
    scope: CaptureScope,
    matcher: MediaMatcher,
    store: ResultStore,
    downloader: Downloader,
}

impl PipelineDriver {
    pub fn new(context: CrawlContext, page: Arc<dyn PageController>) -> Self {
        let downloader = Downloader::new(context.http_client.clone(), page.clone(), &context.config);
        Self::with_downloader(context, page, downloader)
    }

    pub fn with_downloader(context: CrawlContext, page: Arc<dyn PageController>, downloader: Downloader) -> Self {
        let matcher = MediaMatcher::new(context.config.cdn_tokens.clone());
        let store = ResultStore::open(&context.config.results_file);
        Self {
            context,
            page,
            scope: CaptureScope::new(),
            matcher,
            store,
            downloader,
        }
    }

    pub fn scope(&self) -> &CaptureScope {
        &self.scope
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// 注册网络监听并准备输出目录
    pub async fn start(&mut self) -> AppResult<()> {
        let config = &self.context.config;
        info!("已有记录 {} 条", self.store.records().len());
        if self.context.args.download_enabled() {
            fs::create_dir_all(&config.videos_dir)?;
        }

        let scope = self.scope.clone();
        let matcher = self.matcher.clone();
        self.page
            .on_response(Box::new(move |response| {
                scope.observe(&response, &matcher);
            }))
            .await?;
        self.scope.clear();
        Ok(())
    }

    /// 从 `start_index` 开始处理 `count` 集。单集失败不会中断整个流程。
    pub async fn run(&mut self, start_index: usize, count: usize) -> AppResult<()> {
        self.context.manager.start_batch(count);
        for offset in 0..count {
            if self.context.cancellation_token.load(Ordering::Relaxed) {
                warn!("检测到用户中断，停止处理后续剧集");
                return Err(AppError::UserInterrupt);
            }

            let index = start_index + offset;
            ui::print_sub_header(&format!("第 {} 集 ({}/{})", index, offset + 1, count));
            let result = self.process_item(index).await;
            print_item_result(&result);
            self.context.manager.record(result);

            if offset + 1 == count {
                break;
            }
            let previous_ref = self.current_reference().await;
            if !advance(&*self.page, &self.context.config, &self.scope, previous_ref.as_deref()).await? {
                ui::warn("未检测到视频切换，继续处理当前页面");
            }
        }
        Ok(())
    }

    async fn current_reference(&self) -> Option<String> {
        MediaLocator::new(&*self.page, &self.context.config.selectors)
            .element_reference()
            .await
            .unwrap_or_else(|e| {
                debug!("读取当前视频地址失败: {}", e);
                None
            })
    }

    async fn process_item(&mut self, index: usize) -> ItemResult {
        match self.try_process_item(index).await {
            Ok(result) => result,
            Err(e) => {
                error!("处理第 {} 集时出错: {}", index, e);
                ItemResult {
                    label: format!("第{}集", index),
                    status: DownloadStatus::Errored,
                    message: Some(e.to_string()),
                }
            }
        }
    }

    async fn try_process_item(&mut self, index: usize) -> AppResult<ItemResult> {
        let config = self.context.config.clone();
        let page = &*self.page;
        let locator = MediaLocator::new(page, &config.selectors);
        let label = format!("第{}集", index);

        if !locator.wait_for_media(config.media_wait).await? {
            return Ok(ItemResult {
                label,
                status: DownloadStatus::NoMedia,
                message: Some("等待 video 元素超时".into()),
            });
        }
        tokio::time::sleep(config.settle_delay).await;

        let element_ref = locator.element_reference().await?;
        let candidates = rank_candidates(element_ref.as_deref(), &self.scope);
        let Some(source_url) = element_ref.or_else(|| self.scope.latest()) else {
            return Ok(ItemResult {
                label,
                status: DownloadStatus::NoMedia,
                message: None,
            });
        };

        let mut record = EpisodeRecord::new(index, source_url);
        match extract_title(page, &config.selectors).await {
            Some(title) => record.title = title,
            None => warn!("第 {} 集未提取到标题，使用默认值", index),
        }
        match extract_series(page, &config.selectors).await {
            Some(series) => record.series_raw = series,
            None => warn!("第 {} 集未提取到合集名，使用默认值", index),
        }
        ui::info(&format!(
            "标题: {} | 合集: {}",
            utils::truncate_text(&record.title, 40),
            utils::truncate_text(&record.series_raw, 40)
        ));

        let label = format!("第{}集 {}", index, namer::derive_episode_title(Some(&record.title)));
        let result = if self.context.args.download_enabled() {
            let dest = namer::episode_path(&config.videos_dir, &record);
            debug!("候选地址: {:?}", candidates);
            match self.downloader.download(&candidates, &dest).await? {
                DownloadOutcome::AlreadyPresent { .. } => {
                    record.mark_downloaded(dest);
                    ItemResult { label, status: DownloadStatus::Skipped, message: None }
                }
                DownloadOutcome::Downloaded { strategy, size } => {
                    record.mark_downloaded(dest);
                    ItemResult {
                        label,
                        status: DownloadStatus::Success,
                        message: Some(format!("{} ({})", strategy, utils::human_megabytes(size))),
                    }
                }
                DownloadOutcome::Failed { reason } => {
                    record.mark_failed();
                    ItemResult { label, status: DownloadStatus::Failed, message: Some(reason) }
                }
            }
        } else {
            ItemResult { label, status: DownloadStatus::MetadataOnly, message: None }
        };

        self.store.upsert(record)?;
        Ok(result)
    }
}

fn print_item_result(result: &ItemResult) {
    let (symbol, color, text) = result.status.get_display_info();
    match &result.message {
        Some(message) => println!("{} {} {}", symbol, color(text.into()), message.dimmed()),
        None => println!("{} {}", symbol, color(text.into())),
    }
}
