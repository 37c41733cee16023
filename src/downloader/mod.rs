// src/downloader/mod.rs

mod chain;
mod direct;
mod dom_discovery;
mod in_browser;
mod strategy;

pub use chain::{DownloadOutcome, Downloader};
pub use direct::DirectTransfer;
pub use dom_discovery::DomDiscovery;
pub use in_browser::InBrowserRead;
pub use strategy::DownloadStrategy;

// 整次运行的统计放在这里，流水线每处理完一集记录一次
use crate::{
    models::{DownloadStatus, ItemResult},
    symbols, ui,
};
use colored::*;
use itertools::Itertools;
use log::info;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DownloadStats {
    pub total: usize,
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
    pub metadata_only: usize,
    pub no_media: usize,
}

#[derive(Clone, Default)]
pub struct DownloadManager {
    stats: Arc<Mutex<DownloadStats>>,
    results: Arc<Mutex<Vec<ItemResult>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DownloadManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_batch(&self, total_items: usize) {
        info!("开始新一轮抓取，计划处理 {} 集", total_items);
        *lock(&self.stats) = DownloadStats {
            total: total_items,
            ..Default::default()
        };
        lock(&self.results).clear();
    }

    pub fn record(&self, result: ItemResult) {
        {
            let mut stats = lock(&self.stats);
            match result.status {
                DownloadStatus::Success => stats.success += 1,
                DownloadStatus::Skipped => stats.skipped += 1,
                DownloadStatus::Failed | DownloadStatus::Errored => stats.failed += 1,
                DownloadStatus::MetadataOnly => stats.metadata_only += 1,
                DownloadStatus::NoMedia => stats.no_media += 1,
            }
        }
        match result.status {
            DownloadStatus::Failed | DownloadStatus::Errored => {
                log::error!("'{}' 处理失败: {:?} {:?}", result.label, result.status, result.message)
            }
            _ => info!("'{}' 处理完成: {:?}", result.label, result.status),
        }
        lock(&self.results).push(result);
    }

    pub fn get_stats(&self) -> DownloadStats {
        lock(&self.stats).clone()
    }

    pub fn print_report(&self) {
        let stats = self.get_stats();
        let results = lock(&self.results);
        info!(
            "运行报告: Total={}, Processed={}, Success={}, Skipped={}, Failed={}, MetadataOnly={}, NoMedia={}",
            stats.total,
            results.len(),
            stats.success,
            stats.skipped,
            stats.failed,
            stats.metadata_only,
            stats.no_media
        );

        let failed: Vec<&ItemResult> = results
            .iter()
            .filter(|r| matches!(r.status, DownloadStatus::Failed | DownloadStatus::Errored))
            .collect();
        let no_media: Vec<&ItemResult> = results
            .iter()
            .filter(|r| r.status == DownloadStatus::NoMedia)
            .collect();

        if !failed.is_empty() || !no_media.is_empty() {
            ui::print_sub_header("处理详情报告");
            if !no_media.is_empty() {
                println!("\n{} 未找到视频的集 ({}个):", *symbols::WARN, no_media.len());
                print_grouped_report(&no_media, |s| s.yellow());
            }
            if !failed.is_empty() {
                println!("\n{} 失败的集 ({}个):", *symbols::ERROR, failed.len());
                print_grouped_report(&failed, |s| s.red());
            }
        }

        ui::print_sub_header("任务总结");
        if !results.is_empty() && stats.failed == 0 && stats.no_media == 0 {
            println!(
                "{} 已处理的 {} 集全部完成 ({} 个已存在, {} 个仅记录元数据)。",
                *symbols::OK,
                results.len(),
                stats.skipped,
                stats.metadata_only
            );
        } else {
            let summary = format!(
                "{} | {} | {} | {} | {}",
                format!("成功: {}", stats.success).green(),
                format!("失败: {}", stats.failed).red(),
                format!("跳过: {}", stats.skipped).yellow(),
                format!("仅元数据: {}", stats.metadata_only).cyan(),
                format!("无视频: {}", stats.no_media).yellow()
            );
            println!("{}", summary);
        }
    }
}

fn print_grouped_report(items: &[&ItemResult], color_fn: fn(ColoredString) -> ColoredString) {
    let grouped = items
        .iter()
        .map(|item| {
            let reason = item
                .message
                .clone()
                .unwrap_or_else(|| item.status.get_display_info().2.to_string());
            (reason, item.label.as_str())
        })
        .into_group_map();
    for reason in grouped.keys().sorted() {
        println!("  - {}", color_fn(format!("原因: {}", reason).into()));
        for label in grouped[reason].iter().sorted() {
            println!("    - {}", label);
        }
    }
}
