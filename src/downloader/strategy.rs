// src/downloader/strategy.rs

use crate::{error::AppResult, models::DownloadCandidate};
use async_trait::async_trait;
use std::path::Path;

/// 一种把候选目标写入本地文件的方式。
///
/// `attempt` 只负责写文件，大小校验和失败清理由 [`super::Downloader`] 统一处理。
#[async_trait]
pub trait DownloadStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// 候选列表中没有本策略可用的目标时返回 false，此时不消耗重试次数
    fn is_applicable(&self, candidates: &[DownloadCandidate]) -> bool;

    async fn attempt(&self, candidates: &[DownloadCandidate], dest: &Path) -> AppResult<()>;
}
