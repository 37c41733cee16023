// src/downloader/direct.rs

use super::strategy::DownloadStrategy;
use crate::{
    client::RobustClient,
    error::{AppError, AppResult},
    models::DownloadCandidate,
    ui,
};
use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::Arc,
};

/// 在浏览器外直接请求排名第一的候选地址
pub struct DirectTransfer {
    client: Arc<RobustClient>,
}

impl DirectTransfer {
    pub fn new(client: Arc<RobustClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DownloadStrategy for DirectTransfer {
    fn name(&self) -> &'static str {
        "直接下载"
    }

    fn is_applicable(&self, candidates: &[DownloadCandidate]) -> bool {
        candidates.first().and_then(DownloadCandidate::direct_url).is_some()
    }

    async fn attempt(&self, candidates: &[DownloadCandidate], dest: &Path) -> AppResult<()> {
        let url = candidates
            .first()
            .and_then(DownloadCandidate::direct_url)
            .ok_or_else(|| AppError::StrategyUnavailable("首选候选不是 http(s) 地址".into()))?;
        fetch_to_file(&self.client, url, dest).await.map(drop)
    }
}

/// 流式 GET 到目标文件，返回写入的字节数
pub(super) async fn fetch_to_file(client: &RobustClient, url: &str, dest: &Path) -> AppResult<u64> {
    info!("开始下载: {} -> {}", url, dest.display());
    let res = client.get_with_headers(url, client.referer()).await?;
    let total = res.content_length();
    debug!("响应大小: {:?}", total);

    let pbar = ui::new_bytes_progress_bar(total, "下载");
    let mut writer = BufWriter::new(File::create(dest)?);
    let mut stream = res.bytes_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                pbar.abandon();
                return Err(e.into());
            }
        };
        writer.write_all(&chunk)?;
        written += chunk.len() as u64;
        pbar.inc(chunk.len() as u64);
    }
    writer.flush()?;
    pbar.finish_and_clear();
    debug!("写入 {} 字节到 {}", written, dest.display());
    Ok(written)
}
