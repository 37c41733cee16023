// src/store.rs

use crate::{error::AppResult, models::EpisodeRecord};
use log::{debug, info, warn};
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

/// 已处理剧集的结果文件 (JSON 数组)，每次写入都整体重写
pub struct ResultStore {
    path: PathBuf,
    records: Vec<EpisodeRecord>,
}

impl ResultStore {
    /// 打开结果文件；文件不存在或已损坏时从空集合开始
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = Self::load(&path);
        Self { path, records }
    }

    pub fn load(path: &Path) -> Vec<EpisodeRecord> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("结果文件 '{}' 不可读 ({})，从空记录开始", path.display(), e);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<EpisodeRecord>>(&content) {
            Ok(records) => {
                info!("从 '{}' 加载了 {} 条已有记录", path.display(), records.len());
                records
            }
            Err(e) => {
                warn!("结果文件 '{}' 无法解析，将视为空: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    pub fn records(&self) -> &[EpisodeRecord] {
        &self.records
    }

    pub fn find(&self, source_url: &str) -> Option<&EpisodeRecord> {
        self.records.iter().find(|r| r.source_url == source_url)
    }

    /// 按 `source_url` 替换或追加，然后立即落盘
    pub fn upsert(&mut self, record: EpisodeRecord) -> AppResult<()> {
        let before = self.records.len();
        self.records.retain(|r| r.source_url != record.source_url);
        if self.records.len() < before {
            debug!("替换已有记录: {}", record.source_url);
        }
        self.records.push(record);
        self.persist()
    }

    /// 先写同目录下的临时文件再改名，读者永远看不到写了一半的文件
    fn persist(&self) -> AppResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let temp = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, &self.records)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path)?;
        debug!("已保存 {} 条记录到 '{}'", self.records.len(), self.path.display());
        Ok(())
    }
}
