// tests/common/mod.rs

#![allow(dead_code)]

use async_trait::async_trait;
use drama_dl::{
    browser::{PageController, ResponseCallback},
    constants::selectors,
    error::{AppError, AppResult},
    models::ObservedResponse,
};
use serde_json::{Value, json};
use std::{
    path::PathBuf,
    sync::{Mutex, MutexGuard},
};

/// 页面上的一集
#[derive(Clone, Default)]
pub struct FakeEpisode {
    pub video_src: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub series_texts: Vec<String>,
    /// 关键词所在元素的父容器文本
    pub container_texts: Vec<String>,
    /// 页面地址发现脚本返回的地址
    pub dom_sources: Vec<String>,
}

impl FakeEpisode {
    pub fn with_src(src: &str) -> Self {
        Self {
            video_src: Some(src.to_string()),
            ..Default::default()
        }
    }
}

/// 内存中的页面，按 ArrowDown / 滚动切换到下一集
#[derive(Default)]
pub struct FakePage {
    episodes: Mutex<Vec<FakeEpisode>>,
    current: Mutex<usize>,
    callbacks: Mutex<Vec<ResponseCallback>>,
    media_bytes: Mutex<Option<Vec<u8>>>,
    watched_path: Mutex<Option<PathBuf>>,
    pub read_calls: Mutex<Vec<String>>,
    /// 每次 read_media_bytes 被调用时，被监视文件是否存在
    pub watched_existed_on_read: Mutex<Vec<bool>>,
    pub evaluate_calls: Mutex<usize>,
    pub keys: Mutex<Vec<String>>,
    pub clicks: Mutex<Vec<String>>,
    pub scrolls: Mutex<usize>,
    pub fail_keys: Mutex<bool>,
    pub fail_scroll: Mutex<bool>,
    pub fail_texts: Mutex<bool>,
    /// 设置后 evaluate 原样返回该值
    pub evaluate_result: Mutex<Option<Value>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap()
}

impl FakePage {
    pub fn new(episodes: Vec<FakeEpisode>) -> Self {
        Self {
            episodes: Mutex::new(episodes),
            ..Default::default()
        }
    }

    pub fn set_media_bytes(&self, bytes: Vec<u8>) {
        *lock(&self.media_bytes) = Some(bytes);
    }

    pub fn watch_path(&self, path: PathBuf) {
        *lock(&self.watched_path) = Some(path);
    }

    pub fn current_index(&self) -> usize {
        *lock(&self.current)
    }

    /// 模拟浏览器收到一次网络响应
    pub fn emit(&self, url: &str, status: u16, content_type: &str) {
        for callback in lock(&self.callbacks).iter() {
            callback(ObservedResponse {
                url: url.to_string(),
                status,
                content_type: content_type.to_string(),
            });
        }
    }

    fn episode(&self) -> Option<FakeEpisode> {
        let index = *lock(&self.current);
        lock(&self.episodes).get(index).cloned()
    }

    fn next_episode(&self) {
        let len = lock(&self.episodes).len();
        let mut current = lock(&self.current);
        if *current + 1 < len {
            *current += 1;
        }
    }
}

#[async_trait]
impl PageController for FakePage {
    async fn navigate(&self, _url: &str) -> AppResult<()> {
        Ok(())
    }

    async fn element_exists(&self, selector: &str) -> AppResult<bool> {
        let episode = self.episode();
        Ok(match selector {
            selectors::VIDEO => episode.is_some(),
            _ => false,
        })
    }

    async fn element_text(&self, selector: &str) -> AppResult<Option<String>> {
        let Some(episode) = self.episode() else {
            return Ok(None);
        };
        Ok(match selector {
            selectors::TITLE_HEADING => episode.title,
            selectors::DESCRIPTION => episode.description,
            _ => None,
        })
    }

    async fn element_attribute(&self, selector: &str, name: &str) -> AppResult<Option<String>> {
        let Some(episode) = self.episode() else {
            return Ok(None);
        };
        Ok(match (selector, name) {
            (selectors::VIDEO, "src") => episode.video_src,
            _ => None,
        })
    }

    async fn texts_containing(&self, needle: &str) -> AppResult<Vec<String>> {
        if *lock(&self.fail_texts) {
            return Err(AppError::Browser("Execution context was destroyed".into()));
        }
        Ok(self
            .episode()
            .map(|e| e.series_texts.into_iter().filter(|t| t.contains(needle)).collect())
            .unwrap_or_default())
    }

    async fn container_text(&self, needle: &str) -> AppResult<Option<String>> {
        Ok(self
            .episode()
            .and_then(|e| e.container_texts.into_iter().find(|t| t.contains(needle))))
    }

    async fn evaluate(&self, _script: &str) -> AppResult<Value> {
        *lock(&self.evaluate_calls) += 1;
        if let Some(value) = lock(&self.evaluate_result).clone() {
            return Ok(value);
        }
        Ok(json!(self.episode().map(|e| e.dom_sources).unwrap_or_default()))
    }

    async fn read_media_bytes(&self, handle: &str) -> AppResult<Vec<u8>> {
        lock(&self.read_calls).push(handle.to_string());
        if let Some(path) = lock(&self.watched_path).as_ref() {
            lock(&self.watched_existed_on_read).push(path.exists());
        }
        lock(&self.media_bytes)
            .clone()
            .ok_or_else(|| AppError::Browser("XHR failed with status 0".into()))
    }

    async fn on_response(&self, callback: ResponseCallback) -> AppResult<()> {
        lock(&self.callbacks).push(callback);
        Ok(())
    }

    async fn send_key(&self, key: &str) -> AppResult<()> {
        if *lock(&self.fail_keys) {
            return Err(AppError::Browser("key press rejected".into()));
        }
        lock(&self.keys).push(key.to_string());
        if key == "ArrowDown" {
            self.next_episode();
        }
        Ok(())
    }

    async fn click(&self, x: f64, y: f64) -> AppResult<()> {
        lock(&self.clicks).push(format!("{},{}", x, y));
        Ok(())
    }

    async fn click_element(&self, selector: &str) -> AppResult<()> {
        lock(&self.clicks).push(selector.to_string());
        Ok(())
    }

    async fn scroll(&self, _dx: f64, _dy: f64) -> AppResult<()> {
        if *lock(&self.fail_scroll) {
            return Err(AppError::Browser("target closed".into()));
        }
        *lock(&self.scrolls) += 1;
        self.next_episode();
        Ok(())
    }
}

/// 大于最小可信大小的视频内容
pub fn media_body() -> Vec<u8> {
    vec![7u8; 200 * 1024]
}
