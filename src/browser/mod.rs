// src/browser/mod.rs

mod chrome;
pub(crate) mod scripts;

pub use chrome::{ChromePage, ChromeSession};

use crate::{error::AppResult, models::ObservedResponse};
use async_trait::async_trait;
use serde_json::Value;

/// 每收到一次网络响应调用一次，可能在任意时刻从后台任务中触发
pub type ResponseCallback = Box<dyn Fn(ObservedResponse) + Send + Sync + 'static>;

/// 流水线对浏览器页面的全部需求。
///
/// 所有方法都是一次到浏览器进程的往返；查询类方法在元素不存在时返回 `Ok(None)`，
/// 只有会话本身出错时才返回 `Err`。
#[async_trait]
pub trait PageController: Send + Sync {
    async fn navigate(&self, url: &str) -> AppResult<()>;

    async fn element_exists(&self, selector: &str) -> AppResult<bool>;

    /// 第一个匹配元素的可见文本
    async fn element_text(&self, selector: &str) -> AppResult<Option<String>>;

    async fn element_attribute(&self, selector: &str, name: &str) -> AppResult<Option<String>>;

    /// 所有文本中包含 `needle` 的最内层元素的文本，按文档顺序
    async fn texts_containing(&self, needle: &str) -> AppResult<Vec<String>>;

    /// 第一个文本包含 `needle` 的元素的父元素文本
    async fn container_text(&self, needle: &str) -> AppResult<Option<String>>;

    /// 在页面中执行脚本，等待 Promise 完成并按值返回
    async fn evaluate(&self, script: &str) -> AppResult<Value>;

    /// 在浏览器内部读取媒体句柄 (如 blob: 地址) 的全部字节
    async fn read_media_bytes(&self, handle: &str) -> AppResult<Vec<u8>>;

    async fn on_response(&self, callback: ResponseCallback) -> AppResult<()>;

    async fn send_key(&self, key: &str) -> AppResult<()>;

    async fn click(&self, x: f64, y: f64) -> AppResult<()>;

    async fn click_element(&self, selector: &str) -> AppResult<()>;

    async fn scroll(&self, dx: f64, dy: f64) -> AppResult<()>;
}
