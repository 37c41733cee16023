// src/browser/chrome.rs

use super::{PageController, ResponseCallback, scripts};
use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    models::ObservedResponse,
};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chromiumoxide::{
    Browser, BrowserConfig, Page,
    cdp::browser_protocol::{
        input::{DispatchMouseEventParams, DispatchMouseEventType},
        network::{EnableParams, EventResponseReceived},
    },
    cdp::js_protocol::runtime::EvaluateParams,
    layout::Point,
};
use futures::StreamExt;
use log::{debug, info, warn};
use serde_json::Value;
use std::{
    fs,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tokio::task::JoinHandle;

/// 一个浏览器会话：自行启动的 Chrome，或连接到已在运行的 Chrome
pub struct ChromeSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Arc<ChromePage>,
    attached: bool,
}

impl ChromeSession {
    /// 以持久化的用户目录启动一个有界面的 Chrome，登录状态在多次运行间保留
    pub async fn launch(config: &AppConfig) -> AppResult<Self> {
        fs::create_dir_all(&config.profile_dir)?;
        let profile_dir = dunce::canonicalize(&config.profile_dir)?;
        info!("使用浏览器用户目录: {}", profile_dir.display());

        let browser_config = BrowserConfig::builder()
            .with_head()
            .user_data_dir(profile_dir)
            .window_size(1280, 720)
            .arg("--start-maximized")
            .arg(format!("--user-agent={}", config.user_agent))
            .request_timeout(config.navigation_timeout)
            .build()
            .map_err(AppError::Browser)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(AppError::browser)?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("浏览器事件处理出错: {}", e);
                }
            }
        });

        let page = browser.new_page("about:blank").await.map_err(AppError::browser)?;
        Ok(Self {
            browser,
            handler_task,
            page: Arc::new(ChromePage::new(page)),
            attached: false,
        })
    }

    /// 连接到已开启远程调试的 Chrome，例如 `http://127.0.0.1:9222`
    pub async fn connect(debugger_url: &str) -> AppResult<Self> {
        info!("连接到已运行的浏览器: {}", debugger_url);
        let (browser, mut handler) = Browser::connect(debugger_url)
            .await
            .map_err(AppError::browser)?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("浏览器事件处理出错: {}", e);
                }
            }
        });

        // 给 handler 一点时间发现已有的标签页
        tokio::time::sleep(Duration::from_millis(500)).await;
        let existing = browser.pages().await.map_err(AppError::browser)?;
        let page = match existing.into_iter().next() {
            Some(page) => page,
            None => browser.new_page("about:blank").await.map_err(AppError::browser)?,
        };
        Ok(Self {
            browser,
            handler_task,
            page: Arc::new(ChromePage::new(page)),
            attached: true,
        })
    }

    pub fn page(&self) -> Arc<ChromePage> {
        self.page.clone()
    }

    /// 关闭自行启动的浏览器；连接模式下只断开连接
    pub async fn close(mut self) -> AppResult<()> {
        self.page.stop_listeners();
        if !self.attached {
            self.browser.close().await.map_err(AppError::browser)?;
            if let Err(e) = self.browser.wait().await {
                warn!("等待浏览器进程退出失败: {}", e);
            }
        }
        self.handler_task.abort();
        Ok(())
    }

    /// 结束程序但保留浏览器进程，下次运行可继续使用同一个登录会话
    pub fn leave_running(self) {
        info!("保留浏览器进程，不关闭会话。");
        std::mem::forget(self);
    }
}

pub struct ChromePage {
    page: Page,
    listeners: Mutex<Vec<JoinHandle<()>>>,
}

impl ChromePage {
    fn new(page: Page) -> Self {
        Self {
            page,
            listeners: Mutex::new(Vec::new()),
        }
    }

    fn stop_listeners(&self) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        for task in listeners.drain(..) {
            task.abort();
        }
    }

    async fn evaluate_as<T: serde::de::DeserializeOwned>(&self, script: &str) -> AppResult<T> {
        let value = self.evaluate(script).await?;
        Ok(serde_json::from_value(value)?)
    }
}

fn header_content_type(headers: &Value) -> Option<String> {
    headers.as_object()?.iter().find_map(|(name, value)| {
        if name.eq_ignore_ascii_case("content-type") {
            value.as_str().map(str::to_string)
        } else {
            None
        }
    })
}

#[async_trait]
impl PageController for ChromePage {
    async fn navigate(&self, url: &str) -> AppResult<()> {
        self.page.goto(url).await.map_err(AppError::browser)?;
        Ok(())
    }

    async fn element_exists(&self, selector: &str) -> AppResult<bool> {
        self.evaluate_as(&scripts::element_exists(selector)).await
    }

    async fn element_text(&self, selector: &str) -> AppResult<Option<String>> {
        self.evaluate_as(&scripts::element_text(selector)).await
    }

    async fn element_attribute(&self, selector: &str, name: &str) -> AppResult<Option<String>> {
        self.evaluate_as(&scripts::element_attribute(selector, name)).await
    }

    async fn texts_containing(&self, needle: &str) -> AppResult<Vec<String>> {
        self.evaluate_as(&scripts::texts_containing(needle)).await
    }

    async fn container_text(&self, needle: &str) -> AppResult<Option<String>> {
        self.evaluate_as(&scripts::container_text(needle)).await
    }

    async fn evaluate(&self, script: &str) -> AppResult<Value> {
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(AppError::Browser)?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(AppError::browser)?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn read_media_bytes(&self, handle: &str) -> AppResult<Vec<u8>> {
        let encoded: String = self.evaluate_as(&scripts::read_media_bytes(handle)).await?;
        Ok(BASE64.decode(encoded.as_bytes())?)
    }

    async fn on_response(&self, callback: ResponseCallback) -> AppResult<()> {
        self.page
            .execute(EnableParams::default())
            .await
            .map_err(AppError::browser)?;
        let mut events = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(AppError::browser)?;

        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let response = &event.response;
                let headers = serde_json::to_value(&response.headers).unwrap_or(Value::Null);
                let content_type =
                    header_content_type(&headers).unwrap_or_else(|| response.mime_type.clone());
                callback(ObservedResponse {
                    url: response.url.clone(),
                    status: u16::try_from(response.status).unwrap_or(0),
                    content_type,
                });
            }
            debug!("网络响应事件流已结束");
        });
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task);
        Ok(())
    }

    async fn send_key(&self, key: &str) -> AppResult<()> {
        let body = self.page.find_element("body").await.map_err(AppError::browser)?;
        body.press_key(key).await.map_err(AppError::browser)?;
        Ok(())
    }

    async fn click(&self, x: f64, y: f64) -> AppResult<()> {
        self.page.click(Point { x, y }).await.map_err(AppError::browser)?;
        Ok(())
    }

    async fn click_element(&self, selector: &str) -> AppResult<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| AppError::ElementNotFound(selector.to_string()))?;
        element.click().await.map_err(AppError::browser)?;
        Ok(())
    }

    async fn scroll(&self, dx: f64, dy: f64) -> AppResult<()> {
        let params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseWheel)
            .x(640.0)
            .y(360.0)
            .delta_x(dx)
            .delta_y(dy)
            .build()
            .map_err(AppError::Browser)?;
        self.page.execute(params).await.map_err(AppError::browser)?;
        Ok(())
    }
}
