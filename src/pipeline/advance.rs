// src/pipeline/advance.rs

use crate::{
    browser::PageController,
    config::AppConfig,
    error::{AppError, AppResult},
    locator::{CaptureScope, MediaLocator},
};
use log::{debug, info, warn};
use std::time::Duration;

const FOCUS_POINT: (f64, f64) = (100.0, 100.0);
const KEY_DELAY: Duration = Duration::from_millis(500);
const SCROLL_DISTANCE: f64 = 1000.0;

/// 切换到下一集。
///
/// 返回 `Ok(true)` 表示页面上的视频地址已变化，`Ok(false)` 表示轮询超时 (不致命)；
/// 键盘和滚动两种方式都失败时返回 `Err`，视为浏览器会话已不可用。
pub async fn advance(
    page: &dyn PageController,
    config: &AppConfig,
    scope: &CaptureScope,
    previous_ref: Option<&str>,
) -> AppResult<bool> {
    scope.clear();

    if let Err(e) = press_next(page, config).await {
        warn!("键盘切换失败 ({})，改用滚动", e);
        page.scroll(0.0, SCROLL_DISTANCE)
            .await
            .map_err(|scroll_err| AppError::Browser(format!("无法切换到下一集: {}; {}", e, scroll_err)))?;
    }

    let locator = MediaLocator::new(page, &config.selectors);
    for poll in 1..=config.advance_poll_attempts {
        tokio::time::sleep(config.advance_poll_interval).await;
        let current = locator.element_reference().await.unwrap_or_else(|e| {
            debug!("轮询视频地址失败: {}", e);
            None
        });
        if current.is_some() && current.as_deref() != previous_ref {
            info!("第 {} 次轮询检测到新视频", poll);
            return Ok(true);
        }
    }
    warn!("等待下一集超时，继续处理当前页面");
    Ok(false)
}

async fn press_next(page: &dyn PageController, config: &AppConfig) -> AppResult<()> {
    // 先让页面获得焦点，方向键才会被播放器接收
    page.click(FOCUS_POINT.0, FOCUS_POINT.1).await?;
    page.click_element(&config.selectors.video).await?;
    tokio::time::sleep(KEY_DELAY).await;
    page.send_key("ArrowDown").await
}
