// src/pipeline/extract.rs

//! 尽力而为的元数据提取。每条规则返回 `Option`，未命中只记日志，由调用方保留默认值。

use crate::{
    browser::PageController,
    config::SelectorConfig,
    constants::naming,
    error::AppResult,
};
use log::{debug, warn};

/// 单条规则的页面查询失败时只记日志，按未命中处理
fn or_miss<T: Default>(rule: &str, result: AppResult<T>) -> T {
    result.unwrap_or_else(|e| {
        warn!("提取规则 '{}' 查询失败: {}", rule, e);
        T::default()
    })
}

/// 标题：优先 `h1`，其次视频描述
pub async fn extract_title(page: &dyn PageController, selectors: &SelectorConfig) -> Option<String> {
    for selector in [&selectors.title_heading, &selectors.description] {
        if let Some(text) = non_blank(or_miss(selector, page.element_text(selector).await)) {
            debug!("标题来自 '{}': {}", selector, text);
            return Some(text);
        }
    }
    debug!("未找到标题");
    None
}

/// 合集名：优先一个含 `·` 且含短剧关键词或较短的文本；否则取第一个关键词所在元素的父容器文本
pub async fn extract_series(page: &dyn PageController, selectors: &SelectorConfig) -> Option<String> {
    let separator = naming::SERIES_SEPARATOR.to_string();
    let texts = or_miss("texts_containing", page.texts_containing(&separator).await);
    if let Some(text) = pick_series_text(&texts, &selectors.drama_keywords) {
        debug!("合集名来自含 '·' 的元素: {}", text);
        return Some(text);
    }

    if let Some(keyword) = selectors.drama_keywords.first() {
        let container = non_blank(or_miss("container_text", page.container_text(keyword).await))
            .filter(|text| text.contains(naming::SERIES_SEPARATOR));
        if container.is_some() {
            debug!("合集名来自 '{}' 所在容器: {:?}", keyword, container);
            return container;
        }
    }
    debug!("未找到合集名");
    None
}

pub(crate) fn pick_series_text(texts: &[String], keywords: &[String]) -> Option<String> {
    texts
        .iter()
        .map(|t| t.trim())
        .filter(|t| t.contains(naming::SERIES_SEPARATOR))
        .find(|t| {
            keywords.iter().any(|k| t.contains(k.as_str()))
                || t.chars().count() < naming::TITLE_MAX_CHARS
        })
        .map(str::to_string)
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
