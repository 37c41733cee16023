// src/browser/scripts.rs

//! 注入页面执行的脚本。参数一律经 JSON 编码后内联，避免引号转义问题。

use crate::constants::selectors;
use serde_json::json;

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

pub(crate) fn element_exists(selector: &str) -> String {
    format!("document.querySelector({}) !== null", js_string(selector))
}

pub(crate) fn element_text(selector: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); return el ? el.innerText : null; }})()",
        js_string(selector)
    )
}

pub(crate) fn element_attribute(selector: &str, name: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); return el ? el.getAttribute({}) : null; }})()",
        js_string(selector),
        js_string(name)
    )
}

/// 只保留最内层匹配元素，外层容器的文本会重复包含子元素文本
pub(crate) fn texts_containing(needle: &str) -> String {
    format!(
        r#"(() => {{
    const needle = {};
    const all = Array.from(document.body ? document.body.querySelectorAll('*') : []);
    const hits = all.filter(el => (el.innerText || '').includes(needle));
    return hits
        .filter(el => !Array.from(el.children).some(c => (c.innerText || '').includes(needle)))
        .map(el => el.innerText);
}})()"#,
        js_string(needle)
    )
}

pub(crate) fn container_text(needle: &str) -> String {
    format!(
        r#"(() => {{
    const needle = {};
    const all = Array.from(document.body ? document.body.querySelectorAll('*') : []);
    const hit = all.find(el => (el.innerText || '').includes(needle)
        && !Array.from(el.children).some(c => (c.innerText || '').includes(needle)));
    return hit && hit.parentElement ? hit.parentElement.innerText : null;
}})()"#,
        js_string(needle)
    )
}

/// 通过 XHR 在页面内读取句柄内容，以 base64 返回
pub(crate) fn read_media_bytes(handle: &str) -> String {
    format!(
        r#"(async (url) => new Promise((resolve, reject) => {{
    const xhr = new XMLHttpRequest();
    xhr.open('GET', url, true);
    xhr.responseType = 'blob';
    xhr.onload = () => {{
        if (xhr.status === 200) {{
            const reader = new FileReader();
            reader.onloadend = () => resolve(String(reader.result).split(',')[1] || '');
            reader.onerror = () => reject(new Error('FileReader failed'));
            reader.readAsDataURL(xhr.response);
        }} else {{
            reject(new Error('XHR failed with status ' + xhr.status));
        }}
    }};
    xhr.onerror = () => reject(new Error('XHR network error'));
    xhr.send();
}}))({})"#,
        js_string(handle)
    )
}

/// 收集 video 元素、其 source 子元素以及常见自定义属性上的所有地址
pub(crate) fn media_sources(video_selector: &str) -> String {
    let attrs = json!(selectors::MEDIA_URL_ATTRIBUTES);
    format!(
        r#"(() => {{
    const found = [];
    const video = document.querySelector({video});
    if (video && video.src) found.push(video.src);
    document.querySelectorAll({video} + ' source').forEach(s => {{ if (s.src) found.push(s.src); }});
    if (video) {{
        for (const attr of {attrs}) {{
            const value = video.getAttribute(attr);
            if (value) found.push(value);
        }}
    }}
    return found;
}})()"#,
        video = js_string(video_selector),
        attrs = attrs
    )
}
