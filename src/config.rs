// src/config.rs

pub mod file;

use self::file::load_or_create_external_config;
use crate::{constants, error::AppResult};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// 媒体 CDN 主机名中的特征片段
    pub cdn_tokens: Vec<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            cdn_tokens: constants::capture::DEFAULT_CDN_TOKENS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub video: String,
    pub video_source: String,
    pub title_heading: String,
    pub description: String,
    pub login_close: String,
    pub drama_keywords: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        use constants::selectors;
        Self {
            video: selectors::VIDEO.into(),
            video_source: selectors::VIDEO_SOURCE.into(),
            title_heading: selectors::TITLE_HEADING.into(),
            description: selectors::DESCRIPTION.into(),
            login_close: selectors::LOGIN_CLOSE.into(),
            drama_keywords: selectors::DRAMA_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub item_count: usize,
    pub attempts_per_strategy: u32,
    pub retry_delay_ms: u64,
    pub media_wait_secs: u64,
    pub settle_delay_ms: u64,
    pub navigation_timeout_secs: u64,
    pub advance_poll_attempts: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            item_count: constants::DEFAULT_ITEM_COUNT,
            attempts_per_strategy: 2,
            retry_delay_ms: 500,
            media_wait_secs: 10,
            settle_delay_ms: 2000,
            navigation_timeout_secs: 60,
            advance_poll_attempts: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub videos_dir: PathBuf,
    pub results_file: PathBuf,
    pub profile_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            videos_dir: PathBuf::from(constants::DEFAULT_VIDEOS_DIR),
            results_file: PathBuf::from(constants::DEFAULT_RESULTS_FILE),
            profile_dir: PathBuf::from(constants::DEFAULT_PROFILE_DIR),
        }
    }
}

/// 对应 `~/.drama-dl/config.json` 的文件结构，所有分区均可省略。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExternalConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub paths: PathConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub user_agent: String,
    pub referer: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub max_retries: u32,
    pub cdn_tokens: Vec<String>,
    pub selectors: SelectorConfig,
    pub item_count: usize,
    pub attempts_per_strategy: u32,
    pub retry_delay: Duration,
    pub media_wait: Duration,
    pub settle_delay: Duration,
    pub navigation_timeout: Duration,
    pub advance_poll_attempts: u32,
    pub advance_poll_interval: Duration,
    pub videos_dir: PathBuf,
    pub results_file: PathBuf,
    pub profile_dir: PathBuf,
}

impl AppConfig {
    pub fn new() -> AppResult<Self> {
        let external_config = load_or_create_external_config()?;
        Ok(Self::from_external(external_config))
    }

    pub fn from_external(external: ExternalConfig) -> Self {
        let network = external.network;
        let pipeline = external.pipeline;
        Self {
            user_agent: network.user_agent.unwrap_or_else(|| constants::USER_AGENT.into()),
            referer: network.referer.unwrap_or_else(|| constants::DEFAULT_REFERER.into()),
            connect_timeout: Duration::from_secs(network.connect_timeout_secs.unwrap_or(10)),
            timeout: Duration::from_secs(network.timeout_secs.unwrap_or(30)),
            max_retries: network.max_retries.unwrap_or(2),
            cdn_tokens: external.capture.cdn_tokens,
            selectors: external.selectors,
            item_count: pipeline.item_count,
            // 每个策略至少尝试两次
            attempts_per_strategy: pipeline.attempts_per_strategy.max(2),
            retry_delay: Duration::from_millis(pipeline.retry_delay_ms),
            media_wait: Duration::from_secs(pipeline.media_wait_secs),
            settle_delay: Duration::from_millis(pipeline.settle_delay_ms),
            navigation_timeout: Duration::from_secs(pipeline.navigation_timeout_secs),
            advance_poll_attempts: pipeline.advance_poll_attempts,
            advance_poll_interval: Duration::from_secs(1),
            videos_dir: external.paths.videos_dir,
            results_file: external.paths.results_file,
            profile_dir: external.paths.profile_dir,
        }
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_agent: "test-agent/1.0".to_string(),
            referer: constants::DEFAULT_REFERER.to_string(),
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
            max_retries: 0,
            cdn_tokens: CaptureConfig::default().cdn_tokens,
            selectors: SelectorConfig::default(),
            item_count: 3,
            attempts_per_strategy: 2,
            retry_delay: Duration::from_millis(10),
            media_wait: Duration::from_millis(200),
            settle_delay: Duration::from_millis(0),
            navigation_timeout: Duration::from_secs(5),
            advance_poll_attempts: 3,
            advance_poll_interval: Duration::from_millis(10),
            videos_dir: PathBuf::from(constants::DEFAULT_VIDEOS_DIR),
            results_file: PathBuf::from(constants::DEFAULT_RESULTS_FILE),
            profile_dir: PathBuf::from(constants::DEFAULT_PROFILE_DIR),
        }
    }
}
