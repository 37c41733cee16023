// src/client.rs

use crate::{config::AppConfig, error::*};
use reqwest::{IntoUrl, Response, header};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::sync::Arc;

#[derive(Clone)]
pub struct RobustClient {
    pub client: ClientWithMiddleware,
    config: Arc<AppConfig>,
}

impl RobustClient {
    pub fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(
            reqwest::Client::builder()
                .user_agent(config.user_agent.clone())
                .connect_timeout(config.connect_timeout)
                .read_timeout(config.timeout)
                .build()?,
        )
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build();

        Ok(Self { client, config })
    }

    pub fn referer(&self) -> &str {
        &self.config.referer
    }

    /// 附带 Referer 的 GET，非 2xx 状态视为错误
    pub async fn get_with_headers<T: IntoUrl>(&self, url: T, referer: &str) -> AppResult<Response> {
        let res = self
            .client
            .get(url)
            .header(header::REFERER, referer)
            .header(header::ACCEPT, "*/*")
            .send()
            .await?;
        Ok(res.error_for_status()?)
    }
}
