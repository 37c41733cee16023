// src/lib.rs

pub mod browser;
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod downloader;
pub mod error;
pub mod locator;
pub mod logging;
pub mod models;
pub mod namer;
pub mod pipeline;
pub mod store;
pub mod symbols;
pub mod ui;
pub mod utils;

use crate::{
    browser::{ChromeSession, PageController},
    cli::Cli,
    client::RobustClient,
    config::AppConfig,
    downloader::DownloadManager,
    error::{AppError, AppResult},
    pipeline::PipelineDriver,
};
use colored::*;
use log::{debug, info, warn};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use url::Url;

/// 一次运行共享的状态和工具
#[derive(Clone)]
pub struct CrawlContext {
    pub manager: DownloadManager,
    pub config: Arc<AppConfig>,
    pub http_client: Arc<RobustClient>,
    pub args: Arc<Cli>,
    pub cancellation_token: Arc<AtomicBool>,
}

impl CrawlContext {
    pub fn new(args: Arc<Cli>, config: Arc<AppConfig>, cancellation_token: Arc<AtomicBool>) -> AppResult<Self> {
        let http_client = Arc::new(RobustClient::new(config.clone())?);
        Ok(Self {
            manager: DownloadManager::new(),
            config,
            http_client,
            args,
            cancellation_token,
        })
    }
}

/// 库的公共入口点，由 `main.rs` 调用
pub async fn run_from_cli(args: Arc<Cli>, cancellation_token: Arc<AtomicBool>) -> AppResult<()> {
    debug!("CLI 参数: {:?}", args);
    let start_url = Url::parse(&args.start_url)
        .map_err(|e| AppError::UserInputError(format!("起始链接 '{}' 无效: {}", args.start_url, e)))?;

    let config = Arc::new(AppConfig::new()?);
    debug!("加载的应用配置: {:?}", config);

    ui::print_header(&format!("{} v{}", clap::crate_name!(), clap::crate_version!()));
    ui::plain(&format!("起始链接: {}", start_url));
    ui::plain(&format!(
        "起始集数: {} | 计划处理: {} 集 | 下载视频: {}",
        args.start_index,
        config.item_count,
        if args.download_enabled() { "是" } else { "否" }
    ));
    print_profile_hint(&args, &config);

    let context = CrawlContext::new(args.clone(), config.clone(), cancellation_token.clone())?;
    let session = match &args.connect {
        Some(debugger_url) => ChromeSession::connect(debugger_url).await?,
        None => ChromeSession::launch(&config).await?,
    };
    let page: Arc<dyn PageController> = session.page();

    let result = crawl(context.clone(), page, start_url.as_str()).await;
    context.manager.print_report();

    match &result {
        Err(AppError::UserInterrupt) => session.leave_running(),
        _ if args.keep_open() => {
            ui::box_message(
                "浏览器保持打开",
                &[format!("按 {} 结束程序，浏览器窗口不会被关闭。", *symbols::CTRL_C).as_str()],
                |s| s.cyan(),
            );
            while !cancellation_token.load(Ordering::Relaxed) {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            session.leave_running();
        }
        _ => {
            if let Err(e) = session.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
        }
    }
    result
}

async fn crawl(context: CrawlContext, page: Arc<dyn PageController>, start_url: &str) -> AppResult<()> {
    let config = context.config.clone();
    ui::info(&format!("正在打开页面: {}", start_url));
    tokio::time::timeout(config.navigation_timeout, page.navigate(start_url))
        .await
        .map_err(|_| AppError::Browser(format!("打开页面超时 ({:?})", config.navigation_timeout)))??;
    tokio::time::sleep(config.settle_delay).await;
    dismiss_login_popup(&*page, &config).await;

    let mut driver = PipelineDriver::new(context.clone(), page);
    driver.start().await?;
    driver.run(context.args.start_index, config.item_count).await
}

async fn dismiss_login_popup(page: &dyn PageController, config: &AppConfig) {
    let selector = &config.selectors.login_close;
    match page.element_exists(selector).await {
        Ok(true) => match page.click_element(selector).await {
            Ok(()) => {
                info!("已关闭登录弹窗");
                ui::info("已关闭登录弹窗");
            }
            Err(e) => debug!("关闭登录弹窗失败: {}", e),
        },
        Ok(false) => {}
        Err(e) => debug!("检查登录弹窗失败: {}", e),
    }
}

fn print_profile_hint(args: &Cli, config: &AppConfig) {
    if args.connect.is_some() {
        return;
    }
    if config.profile_dir.is_dir() {
        ui::info(&format!("使用已保存的浏览器会话: {}", config.profile_dir.display()));
    } else {
        ui::box_message(
            "首次运行",
            &[
                "将打开一个新的浏览器窗口，请在其中完成登录。",
                format!("登录状态会保存在 '{}'，之后运行无需重复登录。", config.profile_dir.display()).as_str(),
            ],
            |s| s.yellow(),
        );
    }
}
