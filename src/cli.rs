// src/cli.rs

use crate::constants;
use clap::{Parser, ValueEnum, command, crate_version};

/// 定义日志输出级别
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// 附加的运行模式
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// 只抓取元数据，不下载视频
    #[value(name = "no-download")]
    NoDownload,
    /// 运行结束后保持浏览器打开
    #[value(name = "keep-open")]
    KeepOpen,
}

#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    disable_help_flag = true,
    disable_version_flag = true,
)]
pub struct Cli {
    // --- 位置参数 (Arguments) ---
    /// 起始视频页面链接
    #[arg(value_name = "START_URL", default_value_t = constants::DEFAULT_START_URL.to_string())]
    pub start_url: String,
    /// 起始集数编号
    #[arg(value_name = "START_INDEX", default_value_t = 1)]
    pub start_index: usize,
    /// 运行模式: 'no-download' 或 'keep-open'，可同时指定两个
    #[arg(value_name = "MODE", value_enum, num_args = 0..=2)]
    pub modes: Vec<RunMode>,

    // --- 浏览器选项 (Options) ---
    /// 连接到已运行的 Chrome 调试地址 (例如 http://127.0.0.1:9222)，而不是启动新浏览器
    #[arg(long, value_name = "URL", help_heading = "Options")]
    pub connect: Option<String>,

    // --- 通用选项 (General) ---
    /// 显示此帮助信息并退出
    #[arg(short = 'h', long, action = clap::ArgAction::Help, global = true, help_heading = "General")]
    _help: Option<bool>,
    /// 显示版本信息并退出
    #[arg(short = 'V', long, action = clap::ArgAction::Version, global = true, help_heading = "General")]
    _version: Option<bool>,
    /// (隐藏参数) 设置日志文件的输出级别，用于调试
    #[arg(long, value_enum, default_value_t = LogLevel::Off, global = true, hide = true)]
    pub log_level: LogLevel,
}

impl Cli {
    pub fn download_enabled(&self) -> bool {
        !self.modes.contains(&RunMode::NoDownload)
    }

    pub fn keep_open(&self) -> bool {
        self.modes.contains(&RunMode::KeepOpen)
    }
}
