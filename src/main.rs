// src/main.rs

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use drama_dl::{cli::Cli, error::AppError, logging::init_logger, run_from_cli, symbols};
use log::{error, warn};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

#[tokio::main]
async fn main() {
    #[cfg(windows)]
    {
        colored::control::set_virtual_terminal(true).ok();
    }

    let after_help = format!(
        "示例:\n  # 从默认示例视频开始，抓取并下载\n  {bin}\n\n  # 从第 5 集开始，只记录元数据\n  {bin} \"https://www.douyin.com/video/...\" 5 no-download\n\n  # 运行结束后保持浏览器打开\n  {bin} \"https://www.douyin.com/video/...\" 1 keep-open\n\n  # 连接到已开启远程调试的 Chrome\n  {bin} --connect http://127.0.0.1:9222",
        bin = clap::crate_name!()
    );
    let cmd = Cli::command()
        .override_usage(format!("{} [START_URL] [START_INDEX] [MODE]... [OPTIONS]", clap::crate_name!()))
        .after_help(after_help);
    let args = match Cli::from_arg_matches(&cmd.get_matches()) {
        Ok(args) => Arc::new(args),
        Err(e) => e.exit(),
    };
    init_logger(args.log_level);

    let cancellation_token = Arc::new(AtomicBool::new(false));
    let handler_token = cancellation_token.clone();
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("无法监听 Ctrl-C 信号: {}", e);
                return;
            }
            if handler_token.load(Ordering::Relaxed) {
                println!("\n第二次中断，强制退出...");
                warn!("用户第二次按下 Ctrl+C，强制退出。");
                std::process::exit(130);
            }
            println!(
                "\n{} 正在停止... 当前这一集处理完后结束。再按一次 {} 可强制退出。",
                *symbols::WARN,
                *symbols::CTRL_C
            );
            warn!("用户通过 Ctrl+C 请求中断程序。");
            handler_token.store(true, Ordering::Relaxed);
        }
    });

    if let Err(e) = run_from_cli(args, cancellation_token).await {
        match e {
            AppError::UserInterrupt => {
                warn!("程序被用户中断。");
                std::process::exit(130);
            }
            _ => {
                error!("程序执行出错: {}", e);
                eprintln!("\n{} {}", *symbols::ERROR, format!("程序执行出错: {}", e).red());
                std::process::exit(1);
            }
        }
    }
}
