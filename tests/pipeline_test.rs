// tests/pipeline_test.rs

mod common;

use clap::Parser;
use common::{FakeEpisode, FakePage, media_body};
use drama_dl::{
    CrawlContext,
    browser::PageController,
    cli::Cli,
    config::AppConfig,
    error::AppError,
    pipeline::PipelineDriver,
    store::ResultStore,
};
use std::{
    path::Path,
    sync::{Arc, atomic::AtomicBool},
};
use tempfile::tempdir;

fn context_in(dir: &Path, cli_args: &[&str]) -> CrawlContext {
    let config = AppConfig {
        videos_dir: dir.join("videos"),
        results_file: dir.join("crawled_data.json"),
        ..AppConfig::default()
    };
    let mut argv = vec!["drama-dl", "https://www.douyin.com/video/1"];
    argv.extend_from_slice(cli_args);
    let args = Arc::new(Cli::parse_from(argv));
    CrawlContext::new(args, Arc::new(config), Arc::new(AtomicBool::new(false))).unwrap()
}

fn episode(src: &str, title: &str, series: &str) -> FakeEpisode {
    FakeEpisode {
        video_src: Some(src.to_string()),
        title: Some(title.to_string()),
        series_texts: vec![series.to_string()],
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_metadata_only_run_records_every_episode() {
    let dir = tempdir().unwrap();
    let context = context_in(dir.path(), &["1", "no-download"]);
    let page = Arc::new(FakePage::new(vec![
        episode("blob:https://www.douyin.com/1", "第1集 | 开端", "短剧 · 某某剧"),
        episode("blob:https://www.douyin.com/2", "第2集 | 发展", "短剧 · 某某剧"),
    ]));

    let mut driver = PipelineDriver::new(context.clone(), page.clone() as Arc<dyn PageController>);
    driver.start().await.unwrap();
    driver.run(1, 2).await.unwrap();

    let records = ResultStore::load(&dir.path().join("crawled_data.json"));
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].index, 1);
    assert_eq!(records[0].title, "第1集 | 开端");
    assert_eq!(records[0].series_raw, "短剧 · 某某剧");
    assert_eq!(records[1].source_url, "blob:https://www.douyin.com/2");
    assert!(records.iter().all(|r| r.downloaded.is_none() && r.local_path.is_none()));

    // 只在两集之间切换一次
    assert_eq!(*page.keys.lock().unwrap(), vec!["ArrowDown"]);
    assert_eq!(context.manager.get_stats().metadata_only, 2);
    assert!(!dir.path().join("videos").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_uses_captured_url_and_names_file() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("GET", "/ep5.mp4").with_status(200).with_body(media_body()).expect(1).create_async().await;

    let dir = tempdir().unwrap();
    let context = context_in(dir.path(), &["5"]);
    let page = Arc::new(FakePage::new(vec![episode(
        "blob:https://www.douyin.com/5",
        "第5集 | 极寒-70℃：全家变卖百亿家产",
        "短剧 · 极寒-70℃：变卖百亿家产，打造末日堡垒",
    )]));

    let mut driver = PipelineDriver::new(context.clone(), page.clone() as Arc<dyn PageController>);
    driver.start().await.unwrap();
    page.emit("https://www.douyin.com/aweme/v1/feed", 200, "application/json");
    page.emit(&format!("{}/ep5.mp4", server.url()), 200, "video/mp4");
    assert_eq!(driver.scope().len(), 1);

    driver.run(5, 1).await.unwrap();

    let expected = dir
        .path()
        .join("videos")
        .join("极寒-70℃：变卖百亿家产，打造末日堡垒")
        .join("第5集.mp4");
    assert!(expected.is_file());

    let record = driver.store().find("blob:https://www.douyin.com/5").unwrap();
    assert_eq!(record.downloaded, Some(true));
    assert_eq!(record.local_path.as_deref(), Some(expected.as_path()));
    assert_eq!(context.manager.get_stats().success, 1);
    assert!(page.keys.lock().unwrap().is_empty());
    mock.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_download_is_recorded_and_run_continues() {
    let dir = tempdir().unwrap();
    let context = context_in(dir.path(), &["1"]);
    // 没有捕获地址、页面内读取失败、页面中也没有真实地址
    let page = Arc::new(FakePage::new(vec![
        episode("blob:https://www.douyin.com/1", "第1集", "短剧 · 某某剧"),
        episode("blob:https://www.douyin.com/2", "第2集", "短剧 · 某某剧"),
    ]));

    let mut driver = PipelineDriver::new(context.clone(), page.clone() as Arc<dyn PageController>);
    driver.start().await.unwrap();
    driver.run(1, 2).await.unwrap();

    let records = driver.store().records();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.downloaded == Some(false) && r.local_path.is_none()));
    assert_eq!(context.manager.get_stats().failed, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_episode_without_media_is_not_recorded() {
    let dir = tempdir().unwrap();
    let context = context_in(dir.path(), &["1", "no-download"]);
    let page = Arc::new(FakePage::new(vec![FakeEpisode {
        title: Some("直播间".into()),
        ..Default::default()
    }]));

    let mut driver = PipelineDriver::new(context.clone(), page as Arc<dyn PageController>);
    driver.start().await.unwrap();
    driver.run(1, 1).await.unwrap();

    assert!(driver.store().records().is_empty());
    assert_eq!(context.manager.get_stats().no_media, 1);
}

/// 不同剧集共用同一个占位地址时，后一集会覆盖前一集的记录
#[tokio::test(flavor = "multi_thread")]
async fn test_shared_placeholder_url_merges_records() {
    let dir = tempdir().unwrap();
    let context = context_in(dir.path(), &["1", "no-download"]);
    let page = Arc::new(FakePage::new(vec![
        episode("blob:https://www.douyin.com/same", "第1集", "短剧 · 甲"),
        episode("blob:https://www.douyin.com/same", "第2集", "短剧 · 乙"),
    ]));

    let mut driver = PipelineDriver::new(context.clone(), page as Arc<dyn PageController>);
    driver.start().await.unwrap();
    driver.run(1, 2).await.unwrap();

    let records = ResultStore::load(&dir.path().join("crawled_data.json"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].index, 2);
    assert_eq!(records[0].title, "第2集");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_metadata_query_failure_keeps_episode() {
    let dir = tempdir().unwrap();
    let context = context_in(dir.path(), &["1", "no-download"]);
    let page = Arc::new(FakePage::new(vec![episode(
        "blob:https://www.douyin.com/1",
        "第1集 | 开端",
        "短剧 · 某某剧",
    )]));
    *page.fail_texts.lock().unwrap() = true;

    let mut driver = PipelineDriver::new(context.clone(), page as Arc<dyn PageController>);
    driver.start().await.unwrap();
    driver.run(1, 1).await.unwrap();

    let records = ResultStore::load(&dir.path().join("crawled_data.json"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "第1集 | 开端");
    assert_eq!(records[0].series_raw, "Unknown");
    assert_eq!(context.manager.get_stats().metadata_only, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_title_falls_back_to_description() {
    let dir = tempdir().unwrap();
    let context = context_in(dir.path(), &["1", "no-download"]);
    let page = Arc::new(FakePage::new(vec![FakeEpisode {
        video_src: Some("blob:https://www.douyin.com/1".into()),
        description: Some("  第1集 重生归来  ".into()),
        series_texts: vec!["短剧 · 某某剧".into()],
        ..Default::default()
    }]));

    let mut driver = PipelineDriver::new(context, page as Arc<dyn PageController>);
    driver.start().await.unwrap();
    driver.run(1, 1).await.unwrap();

    let records = driver.store().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "第1集 重生归来");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_series_falls_back_to_keyword_container() {
    let dir = tempdir().unwrap();
    let context = context_in(dir.path(), &["1", "no-download"]);
    let page = Arc::new(FakePage::new(vec![
        FakeEpisode {
            video_src: Some("blob:https://www.douyin.com/1".into()),
            title: Some("第1集".into()),
            container_texts: vec!["短剧 · 某剧 更多".into()],
            ..Default::default()
        },
        FakeEpisode {
            video_src: Some("blob:https://www.douyin.com/2".into()),
            title: Some("第2集".into()),
            container_texts: vec!["短剧 合集".into()],
            ..Default::default()
        },
    ]));

    let mut driver = PipelineDriver::new(context, page as Arc<dyn PageController>);
    driver.start().await.unwrap();
    driver.run(1, 2).await.unwrap();

    let records = driver.store().records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].series_raw, "短剧 · 某剧 更多");
    // 容器文本不含 '·' 时不采用
    assert_eq!(records[1].series_raw, "Unknown");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scroll_fallback_when_keys_fail() {
    let dir = tempdir().unwrap();
    let context = context_in(dir.path(), &["1", "no-download"]);
    let page = Arc::new(FakePage::new(vec![
        episode("blob:https://www.douyin.com/1", "第1集", "短剧 · 某某剧"),
        episode("blob:https://www.douyin.com/2", "第2集", "短剧 · 某某剧"),
    ]));
    *page.fail_keys.lock().unwrap() = true;

    let mut driver = PipelineDriver::new(context, page.clone() as Arc<dyn PageController>);
    driver.start().await.unwrap();
    driver.run(1, 2).await.unwrap();

    assert_eq!(*page.scrolls.lock().unwrap(), 1);
    assert_eq!(page.current_index(), 1);
    assert_eq!(driver.store().records().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_browser_loss_ends_run() {
    let dir = tempdir().unwrap();
    let context = context_in(dir.path(), &["1", "no-download"]);
    let page = Arc::new(FakePage::new(vec![
        episode("blob:https://www.douyin.com/1", "第1集", "短剧 · 某某剧"),
        episode("blob:https://www.douyin.com/2", "第2集", "短剧 · 某某剧"),
    ]));
    *page.fail_keys.lock().unwrap() = true;
    *page.fail_scroll.lock().unwrap() = true;

    let mut driver = PipelineDriver::new(context, page as Arc<dyn PageController>);
    driver.start().await.unwrap();
    let result = driver.run(1, 3).await;

    assert!(matches!(result, Err(AppError::Browser(_))));
    // 第一集在失败前已经保存
    assert_eq!(driver.store().records().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancellation_stops_before_next_item() {
    let dir = tempdir().unwrap();
    let context = context_in(dir.path(), &["1", "no-download"]);
    context.cancellation_token.store(true, std::sync::atomic::Ordering::Relaxed);
    let page = Arc::new(FakePage::new(vec![episode("blob:https://www.douyin.com/1", "第1集", "短剧 · 某某剧")]));

    let mut driver = PipelineDriver::new(context, page as Arc<dyn PageController>);
    driver.start().await.unwrap();
    let result = driver.run(1, 1).await;

    assert!(matches!(result, Err(AppError::UserInterrupt)));
    assert!(driver.store().records().is_empty());
}
