use note_auto_post::config::{Config, Readiness};
use note_auto_post::infrastructure::{BrowserLauncher, BrowserSession, LaunchOptions, PageDriver, SnapshotSource};
use note_auto_post::models::{Locator, SessionState};
use note_auto_post::utils::logging;
use note_auto_post::ChromeLauncher;

#[tokio::test]
#[ignore] // 需要本机安装 Chrome：cargo test -- --ignored
async fn test_launch_and_query_blank_page() {
    // 初始化日志
    logging::init(true);

    let options = LaunchOptions::from_config(&Config::default());
    let state: SessionState = serde_json::from_str(r#"{"cookies":[],"origins":[]}"#).unwrap();

    let session = ChromeLauncher::new()
        .open(&state, &options)
        .await
        .expect("启动浏览器失败");

    let page = session.page();
    page.navigate("data:text/html,<button>投稿する</button>", Readiness::Load)
        .await
        .expect("导航失败");

    let button = page
        .query(&Locator::button_text("投稿する"))
        .await
        .expect("查询失败")
        .expect("按钮应该存在");
    assert!(page.is_visible(&button).await.unwrap());
    assert!(!page.screenshot_png().await.unwrap().is_empty());

    session.close().await.expect("关闭浏览器失败");
}
