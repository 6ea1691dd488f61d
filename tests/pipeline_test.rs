mod support;

use note_auto_post::models::{CandidateMatcher, Locator, Phase, PublishMode, Terminal};
use note_auto_post::{App, RunCtx};
use support::{Action, FakeLauncher, FakePage, RecordingSink, Workspace, LOGIN_URL};

fn title_locator() -> Locator {
    CandidateMatcher::default_title().candidates[0].clone()
}

fn body_locator() -> Locator {
    CandidateMatcher::default_body().candidates[0].clone()
}

fn editor() -> FakePage {
    FakePage::new()
        .with_control(&title_locator(), "title")
        .with_control(&body_locator(), "body")
}

fn ctx(mode: PublishMode) -> RunCtx {
    RunCtx::with_id("20261018-101500", mode)
}

#[tokio::test]
async fn draft_with_save_control_clicks_it_once() {
    let ws = Workspace::new();
    let page = editor().with_control(&Locator::button_text("下書き保存"), "save");
    let launcher = FakeLauncher::new(page);
    let counters = launcher.counters();
    let page = launcher.page.clone();

    let app = App::new(ws.config(PublishMode::Draft), launcher);
    let outcome = app.run_with(&ctx(PublishMode::Draft)).await;

    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.terminal, Some(Terminal::DraftSaved { explicit_save: true }));
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(page.clicks(), vec!["save".to_string()]);
    assert_eq!((counters.opens(), counters.closes()), (1, 1));

    let actions = page.actions();
    let title_at = actions
        .iter()
        .position(|a| *a == Action::Type("title".into(), "Launch Day".into()))
        .unwrap();
    let body_at = actions
        .iter()
        .position(|a| matches!(a, Action::Type(id, text) if id == "body" && text.starts_with("# Launch Day")))
        .unwrap();
    assert!(title_at < body_at, "title must be entered before body");
    assert!(actions.contains(&Action::Clear("title".into())));
}

#[tokio::test]
async fn draft_without_save_control_assumes_autosave() {
    let ws = Workspace::new();
    let launcher = FakeLauncher::new(editor());
    let counters = launcher.counters();
    let page = launcher.page.clone();

    let outcome = App::new(ws.config(PublishMode::Draft), launcher)
        .run_with(&ctx(PublishMode::Draft))
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.terminal, Some(Terminal::DraftSaved { explicit_save: false }));
    assert!(page.clicks().is_empty());
    assert_eq!(counters.closes(), 1);
}

#[tokio::test]
async fn publish_clicks_proceed_then_confirm() {
    let ws = Workspace::new();
    let page = editor()
        .with_control(&Locator::button_text("公開に進む"), "proceed")
        .with_control(&Locator::button_text("投稿する"), "confirm")
        .with_control(&Locator::button_text("下書き保存"), "save");
    let launcher = FakeLauncher::new(page);
    let counters = launcher.counters();
    let page = launcher.page.clone();

    let outcome = App::new(ws.config(PublishMode::Publish), launcher)
        .run_with(&ctx(PublishMode::Publish))
        .await;

    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.terminal, Some(Terminal::PublishConfirmed));
    assert_eq!(page.clicks(), vec!["proceed".to_string(), "confirm".to_string()]);
    assert_eq!((counters.opens(), counters.closes()), (1, 1));
}

#[tokio::test]
async fn missing_confirm_control_fails_with_snapshot() {
    let ws = Workspace::new();
    let page = editor().with_control(&Locator::button_text("公開に進む"), "proceed");
    let launcher = FakeLauncher::new(page);
    let counters = launcher.counters();

    let outcome = App::new(ws.config(PublishMode::Publish), launcher)
        .run_with(&ctx(PublishMode::Publish))
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.phase, Phase::Publish);
    assert_ne!(outcome.exit_code(), 0);
    assert!(outcome.error.as_deref().unwrap().contains("confirm-publish"));

    let snapshot = outcome.diagnostic_path.expect("snapshot path");
    assert_eq!(
        snapshot,
        ws.artifacts().join("20261018-101500_error_publish.png")
    );
    assert!(snapshot.exists());
    assert!(ws
        .artifacts()
        .join("20261018-101500_error_publish.json")
        .exists());
    assert_eq!(counters.closes(), 1);
}

#[tokio::test]
async fn session_file_is_repaired_before_launch() {
    let ws = Workspace::new();
    let launcher = FakeLauncher::new(editor());
    let counters = launcher.counters();

    let outcome = App::new(ws.config(PublishMode::Draft), launcher)
        .run_with(&ctx(PublishMode::Draft))
        .await;
    assert!(outcome.success);

    // .note.com 的一条 Cookie 被补齐到另外三个别名
    assert_eq!(counters.seeded_cookies(), 4);
    let raw = std::fs::read_to_string(ws.path().join("state.json")).unwrap();
    assert!(raw.contains("\"editor.note.com\""));
}

#[tokio::test]
async fn every_run_appends_one_summary_line() {
    let ws = Workspace::new();
    let app = App::new(ws.config(PublishMode::Draft), FakeLauncher::new(editor()));

    app.run_with(&ctx(PublishMode::Draft)).await;
    app.run_with(&ctx(PublishMode::Draft)).await;

    let log = std::fs::read_to_string(ws.artifacts().join("runs.log")).unwrap();
    assert_eq!(log.lines().count(), 2);
    assert!(log.lines().all(|l| l.contains("| OK |")));
}

#[tokio::test]
async fn html_strategy_pastes_rendered_markdown() {
    let ws = Workspace::new();
    let launcher = FakeLauncher::new(editor());
    let page = launcher.page.clone();
    let mut config = ws.config(PublishMode::Draft);
    config.inject_strategy = note_auto_post::config::InjectStrategy::Html;

    let outcome = App::new(config, launcher)
        .run_with(&ctx(PublishMode::Draft))
        .await;
    assert!(outcome.success);

    let html = page
        .actions()
        .into_iter()
        .find_map(|a| match a {
            Action::Html(id, html) if id == "body" => Some(html),
            _ => None,
        })
        .unwrap();
    assert!(html.contains("<h1>Launch Day</h1>"));
    assert!(html.contains("<li>新機能</li>"));
    assert!(page.actions().contains(&Action::Insert("title".into(), "Launch Day".into())));
}

#[tokio::test]
async fn login_redirect_failure_is_reported_through_diagnostics() {
    let ws = Workspace::new();
    let launcher = FakeLauncher::new(editor().landing_on(&[LOGIN_URL, LOGIN_URL]));
    let counters = launcher.counters();
    let sink = RecordingSink::default();

    let outcome = App::new(ws.config(PublishMode::Draft), launcher)
        .with_diagnostics(Box::new(sink.clone()))
        .run_with(&ctx(PublishMode::Draft))
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.phase, Phase::Login);
    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].0.kind, "LoginRedirectDetected");
    assert!(records[0].1, "page snapshot should be offered");
    assert_eq!(counters.closes(), 1);
}
