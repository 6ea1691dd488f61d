//! 测试用的脚本化页面与浏览器
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use note_auto_post::config::{Config, InjectStrategy, Readiness};
use note_auto_post::error::{AppResult, BrowserError, NavigationError};
use note_auto_post::infrastructure::{
    BrowserLauncher, BrowserSession, LaunchOptions, PageDriver, SnapshotSource,
};
use note_auto_post::models::{CookieRecord, Locator, PublishMode, SessionState};
use note_auto_post::services::{DiagnosticSink, FailureRecord};

pub const EDITOR_URL: &str = "https://editor.note.com/notes/n1a2b3/edit";
pub const LOGIN_URL: &str = "https://note.com/login?redirectPath=%2Fnew";

/// 页面上发生过的操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Navigate(String),
    ClearCookies,
    SetCookies(usize),
    Focus(String),
    Clear(String),
    Click(String),
    Type(String, String),
    Insert(String, String),
    Html(String, String),
}

#[derive(Default)]
struct State {
    controls: HashMap<String, (String, bool)>,
    landings: VecDeque<String>,
    current: String,
    actions: Vec<Action>,
    queried: Vec<String>,
}

/// 脚本化页面：控件按 locator 的文本形式登记
#[derive(Default)]
pub struct FakePage {
    state: Mutex<State>,
    fail_navigation: bool,
    hang_navigation: bool,
    panic_on_click: Option<String>,
    query_delay: Duration,
    fail_input_on: Option<String>,
    hang_input_on: Option<String>,
}

/// 卡住的操作睡这么久，远超测试里的任何时间预算
const STALL: Duration = Duration::from_secs(30);

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个可见控件
    pub fn with_control(self, locator: &Locator, id: &str) -> Self {
        self.register(locator, id, true)
    }

    /// 登记一个存在但不可见的控件
    pub fn with_hidden(self, locator: &Locator, id: &str) -> Self {
        self.register(locator, id, false)
    }

    /// 每次导航后依次落到的 URL；用完后停留在编辑器
    pub fn landing_on(self, urls: &[&str]) -> Self {
        self.state.lock().unwrap().landings = urls.iter().map(|u| u.to_string()).collect();
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    /// 导航永远不返回
    pub fn hanging_navigation(mut self) -> Self {
        self.hang_navigation = true;
        self
    }

    /// 每次 query 先等待一段时间
    pub fn slow_query(mut self, delay: Duration) -> Self {
        self.query_delay = delay;
        self
    }

    /// 向该控件输入文字时返回错误
    pub fn failing_input(mut self, id: &str) -> Self {
        self.fail_input_on = Some(id.to_string());
        self
    }

    /// 向该控件输入文字时永远不返回
    pub fn hanging_input(mut self, id: &str) -> Self {
        self.hang_input_on = Some(id.to_string());
        self
    }

    pub fn panicking_on_click(mut self, id: &str) -> Self {
        self.panic_on_click = Some(id.to_string());
        self
    }

    fn register(self, locator: &Locator, id: &str, visible: bool) -> Self {
        self.state
            .lock()
            .unwrap()
            .controls
            .insert(locator.to_string(), (id.to_string(), visible));
        self
    }

    fn record(&self, action: Action) {
        self.state.lock().unwrap().actions.push(action);
    }

    async fn input_fault(&self, element: &str) -> AppResult<()> {
        if self.hang_input_on.as_deref() == Some(element) {
            tokio::time::sleep(STALL).await;
        }
        if self.fail_input_on.as_deref() == Some(element) {
            return Err(BrowserError::Script(format!("{} is detached", element)).into());
        }
        Ok(())
    }

    pub fn actions(&self) -> Vec<Action> {
        self.state.lock().unwrap().actions.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::Click(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn navigations(&self) -> usize {
        self.actions()
            .iter()
            .filter(|a| matches!(a, Action::Navigate(_)))
            .count()
    }

    pub fn queried(&self) -> Vec<String> {
        self.state.lock().unwrap().queried.clone()
    }
}

#[async_trait]
impl SnapshotSource for FakePage {
    async fn screenshot_png(&self) -> AppResult<Vec<u8>> {
        Ok(b"\x89PNG-fake".to_vec())
    }

    async fn current_url(&self) -> AppResult<String> {
        Ok(self.state.lock().unwrap().current.clone())
    }
}

#[async_trait]
impl PageDriver for FakePage {
    type Element = String;

    async fn navigate(&self, url: &str, _readiness: Readiness) -> AppResult<()> {
        self.record(Action::Navigate(url.to_string()));
        if self.hang_navigation {
            tokio::time::sleep(STALL).await;
        }
        if self.fail_navigation {
            return Err(NavigationError::Failed {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_RESET".into(),
            }
            .into());
        }
        let mut state = self.state.lock().unwrap();
        state.current = state
            .landings
            .pop_front()
            .unwrap_or_else(|| EDITOR_URL.to_string());
        Ok(())
    }

    async fn clear_cookies(&self) -> AppResult<()> {
        self.record(Action::ClearCookies);
        Ok(())
    }

    async fn set_cookies(&self, cookies: &[CookieRecord]) -> AppResult<()> {
        self.record(Action::SetCookies(cookies.len()));
        Ok(())
    }

    async fn query(&self, locator: &Locator) -> AppResult<Option<String>> {
        if !self.query_delay.is_zero() {
            tokio::time::sleep(self.query_delay).await;
        }
        let mut state = self.state.lock().unwrap();
        let key = locator.to_string();
        state.queried.push(key.clone());
        Ok(state.controls.get(&key).map(|(id, _)| id.clone()))
    }

    async fn is_visible(&self, element: &String) -> AppResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state
            .controls
            .values()
            .any(|(id, visible)| id == element && *visible))
    }

    async fn click(&self, element: &String) -> AppResult<()> {
        self.record(Action::Click(element.clone()));
        if self.panic_on_click.as_deref() == Some(element.as_str()) {
            panic!("injected fault while clicking {}", element);
        }
        Ok(())
    }

    async fn focus(&self, element: &String) -> AppResult<()> {
        self.record(Action::Focus(element.clone()));
        Ok(())
    }

    async fn clear_content(&self, element: &String) -> AppResult<()> {
        self.record(Action::Clear(element.clone()));
        Ok(())
    }

    async fn insert_text(&self, element: &String, text: &str) -> AppResult<()> {
        self.record(Action::Insert(element.clone(), text.to_string()));
        self.input_fault(element).await
    }

    async fn type_text(&self, element: &String, text: &str, _delay: Duration) -> AppResult<()> {
        self.record(Action::Type(element.clone(), text.to_string()));
        self.input_fault(element).await
    }

    async fn insert_html(&self, element: &String, html: &str) -> AppResult<()> {
        self.record(Action::Html(element.clone(), html.to_string()));
        self.input_fault(element).await
    }
}

/// 共享同一个页面的会话
pub struct FakeSession {
    page: Arc<FakePage>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    type Page = FakePage;

    fn page(&self) -> &FakePage {
        &self.page
    }

    async fn close(self) -> AppResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 统计打开 / 关闭次数的启动器
pub struct FakeLauncher {
    pub page: Arc<FakePage>,
    pub opens: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    pub seeded_cookies: Arc<AtomicUsize>,
    fail_open: bool,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        Self {
            page: Arc::new(page),
            opens: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            seeded_cookies: Arc::new(AtomicUsize::new(0)),
            fail_open: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn counters(&self) -> Counters {
        Counters {
            opens: self.opens.clone(),
            closes: self.closes.clone(),
            seeded_cookies: self.seeded_cookies.clone(),
        }
    }
}

#[derive(Clone)]
pub struct Counters {
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    seeded_cookies: Arc<AtomicUsize>,
}

impl Counters {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn seeded_cookies(&self) -> usize {
        self.seeded_cookies.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    type Session = FakeSession;

    async fn open(&self, state: &SessionState, _options: &LaunchOptions) -> AppResult<FakeSession> {
        if self.fail_open {
            return Err(BrowserError::LaunchFailed("chrome not found".into()).into());
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.seeded_cookies.store(state.cookies.len(), Ordering::SeqCst);
        Ok(FakeSession {
            page: self.page.clone(),
            closes: self.closes.clone(),
        })
    }
}

/// 记录所有失败记录的诊断端口
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub records: Arc<Mutex<Vec<(FailureRecord, bool)>>>,
}

impl RecordingSink {
    pub fn records(&self) -> Vec<(FailureRecord, bool)> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiagnosticSink for RecordingSink {
    async fn capture(
        &self,
        page: Option<&dyn SnapshotSource>,
        record: FailureRecord,
    ) -> Option<PathBuf> {
        self.records.lock().unwrap().push((record, page.is_some()));
        Some(PathBuf::from("recorded.png"))
    }
}

/// 测试工作区：文章、会话文件、产物目录
pub struct Workspace {
    pub dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("article.md"),
            "# Launch Day\n\n本日リリースしました。\n\n- 新機能\n- 改善\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("state.json"),
            r#"{"cookies":[{"name":"_note_session_v5","value":"abc","domain":".note.com","path":"/","expires":-1,"httpOnly":true,"secure":true,"sameSite":"Lax"}],"origins":[]}"#,
        )
        .unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn artifacts(&self) -> PathBuf {
        self.dir.path().join("artifacts")
    }

    /// 短等待时间的配置
    pub fn config(&self, mode: PublishMode) -> Config {
        Config {
            state_path: self.path().join("state.json"),
            publish_mode: mode,
            article_path: self.path().join("article.md"),
            artifacts_dir: self.artifacts(),
            navigation_timeout: Duration::from_secs(2),
            settle_delay: Duration::ZERO,
            candidate_timeout: Duration::from_millis(30),
            poll_interval: Duration::from_millis(5),
            save_probe_timeout: Duration::from_millis(30),
            publish_wait: Duration::from_millis(60),
            draft_settle: Duration::ZERO,
            input_timeout: Duration::from_secs(2),
            inject_strategy: InjectStrategy::Keystroke,
            title_type_delay: Duration::ZERO,
            body_type_delay: Duration::ZERO,
            ..Config::default()
        }
    }
}
