use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::PublishMode;

/// 页面就绪条件
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    /// load 事件
    Load,
    /// 网络空闲
    NetworkIdle,
}

impl FromStr for Readiness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "load" | "domcontentloaded" => Ok(Readiness::Load),
            "networkidle" | "network-idle" => Ok(Readiness::NetworkIdle),
            other => Err(format!("未知的就绪条件: {}", other)),
        }
    }
}

/// 内容注入方式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectStrategy {
    /// 逐字符输入（带间隔）
    Keystroke,
    /// 一次性插入纯文本
    InsertText,
    /// 渲染为 HTML 后粘贴
    Html,
}

impl FromStr for InjectStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keystroke" | "type" => Ok(InjectStrategy::Keystroke),
            "insert-text" | "insert_text" | "paste-text" => Ok(InjectStrategy::InsertText),
            "html" | "paste-html" => Ok(InjectStrategy::Html),
            other => Err(format!("未知的注入方式: {}", other)),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 会话状态文件
    pub state_path: PathBuf,
    /// 草稿 / 公开
    pub publish_mode: PublishMode,
    /// 目标URL
    pub start_url: String,
    /// 文章 Markdown 文件
    pub article_path: PathBuf,
    /// 诊断产物目录
    pub artifacts_dir: PathBuf,
    /// 选择器覆盖文件（可选）
    pub selectors_file: Option<PathBuf>,
    // --- 会话修复 ---
    pub target_domain: String,
    pub alias_domains: Vec<String>,
    pub login_url_pattern: String,
    // --- 浏览器 ---
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
    pub locale: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub readiness: Readiness,
    // --- 时间预算 ---
    pub navigation_timeout: Duration,
    pub settle_delay: Duration,
    pub candidate_timeout: Duration,
    pub poll_interval: Duration,
    pub save_probe_timeout: Duration,
    pub publish_wait: Duration,
    pub draft_settle: Duration,
    pub input_timeout: Duration,
    // --- 内容注入 ---
    pub body_max_chars: usize,
    pub inject_strategy: InjectStrategy,
    pub title_type_delay: Duration,
    pub body_type_delay: Duration,
    // --- 其他 ---
    pub capture_on_failure: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("note-state.json"),
            publish_mode: PublishMode::Draft,
            start_url: "https://editor.note.com/new".to_string(),
            article_path: PathBuf::from(".note-artifacts/article.md"),
            artifacts_dir: PathBuf::from(".note-artifacts"),
            selectors_file: None,
            target_domain: "note.com".to_string(),
            alias_domains: vec![
                ".note.com".to_string(),
                "note.com".to_string(),
                ".editor.note.com".to_string(),
                "editor.note.com".to_string(),
            ],
            login_url_pattern: "/login".to_string(),
            headless: true,
            chrome_executable: None,
            locale: "ja-JP".to_string(),
            viewport_width: 1280,
            viewport_height: 900,
            readiness: Readiness::NetworkIdle,
            navigation_timeout: Duration::from_secs(120),
            settle_delay: Duration::from_secs(5),
            candidate_timeout: Duration::from_secs(8),
            poll_interval: Duration::from_millis(250),
            save_probe_timeout: Duration::from_secs(3),
            publish_wait: Duration::from_secs(60),
            draft_settle: Duration::from_secs(2),
            input_timeout: Duration::from_secs(30),
            body_max_chars: 8000,
            inject_strategy: InjectStrategy::Keystroke,
            title_type_delay: Duration::from_millis(30),
            body_type_delay: Duration::from_millis(10),
            capture_on_failure: true,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载；`STATE_PATH` 必须存在
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载（测试中用 HashMap 代替环境变量）
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let state_path = get("STATE_PATH").map(PathBuf::from).ok_or_else(|| {
            AppError::Config(ConfigError::EnvVarNotFound {
                var_name: "STATE_PATH".to_string(),
            })
        })?;

        let ms = |key: &str, fallback: Duration| {
            parsed::<u64>(key, get(key)).map(Duration::from_millis).unwrap_or(fallback)
        };

        Ok(Self {
            state_path,
            publish_mode: PublishMode::from_flag(lookup("IS_PUBLIC").as_deref()),
            start_url: get("START_URL").unwrap_or(default.start_url),
            article_path: get("ARTICLE_PATH").map(PathBuf::from).unwrap_or(default.article_path),
            artifacts_dir: get("ARTIFACTS_DIR").map(PathBuf::from).unwrap_or(default.artifacts_dir),
            selectors_file: get("SELECTORS_FILE").map(PathBuf::from),
            target_domain: get("TARGET_DOMAIN").unwrap_or(default.target_domain),
            alias_domains: get("ALIAS_DOMAINS")
                .map(|v| split_list(&v))
                .filter(|list| !list.is_empty())
                .unwrap_or(default.alias_domains),
            login_url_pattern: get("LOGIN_URL_PATTERN").unwrap_or(default.login_url_pattern),
            headless: parsed("HEADLESS", get("HEADLESS")).unwrap_or(default.headless),
            chrome_executable: get("CHROME_EXECUTABLE").map(PathBuf::from),
            locale: get("BROWSER_LOCALE").unwrap_or(default.locale),
            viewport_width: parsed("VIEWPORT_WIDTH", get("VIEWPORT_WIDTH"))
                .unwrap_or(default.viewport_width),
            viewport_height: parsed("VIEWPORT_HEIGHT", get("VIEWPORT_HEIGHT"))
                .unwrap_or(default.viewport_height),
            readiness: parsed("PAGE_READINESS", get("PAGE_READINESS")).unwrap_or(default.readiness),
            navigation_timeout: ms("NAVIGATION_TIMEOUT_MS", default.navigation_timeout),
            settle_delay: ms("SETTLE_DELAY_MS", default.settle_delay),
            candidate_timeout: ms("CANDIDATE_TIMEOUT_MS", default.candidate_timeout),
            poll_interval: ms("POLL_INTERVAL_MS", default.poll_interval),
            save_probe_timeout: ms("SAVE_PROBE_TIMEOUT_MS", default.save_probe_timeout),
            publish_wait: ms("PUBLISH_WAIT_MS", default.publish_wait),
            draft_settle: ms("DRAFT_SETTLE_MS", default.draft_settle),
            input_timeout: ms("INPUT_TIMEOUT_MS", default.input_timeout),
            body_max_chars: parsed("BODY_MAX_CHARS", get("BODY_MAX_CHARS"))
                .unwrap_or(default.body_max_chars),
            inject_strategy: parsed("INJECT_STRATEGY", get("INJECT_STRATEGY"))
                .unwrap_or(default.inject_strategy),
            title_type_delay: ms("TITLE_TYPE_DELAY_MS", default.title_type_delay),
            body_type_delay: ms("BODY_TYPE_DELAY_MS", default.body_type_delay),
            capture_on_failure: parsed("CAPTURE_ON_FAILURE", get("CAPTURE_ON_FAILURE"))
                .unwrap_or(default.capture_on_failure),
            verbose_logging: parsed("VERBOSE_LOGGING", get("VERBOSE_LOGGING"))
                .unwrap_or(default.verbose_logging),
        })
    }
}

/// 解析失败时记录警告并回落到默认值
fn parsed<T>(key: &str, raw: Option<String>) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = raw?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("⚠️ 环境变量 {} 的值 '{}' 无效 ({})，使用默认值", key, raw, e);
            None
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
