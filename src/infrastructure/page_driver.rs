//! 页面能力端口 - 基础设施层
//!
//! 上层（services / workflow）只通过这里的 trait 操作页面，
//! 不直接接触 chromiumoxide。测试中用脚本化的内存实现替代真实浏览器。

use std::time::Duration;

use async_trait::async_trait;

use crate::config::Readiness;
use crate::error::AppResult;
use crate::models::{CookieRecord, Locator, SessionState};

/// 诊断所需的最小页面能力
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// 整页 PNG 截图
    async fn screenshot_png(&self) -> AppResult<Vec<u8>>;

    /// 当前 URL
    async fn current_url(&self) -> AppResult<String>;
}

/// 页面驱动
///
/// 职责：
/// - 持有唯一的页面资源
/// - 只暴露单步能力（不轮询、不重试）
/// - 不认识"标题"、"发布"等业务概念
#[async_trait]
pub trait PageDriver: SnapshotSource {
    /// 不透明的元素句柄
    type Element: Send + Sync;

    /// 导航并等待就绪；超时由调用方控制
    async fn navigate(&self, url: &str, readiness: Readiness) -> AppResult<()>;

    /// 清空当前上下文的全部 Cookie
    async fn clear_cookies(&self) -> AppResult<()>;

    /// 写入 Cookie
    async fn set_cookies(&self, cookies: &[CookieRecord]) -> AppResult<()>;

    /// 单次查询：返回 `locator` 的第 nth 个匹配
    async fn query(&self, locator: &Locator) -> AppResult<Option<Self::Element>>;

    /// 元素当前是否可见
    async fn is_visible(&self, element: &Self::Element) -> AppResult<bool>;

    async fn click(&self, element: &Self::Element) -> AppResult<()>;

    async fn focus(&self, element: &Self::Element) -> AppResult<()>;

    /// 全选后删除
    async fn clear_content(&self, element: &Self::Element) -> AppResult<()>;

    /// 一次性插入纯文本到当前焦点
    async fn insert_text(&self, element: &Self::Element, text: &str) -> AppResult<()>;

    /// 逐字符输入，每个字符之间等待 `delay`
    async fn type_text(&self, element: &Self::Element, text: &str, delay: Duration) -> AppResult<()>;

    /// 以粘贴方式插入 HTML
    async fn insert_html(&self, element: &Self::Element, html: &str) -> AppResult<()>;
}

/// 浏览器启动参数
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub chrome_executable: Option<std::path::PathBuf>,
    pub locale: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub request_timeout: Duration,
}

impl LaunchOptions {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            headless: config.headless,
            chrome_executable: config.chrome_executable.clone(),
            locale: config.locale.clone(),
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            request_timeout: config.navigation_timeout,
        }
    }
}

/// 一次运行独占的浏览器会话
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Page: PageDriver;

    fn page(&self) -> &Self::Page;

    /// 释放浏览器资源；每次运行恰好调用一次
    async fn close(self) -> AppResult<()>;
}

/// 浏览器会话工厂
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Session: BrowserSession;

    /// 启动隔离的浏览上下文，并用会话状态预置 Cookie / localStorage
    async fn open(&self, state: &SessionState, options: &LaunchOptions) -> AppResult<Self::Session>;
}
