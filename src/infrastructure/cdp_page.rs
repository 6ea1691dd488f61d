//! CDP 页面驱动 - 基础设施层
//!
//! 持有唯一的 page 资源，通过 chromiumoxide 实现 `PageDriver`。
//! 元素定位在页面内用 JS 完成，命中的元素打上 `data-note-ref` 标记，
//! 之后的点击 / 输入都通过这个标记找回同一个节点。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, InsertTextParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    ClearBrowserCookiesParams, CookieParam, CookieSameSite, SetCookiesParams, TimeSinceEpoch,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, EventLifecycleEvent, NavigateParams, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::Readiness;
use crate::error::{AppError, AppResult, BrowserError, NavigationError};
use crate::infrastructure::page_driver::{PageDriver, SnapshotSource};
use crate::models::{CookieRecord, Locator};

const REF_ATTR: &str = "data-note-ref";

/// 页面内元素的标记
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(String);

impl ElementRef {
    fn selector(&self) -> String {
        format!(r#"[{}="{}"]"#, REF_ATTR, self.0)
    }
}

#[derive(Debug, Deserialize)]
struct QueryReply {
    #[serde(default)]
    found: bool,
    mark: Option<String>,
    #[serde(default)]
    count: usize,
    error: Option<String>,
}

/// CDP 页面驱动
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 及 `PageDriver` 能力
/// - 不处理业务流程
pub struct CdpPage {
    page: Page,
    next_ref: AtomicU64,
    /// 与浏览器的 CDP 请求超时一致，用于报告超时
    request_timeout: Duration,
}

impl CdpPage {
    pub fn new(page: Page, request_timeout: Duration) -> Self {
        Self {
            page,
            next_ref: AtomicU64::new(1),
            request_timeout,
        }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        result
            .into_value()
            .map_err(|e| AppError::script(format!("无法解析脚本返回值: {}", e)))
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        serde_json::from_value(json_value)
            .map_err(|e| AppError::script(format!("脚本返回值类型不符: {}", e)))
    }

    async fn element(&self, element: &ElementRef) -> AppResult<Element> {
        Ok(self.page.find_element(element.selector()).await?)
    }

    async fn dispatch_key(&self, key: &str, code: i64, text: Option<&str>) -> AppResult<()> {
        let down_type = if text.is_some() {
            DispatchKeyEventType::KeyDown
        } else {
            DispatchKeyEventType::RawKeyDown
        };

        let mut down = DispatchKeyEventParams::builder()
            .r#type(down_type)
            .key(key)
            .code(key)
            .windows_virtual_key_code(code)
            .native_virtual_key_code(code);
        if let Some(text) = text {
            down = down.text(text);
        }
        let down = down.build().map_err(AppError::script)?;

        let up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .key(key)
            .code(key)
            .windows_virtual_key_code(code)
            .native_virtual_key_code(code)
            .build()
            .map_err(AppError::script)?;

        self.page.execute(down).await?;
        self.page.execute(up).await?;
        Ok(())
    }

    async fn navigate_until_idle(&self, url: &str) -> AppResult<()> {
        let mut events = self.page.event_listener::<EventLifecycleEvent>().await?;
        self.page
            .execute(SetLifecycleEventsEnabledParams::new(true))
            .await?;

        let nav = self
            .page
            .execute(NavigateParams::new(url))
            .await
            .map_err(|e| navigation_error(url, e, self.request_timeout))?;
        if let Some(reason) = nav.result.error_text.clone() {
            return Err(NavigationError::Failed {
                url: url.to_string(),
                reason,
            }
            .into());
        }
        let mut idle = IdleTracker::new(
            nav.result.frame_id.inner(),
            nav.result.loader_id.as_ref().map(|id| id.inner().as_str()),
        );

        while let Some(event) = events.next().await {
            if idle.observe(event.frame_id.inner(), event.loader_id.inner(), &event.name) {
                debug!("网络空闲: {}", url);
                return Ok(());
            }
        }

        Err(NavigationError::Failed {
            url: url.to_string(),
            reason: "生命周期事件流已关闭".to_string(),
        }
        .into())
    }
}

#[async_trait]
impl SnapshotSource for CdpPage {
    async fn screenshot_png(&self) -> AppResult<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page
            .screenshot(params)
            .await
            .map_err(|e| BrowserError::Screenshot(e.to_string()).into())
    }

    async fn current_url(&self) -> AppResult<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    type Element = ElementRef;

    async fn navigate(&self, url: &str, readiness: Readiness) -> AppResult<()> {
        debug!("导航到: {} ({:?})", url, readiness);
        match readiness {
            Readiness::Load => {
                self.page
                    .goto(url)
                    .await
                    .map_err(|e| navigation_error(url, e, self.request_timeout))?;
                Ok(())
            }
            Readiness::NetworkIdle => self.navigate_until_idle(url).await,
        }
    }

    async fn clear_cookies(&self) -> AppResult<()> {
        self.page.execute(ClearBrowserCookiesParams::default()).await?;
        Ok(())
    }

    async fn set_cookies(&self, cookies: &[CookieRecord]) -> AppResult<()> {
        if cookies.is_empty() {
            return Ok(());
        }
        let params: Vec<CookieParam> = cookies.iter().map(to_cookie_param).collect();
        debug!("写入 {} 条 Cookie", params.len());
        self.page.execute(SetCookiesParams::new(params)).await?;
        Ok(())
    }

    async fn query(&self, locator: &Locator) -> AppResult<Option<ElementRef>> {
        let mark = format!("r{}", self.next_ref.fetch_add(1, Ordering::Relaxed));
        let reply: QueryReply = self.eval_as(query_script(locator, &mark)).await?;

        if let Some(error) = reply.error {
            return Err(AppError::script(format!("选择器 {} 无效: {}", locator, error)));
        }
        debug!("{} 命中 {} 个元素", locator, reply.count);

        Ok(match (reply.found, reply.mark) {
            (true, Some(mark)) => Some(ElementRef(mark)),
            _ => None,
        })
    }

    async fn is_visible(&self, element: &ElementRef) -> AppResult<bool> {
        let js = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                const rect = el.getBoundingClientRect();
                const style = window.getComputedStyle(el);
                return rect.width > 0 && rect.height > 0
                    && style.visibility !== 'hidden' && style.display !== 'none';
            }})()
            "#,
            sel = js_string(&element.selector())
        );
        self.eval_as(js).await
    }

    async fn click(&self, element: &ElementRef) -> AppResult<()> {
        self.element(element).await?.click().await?;
        Ok(())
    }

    async fn focus(&self, element: &ElementRef) -> AppResult<()> {
        let el = self.element(element).await?;
        el.click().await?;
        el.focus().await?;
        Ok(())
    }

    async fn clear_content(&self, element: &ElementRef) -> AppResult<()> {
        let js = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                el.focus();
                if (typeof el.select === 'function') {{
                    el.select();
                }} else {{
                    const range = document.createRange();
                    range.selectNodeContents(el);
                    const selection = window.getSelection();
                    selection.removeAllRanges();
                    selection.addRange(range);
                }}
                return true;
            }})()
            "#,
            sel = js_string(&element.selector())
        );
        let selected: bool = self.eval_as(js).await?;
        if !selected {
            return Err(AppError::script("待清空的元素已从页面移除"));
        }
        self.dispatch_key("Backspace", 8, None).await
    }

    async fn insert_text(&self, _element: &ElementRef, text: &str) -> AppResult<()> {
        self.page.execute(InsertTextParams::new(text)).await?;
        Ok(())
    }

    async fn type_text(&self, _element: &ElementRef, text: &str, delay: Duration) -> AppResult<()> {
        for ch in text.chars() {
            if ch == '\n' {
                self.dispatch_key("Enter", 13, Some("\r")).await?;
            } else if ch != '\r' {
                self.page
                    .execute(InsertTextParams::new(ch.to_string()))
                    .await?;
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(())
    }

    async fn insert_html(&self, element: &ElementRef, html: &str) -> AppResult<()> {
        let js = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                if (!el) return 'missing';
                el.focus();
                const html = {html};
                const data = new DataTransfer();
                data.setData('text/html', html);
                data.setData('text/plain', html.replace(/<[^>]+>/g, ''));
                const event = new ClipboardEvent('paste', {{ clipboardData: data, bubbles: true, cancelable: true }});
                if (!el.dispatchEvent(event)) return 'paste';
                return document.execCommand('insertHTML', false, html) ? 'exec' : 'failed';
            }})()
            "#,
            sel = js_string(&element.selector()),
            html = js_string(html)
        );
        let how: String = self.eval_as(js).await?;
        debug!("HTML 注入方式: {}", how);
        match how.as_str() {
            "paste" | "exec" => Ok(()),
            other => Err(AppError::script(format!("HTML 注入失败: {}", other))),
        }
    }
}

/// 生成定位脚本
fn query_script(locator: &Locator, mark: &str) -> String {
    let (selector, text, nth) = match locator {
        Locator::Css { css, nth } => (css.as_str(), None, *nth),
        Locator::Text { text, within, nth } => (within.as_str(), Some(text.as_str()), *nth),
    };

    format!(
        r#"
        (() => {{
            const selector = {selector};
            const text = {text};
            let nodes;
            try {{
                nodes = Array.from(document.querySelectorAll(selector));
            }} catch (e) {{
                return {{ error: String(e) }};
            }}
            if (text !== null) {{
                nodes = nodes.filter((el) => (el.innerText || el.textContent || '').includes(text));
            }}
            const el = nodes[{nth}];
            if (!el) return {{ found: false, count: nodes.length }};
            let mark = el.getAttribute('{attr}');
            if (!mark) {{
                mark = {mark};
                el.setAttribute('{attr}', mark);
            }}
            return {{ found: true, mark, count: nodes.length }};
        }})()
        "#,
        selector = js_string(selector),
        text = text.map(js_string).unwrap_or_else(|| "null".to_string()),
        nth = nth,
        attr = REF_ATTR,
        mark = js_string(mark),
    )
}

/// 生成安全的 JS 字符串字面量
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// 主框架的网络空闲判定
///
/// 只看导航所在的框架；该框架每提交一个新文档（`init`），就改为等待新文档的
/// `networkIdle`，这样客户端跳转（例如跳到登录页）也能等到就绪。
#[derive(Debug)]
struct IdleTracker {
    frame: String,
    loader: Option<String>,
}

impl IdleTracker {
    fn new(frame: &str, loader: Option<&str>) -> Self {
        Self {
            frame: frame.to_string(),
            loader: loader.map(str::to_string),
        }
    }

    /// 喂入一条生命周期事件；返回当前文档是否已网络空闲
    fn observe(&mut self, frame: &str, loader: &str, name: &str) -> bool {
        if frame != self.frame {
            return false;
        }
        match name {
            "init" => {
                if self.loader.as_deref() != Some(loader) {
                    debug!("主框架提交了新文档: {}", loader);
                    self.loader = Some(loader.to_string());
                }
                false
            }
            "networkIdle" => self.loader.as_deref().map_or(true, |id| id == loader),
            _ => false,
        }
    }
}

fn navigation_error(url: &str, err: CdpError, budget: Duration) -> AppError {
    match err {
        CdpError::Timeout => NavigationError::Timeout {
            url: url.to_string(),
            timeout_ms: budget.as_millis(),
        }
        .into(),
        other => NavigationError::Failed {
            url: url.to_string(),
            reason: other.to_string(),
        }
        .into(),
    }
}

fn to_cookie_param(cookie: &CookieRecord) -> CookieParam {
    let mut param = CookieParam::new(cookie.name.clone(), cookie.value.clone());
    param.domain = Some(cookie.domain.clone());
    param.path = Some(cookie.path.clone());
    param.secure = Some(cookie.secure);
    param.http_only = Some(cookie.http_only);
    param.same_site = cookie.same_site.as_deref().and_then(parse_same_site);
    if !cookie.is_session() {
        param.expires = Some(TimeSinceEpoch::new(cookie.expires));
    }
    param
}

fn parse_same_site(raw: &str) -> Option<CookieSameSite> {
    match raw.to_ascii_lowercase().as_str() {
        "strict" => Some(CookieSameSite::Strict),
        "lax" => Some(CookieSameSite::Lax),
        "none" => Some(CookieSameSite::None),
        _ => None,
    }
}
