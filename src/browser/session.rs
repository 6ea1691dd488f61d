use std::path::PathBuf;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetLocaleOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Browser;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::infrastructure::{BrowserSession, CdpPage, PageDriver};
use crate::models::{OriginState, SessionState};

/// 一次运行的浏览器会话：Browser + 事件任务 + 唯一页面
pub struct ChromeSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: CdpPage,
    profile_dir: PathBuf,
}

impl ChromeSession {
    pub(crate) fn new(
        browser: Browser,
        handler_task: JoinHandle<()>,
        page: CdpPage,
        profile_dir: PathBuf,
    ) -> Self {
        Self {
            browser,
            handler_task,
            page,
            profile_dir,
        }
    }

    /// 用会话状态预置 Cookie、localStorage 与语言
    pub(crate) async fn seed(&self, state: &SessionState, locale: &str) -> AppResult<()> {
        let cdp = self.page.page();

        cdp.execute(
            SetLocaleOverrideParams::builder()
                .locale(locale.to_string())
                .build(),
        )
        .await?;

        self.page.set_cookies(&state.cookies).await?;
        info!("🍪 已写入 {} 条 Cookie", state.cookies.len());

        let origins: Vec<&OriginState> = state
            .origins
            .iter()
            .filter(|o| !o.local_storage.is_empty())
            .collect();
        if !origins.is_empty() {
            cdp.execute(AddScriptToEvaluateOnNewDocumentParams::new(
                local_storage_script(&origins),
            ))
            .await?;
            debug!("已注册 {} 个源的 localStorage 预置脚本", origins.len());
        }

        Ok(())
    }
}

/// 在匹配的源上写入 localStorage 的脚本
fn local_storage_script(origins: &[&OriginState]) -> String {
    let table: serde_json::Map<String, serde_json::Value> = origins
        .iter()
        .map(|o| {
            let entries: serde_json::Map<String, serde_json::Value> = o
                .local_storage
                .iter()
                .map(|e| (e.name.clone(), serde_json::Value::String(e.value.clone())))
                .collect();
            (o.origin.clone(), serde_json::Value::Object(entries))
        })
        .collect();

    format!(
        r#"(() => {{
    const table = {};
    const entries = table[window.location.origin];
    if (!entries) return;
    try {{
        for (const [k, v] of Object.entries(entries)) {{
            if (window.localStorage.getItem(k) === null) window.localStorage.setItem(k, v);
        }}
    }} catch (_) {{}}
}})();"#,
        serde_json::Value::Object(table)
    )
}

#[async_trait]
impl BrowserSession for ChromeSession {
    type Page = CdpPage;

    fn page(&self) -> &CdpPage {
        &self.page
    }

    async fn close(mut self) -> AppResult<()> {
        info!("🧹 关闭浏览器...");
        let result = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            warn!("等待浏览器进程退出失败: {}", e);
        }
        self.handler_task.abort();

        if let Err(e) = tokio::fs::remove_dir_all(&self.profile_dir).await {
            debug!("清理 profile 目录失败 {}: {}", self.profile_dir.display(), e);
        }

        result?;
        Ok(())
    }
}
