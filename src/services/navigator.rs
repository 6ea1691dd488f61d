//! 导航服务 - 业务能力层
//!
//! 打开编辑器页面，并处理"会话被拒绝 → 重写 Cookie → 再试一次"的登录恢复。
//! 恢复最多只做一次，第二次仍落在登录页即视为会话失效。

use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::Readiness;
use crate::error::{AppError, AppResult, NavigationError};
use crate::infrastructure::PageDriver;
use crate::models::CookieRecord;

/// 导航参数
#[derive(Debug, Clone)]
pub struct NavigationPlan {
    pub url: String,
    pub readiness: Readiness,
    pub timeout: Duration,
    /// 当前 URL 包含该片段即视为被重定向到登录页
    pub login_pattern: String,
    /// 页面就绪后额外等待编辑器脚本完成初始化
    pub settle: Duration,
}

/// 登录检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginCheck {
    /// 第一次就进入了编辑器
    Direct,
    /// 重写 Cookie 后再次导航成功
    Recovered,
}

/// 导航服务
///
/// 职责：
/// - 带超时地打开页面
/// - 检测登录重定向并恢复一次
/// - 不关心页面上有什么控件
pub struct Navigator {
    plan: NavigationPlan,
}

impl Navigator {
    pub fn new(plan: NavigationPlan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &NavigationPlan {
        &self.plan
    }

    /// 打开目标页面；超过期限返回 `NavigationError::Timeout`
    pub async fn open<P: PageDriver>(&self, page: &P) -> AppResult<()> {
        let url = &self.plan.url;
        debug!("打开页面: {} (就绪条件: {:?})", url, self.plan.readiness);

        match timeout(self.plan.timeout, page.navigate(url, self.plan.readiness)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(AppError::Navigation(NavigationError::Timeout { url, .. }))) => {
                Err(self.timeout_error(url))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(self.timeout_error(url.clone())),
        }
    }

    /// 确认已登录：若落在登录页，清空并重写 Cookie 后只重试一次
    pub async fn ensure_authenticated<P: PageDriver>(
        &self,
        page: &P,
        cookies: &[CookieRecord],
    ) -> AppResult<LoginCheck> {
        let landed = page.current_url().await?;
        if !self.is_login_page(&landed) {
            info!("[login] ✅ 会话有效，已进入编辑器");
            self.settle().await;
            return Ok(LoginCheck::Direct);
        }

        warn!("[login] ⚠️ 被重定向到登录页 ({})，重写 Cookie 后重试一次", landed);
        page.clear_cookies().await?;
        page.set_cookies(cookies).await?;
        self.open(page).await?;

        let landed = page.current_url().await?;
        if self.is_login_page(&landed) {
            return Err(NavigationError::LoginRedirect { landed }.into());
        }

        info!("[login] ✅ 重试后进入编辑器");
        self.settle().await;
        Ok(LoginCheck::Recovered)
    }

    fn is_login_page(&self, url: &str) -> bool {
        !self.plan.login_pattern.is_empty() && url.contains(&self.plan.login_pattern)
    }

    async fn settle(&self) {
        if !self.plan.settle.is_zero() {
            debug!("等待编辑器初始化 {:?}", self.plan.settle);
            sleep(self.plan.settle).await;
        }
    }

    fn timeout_error(&self, url: String) -> AppError {
        NavigationError::Timeout {
            url,
            timeout_ms: self.plan.timeout.as_millis(),
        }
        .into()
    }
}
