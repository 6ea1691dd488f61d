//! 单次运行编排器 - 编排层
//!
//! ## 职责
//!
//! 1. **准备**：选择器、文章、会话状态（全部在启动浏览器之前完成）
//! 2. **资源管理**：启动浏览器会话，并保证每条退出路径上恰好关闭一次
//! 3. **委托**：导航与登录交给 `Navigator`，页面操作交给 `PublishFlow`
//! 4. **收尾**：失败时先采集诊断再关闭浏览器，最后写一行运行记录
//!
//! 流水线内部的 panic 会被捕获并转换成失败结果，不会跳过关闭步骤。

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{BrowserLauncher, BrowserSession, LaunchOptions, PageDriver, SnapshotSource};
use crate::models::loaders::{apply_overrides, load_selector_overrides};
use crate::models::{Article, Phase, RunOutcome, SelectorSet, SessionState, Terminal};
use crate::services::{
    ArtifactDiagnostics, DiagnosticSink, DisabledDiagnostics, FailureRecord, NavigationPlan,
    Navigator, RunLogWriter, SessionStore,
};
use crate::utils::logging::{log_outcome, log_startup};
use crate::workflow::{PublishFlow, RunCtx};

/// 启动浏览器前准备好的输入
struct Prepared {
    selectors: SelectorSet,
    article: Article,
    state: SessionState,
}

/// 应用主结构
pub struct App<L> {
    config: Config,
    launcher: L,
    navigator: Navigator,
    diagnostics: Box<dyn DiagnosticSink>,
    run_log: RunLogWriter,
}

impl<L: BrowserLauncher> App<L> {
    pub fn new(config: Config, launcher: L) -> Self {
        let diagnostics: Box<dyn DiagnosticSink> = if config.capture_on_failure {
            Box::new(ArtifactDiagnostics::new(&config.artifacts_dir))
        } else {
            Box::new(DisabledDiagnostics)
        };

        let navigator = Navigator::new(NavigationPlan {
            url: config.start_url.clone(),
            readiness: config.readiness,
            timeout: config.navigation_timeout,
            login_pattern: config.login_url_pattern.clone(),
            settle: config.settle_delay,
        });

        Self {
            run_log: RunLogWriter::in_dir(&config.artifacts_dir),
            config,
            launcher,
            navigator,
            diagnostics,
        }
    }

    /// 替换诊断输出
    pub fn with_diagnostics(mut self, diagnostics: Box<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 运行一次完整流程
    pub async fn run(&self) -> RunOutcome {
        let ctx = RunCtx::new(self.config.publish_mode);
        self.run_with(&ctx).await
    }

    /// 使用给定上下文运行（测试中固定运行标识）
    pub async fn run_with(&self, ctx: &RunCtx) -> RunOutcome {
        log_startup(&self.config, ctx);

        let outcome = self.execute(ctx).await;

        log_outcome(&outcome, ctx);
        if let Err(e) = self.run_log.append(&ctx.run_id, ctx.mode, &outcome).await {
            warn!("⚠️ 写入运行记录失败 {}: {}", self.run_log.path().display(), e);
        }
        outcome
    }

    async fn execute(&self, ctx: &RunCtx) -> RunOutcome {
        let prepared = match self.prepare(ctx).await {
            Ok(prepared) => prepared,
            Err(e) => return self.fail(ctx, None, e).await,
        };

        ctx.enter(Phase::Launch);
        let options = LaunchOptions::from_config(&self.config);
        let session = match self.launcher.open(&prepared.state, &options).await {
            Ok(session) => session,
            Err(e) => return self.fail(ctx, None, e).await,
        };

        let result = AssertUnwindSafe(self.pipeline(session.page(), &prepared, ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(AppError::Unexpected(panic_message(panic))));

        let outcome = match result {
            Ok(terminal) => RunOutcome::succeeded(terminal),
            Err(e) => {
                let page: &dyn SnapshotSource = session.page();
                self.fail(ctx, Some(page), e).await
            }
        };

        ctx.enter(Phase::Teardown);
        if let Err(e) = session.close().await {
            warn!("[teardown] ⚠️ 关闭浏览器失败: {}", e);
        }

        outcome
    }

    async fn prepare(&self, ctx: &RunCtx) -> AppResult<Prepared> {
        ctx.enter(Phase::Startup);
        let selectors = match &self.config.selectors_file {
            Some(path) => {
                info!("📄 加载选择器覆盖: {}", path.display());
                let overrides = load_selector_overrides(path).await?;
                apply_overrides(SelectorSet::default(), overrides)?
            }
            None => SelectorSet::default(),
        };

        ctx.enter(Phase::Article);
        let article = Article::load(&self.config.article_path).await?;
        info!(
            "[article] 📝 标题: {} | 正文 {} 字",
            article.title,
            article.body.chars().count()
        );

        ctx.enter(Phase::Session);
        let store = SessionStore::new(
            &self.config.state_path,
            &self.config.target_domain,
            self.config.alias_domains.clone(),
        );
        let state = store.load_and_repair().await?;

        Ok(Prepared {
            selectors,
            article,
            state,
        })
    }

    async fn pipeline<P: PageDriver>(
        &self,
        page: &P,
        prepared: &Prepared,
        ctx: &RunCtx,
    ) -> AppResult<Terminal> {
        ctx.enter(Phase::Navigation);
        info!("[navigation] 🌐 打开 {}", self.navigator.plan().url);
        self.navigator.open(page).await?;

        ctx.enter(Phase::Login);
        self.navigator
            .ensure_authenticated(page, &prepared.state.cookies)
            .await?;

        let flow = PublishFlow::new(&self.config, prepared.selectors.clone());
        flow.run(page, &prepared.article, ctx).await
    }

    /// 失败出口：确定阶段、采集诊断、生成结果
    async fn fail(
        &self,
        ctx: &RunCtx,
        page: Option<&dyn SnapshotSource>,
        err: AppError,
    ) -> RunOutcome {
        let phase = err.phase().unwrap_or_else(|| ctx.phase());
        error!("[{}] ❌ {}", phase, err);

        let record = FailureRecord::new(&ctx.run_id, phase, err.kind(), err.to_string());
        let diagnostic = self.diagnostics.capture(page, record).await;
        RunOutcome::failed(phase, err.to_string(), diagnostic)
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("panic: {}", msg)
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("panic: {}", msg)
    } else {
        "panic".to_string()
    }
}
