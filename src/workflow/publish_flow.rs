//! 发布流程 - 流程层
//!
//! 核心职责：定义"一篇文章"从空白编辑器到终态的完整流程
//!
//! 流程顺序：
//! 1. 定位标题栏 → 输入标题
//! 2. 定位正文区 → 输入正文
//! 3. 草稿模式：保存按钮（可选）→ DraftSaved
//!    公开模式：公開に進む → 投稿する → PublishConfirmed

use std::fmt;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, PublishError};
use crate::infrastructure::PageDriver;
use crate::models::{Article, CandidateMatcher, Phase, PublishMode, SelectorSet, Terminal};
use crate::services::{ContentInjector, ElementResolver, InjectOptions};
use crate::workflow::run_ctx::RunCtx;

/// 发布状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Idle,
    TitleSet,
    BodySet,
    SavingDraft,
    Proceeding,
    DraftSaved { explicit_save: bool },
    PublishConfirmed,
    Failed,
}

impl PublishState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PublishState::DraftSaved { .. } | PublishState::PublishConfirmed | PublishState::Failed
        )
    }
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishState::DraftSaved { explicit_save: true } => f.write_str("DraftSaved(explicit)"),
            PublishState::DraftSaved { explicit_save: false } => f.write_str("DraftSaved(autosave)"),
            other => write!(f, "{:?}", other),
        }
    }
}

/// 驱动状态迁移的事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishEvent {
    TitleEntered,
    BodyEntered,
    DraftRequested,
    DraftSettled { explicit_save: bool },
    ProceedClicked,
    ConfirmClicked,
    Aborted,
}

/// 发布状态机
///
/// 纯数据结构，不接触页面。发布模式在创建时固定：
/// 草稿模式下 `ProceedClicked` 是非法事件，反之亦然。
#[derive(Debug, Clone)]
pub struct PublishMachine {
    mode: PublishMode,
    state: PublishState,
    history: Vec<PublishState>,
}

impl PublishMachine {
    pub fn new(mode: PublishMode) -> Self {
        Self {
            mode,
            state: PublishState::Idle,
            history: vec![PublishState::Idle],
        }
    }

    pub fn state(&self) -> PublishState {
        self.state
    }

    /// 经过的全部状态（含初始状态）
    pub fn history(&self) -> &[PublishState] {
        &self.history
    }

    /// 成功终态
    pub fn terminal(&self) -> Option<Terminal> {
        match self.state {
            PublishState::DraftSaved { explicit_save } => Some(Terminal::DraftSaved { explicit_save }),
            PublishState::PublishConfirmed => Some(Terminal::PublishConfirmed),
            _ => None,
        }
    }

    pub fn apply(&mut self, event: PublishEvent) -> AppResult<PublishState> {
        use PublishEvent as E;
        use PublishState as S;

        let next = match (self.state, event, self.mode) {
            (S::Idle, E::TitleEntered, _) => S::TitleSet,
            (S::TitleSet, E::BodyEntered, _) => S::BodySet,
            (S::BodySet, E::DraftRequested, PublishMode::Draft) => S::SavingDraft,
            (S::SavingDraft, E::DraftSettled { explicit_save }, _) => S::DraftSaved { explicit_save },
            (S::BodySet, E::ProceedClicked, PublishMode::Publish) => S::Proceeding,
            (S::Proceeding, E::ConfirmClicked, _) => S::PublishConfirmed,
            (state, E::Aborted, _) if !state.is_terminal() => S::Failed,
            (state, event, _) => {
                return Err(PublishError::InvalidTransition {
                    from: state.to_string(),
                    event: format!("{:?}", event),
                }
                .into())
            }
        };

        debug!("状态迁移: {} --{:?}--> {}", self.state, event, next);
        self.state = next;
        self.history.push(next);
        Ok(next)
    }
}

/// 流程中的等待时间
#[derive(Debug, Clone, Copy)]
pub struct FlowTiming {
    pub candidate_timeout: Duration,
    pub poll_interval: Duration,
    pub save_probe_timeout: Duration,
    pub publish_wait: Duration,
    pub settle: Duration,
}

impl FlowTiming {
    pub fn from_config(config: &Config) -> Self {
        Self {
            candidate_timeout: config.candidate_timeout,
            poll_interval: config.poll_interval,
            save_probe_timeout: config.save_probe_timeout,
            publish_wait: config.publish_wait,
            settle: config.draft_settle,
        }
    }
}

/// 发布流程
///
/// - 编排标题、正文、保存/发布的顺序
/// - 不持有任何资源（page）
/// - 只依赖业务能力（services）
pub struct PublishFlow {
    selectors: SelectorSet,
    resolver: ElementResolver,
    injector: ContentInjector,
    timing: FlowTiming,
}

impl PublishFlow {
    pub fn new(config: &Config, selectors: SelectorSet) -> Self {
        let timing = FlowTiming::from_config(config);
        Self {
            selectors,
            resolver: ElementResolver::new(timing.candidate_timeout, timing.poll_interval),
            injector: ContentInjector::new(InjectOptions::from_config(config)),
            timing,
        }
    }

    /// 执行完整流程，返回成功终态
    pub async fn run<P: PageDriver>(
        &self,
        page: &P,
        article: &Article,
        ctx: &RunCtx,
    ) -> AppResult<Terminal> {
        let mut machine = PublishMachine::new(ctx.mode);

        match self.drive(page, article, ctx, &mut machine).await {
            Ok(terminal) => {
                info!("[{}] 🎉 流程完成: {}", ctx.phase(), machine.state());
                Ok(terminal)
            }
            Err(e) => {
                if let Err(transition) = machine.apply(PublishEvent::Aborted) {
                    debug!("终止状态机失败: {}", transition);
                }
                error!(
                    "[{}] ❌ 流程失败 (状态轨迹: {}): {}",
                    ctx.phase(),
                    render_history(machine.history()),
                    e
                );
                Err(e)
            }
        }
    }

    async fn drive<P: PageDriver>(
        &self,
        page: &P,
        article: &Article,
        ctx: &RunCtx,
        machine: &mut PublishMachine,
    ) -> AppResult<Terminal> {
        // ========== 标题 ==========
        ctx.enter(Phase::Title);
        let title = self.resolver.resolve(page, &self.selectors.title).await?;
        self.injector.set_title(page, &title.element, &article.title).await?;
        machine.apply(PublishEvent::TitleEntered)?;

        // ========== 正文 ==========
        ctx.enter(Phase::Body);
        let body = self.resolver.resolve(page, &self.selectors.body).await?;
        self.injector.set_body(page, &body.element, article).await?;
        machine.apply(PublishEvent::BodyEntered)?;

        // ========== 保存 / 发布 ==========
        ctx.enter(Phase::Publish);
        match ctx.mode {
            PublishMode::Draft => self.save_draft(page, machine).await?,
            PublishMode::Publish => self.publish(page, machine).await?,
        }

        machine
            .terminal()
            .ok_or_else(|| AppError::Unexpected(format!("流程结束于非终态 {}", machine.state())))
    }

    /// 草稿：保存按钮可见就点一次，否则依赖编辑器自动保存
    async fn save_draft<P: PageDriver>(&self, page: &P, machine: &mut PublishMachine) -> AppResult<()> {
        machine.apply(PublishEvent::DraftRequested)?;
        info!("[publish] 💾 草稿模式");

        let probe = self.resolver.with_wait(self.timing.save_probe_timeout);
        let explicit_save = match probe.resolve(page, &self.selectors.save_draft).await {
            Ok(button) => match page.click(&button.element).await {
                Ok(()) => {
                    info!("[publish] ✅ 已点击保存按钮");
                    true
                }
                Err(e) => {
                    warn!("[publish] ⚠️ 点击保存按钮失败 ({})，视为自动保存", e);
                    false
                }
            },
            Err(_) => {
                info!("[publish] ⚠️ 未发现保存按钮，视为自动保存");
                false
            }
        };

        sleep(self.timing.settle).await;
        machine.apply(PublishEvent::DraftSettled { explicit_save })?;
        Ok(())
    }

    /// 公开：依次点击"公開に進む"和"投稿する"
    async fn publish<P: PageDriver>(&self, page: &P, machine: &mut PublishMachine) -> AppResult<()> {
        info!("[publish] 🚀 公开模式，等待发布按钮...");

        self.click_when_visible(page, &self.selectors.proceed).await?;
        machine.apply(PublishEvent::ProceedClicked)?;

        self.click_when_visible(page, &self.selectors.confirm).await?;
        machine.apply(PublishEvent::ConfirmClicked)?;

        info!("[publish] ✅ 已确认发布");
        sleep(self.timing.settle).await;
        Ok(())
    }

    async fn click_when_visible<P: PageDriver>(
        &self,
        page: &P,
        matcher: &CandidateMatcher,
    ) -> AppResult<()> {
        let field = matcher.field;
        let waiter = self.resolver.with_wait(self.timing.publish_wait);

        let button = waiter.resolve(page, matcher).await.map_err(|e| match e {
            AppError::Element(_) => PublishError::ButtonNotFound {
                field,
                waited_ms: self.timing.publish_wait.as_millis() * matcher.candidates.len() as u128,
            }
            .into(),
            other => other,
        })?;

        page.click(&button.element)
            .await
            .map_err(|e| PublishError::ClickFailed {
                field,
                reason: e.to_string(),
            })?;
        info!("[publish] 👆 已点击 {}", field);
        Ok(())
    }
}

fn render_history(history: &[PublishState]) -> String {
    history
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" → ")
}
