//! 内容注入服务 - 业务能力层
//!
//! 把标题和正文写进已经定位好的编辑器控件。

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info};

use crate::config::{Config, InjectStrategy};
use crate::error::{AppError, AppResult, InputError};
use crate::infrastructure::PageDriver;
use crate::models::{Article, Field};
use crate::utils::logging::truncate_text;

/// 注入参数
#[derive(Debug, Clone)]
pub struct InjectOptions {
    pub strategy: InjectStrategy,
    pub body_max_chars: usize,
    pub title_delay: Duration,
    pub body_delay: Duration,
    /// 基础时间预算，逐字输入时再按字符数追加
    pub base_timeout: Duration,
}

impl InjectOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            strategy: config.inject_strategy,
            body_max_chars: config.body_max_chars,
            title_delay: config.title_type_delay,
            body_delay: config.body_type_delay,
            base_timeout: config.input_timeout,
        }
    }
}

/// 内容注入器
///
/// 职责：
/// - 标题：聚焦、清空、输入
/// - 正文：聚焦、按策略截断后输入
/// - 每一步都有时间上限
pub struct ContentInjector {
    options: InjectOptions,
}

impl ContentInjector {
    pub fn new(options: InjectOptions) -> Self {
        Self { options }
    }

    /// 写入标题（先清空已有内容）
    pub async fn set_title<P: PageDriver>(
        &self,
        page: &P,
        element: &P::Element,
        title: &str,
    ) -> AppResult<()> {
        let field = Field::Title;
        info!("[title] ✍️ 输入标题: {}", truncate_text(title, 40));

        let typed = self.options.strategy == InjectStrategy::Keystroke;
        let budget = self.budget(title, self.options.title_delay, typed);

        self.bounded(field, budget, async {
            page.focus(element).await?;
            page.clear_content(element).await?;
            if typed {
                page.type_text(element, title, self.options.title_delay).await
            } else {
                page.insert_text(element, title).await
            }
        })
        .await
    }

    /// 写入正文（按字符数截断）
    pub async fn set_body<P: PageDriver>(
        &self,
        page: &P,
        element: &P::Element,
        article: &Article,
    ) -> AppResult<()> {
        let field = Field::Body;
        let body = article.capped_body(self.options.body_max_chars);
        let total = article.body.chars().count();
        if total > self.options.body_max_chars {
            info!(
                "[body] ✂️ 正文 {} 字，截断为 {} 字",
                total, self.options.body_max_chars
            );
        }
        info!("[body] ✍️ 输入正文 ({:?})", self.options.strategy);

        let typed = self.options.strategy == InjectStrategy::Keystroke;
        let budget = self.budget(body, self.options.body_delay, typed);

        self.bounded(field, budget, async {
            page.focus(element).await?;
            match self.options.strategy {
                InjectStrategy::Keystroke => {
                    page.type_text(element, body, self.options.body_delay).await
                }
                InjectStrategy::InsertText => page.insert_text(element, body).await,
                InjectStrategy::Html => {
                    page.insert_html(element, &article.capped_body_html(self.options.body_max_chars))
                        .await
                }
            }
        })
        .await
    }

    fn budget(&self, text: &str, delay: Duration, typed: bool) -> Duration {
        if !typed {
            return self.options.base_timeout;
        }
        let chars = text.chars().count() as u32;
        self.options.base_timeout.saturating_add(delay.saturating_mul(chars))
    }

    async fn bounded<F>(&self, field: Field, budget: Duration, work: F) -> AppResult<()>
    where
        F: std::future::Future<Output = AppResult<()>>,
    {
        debug!("[{}] 输入时间预算 {:?}", field.phase(), budget);
        match timeout(budget, work).await {
            Ok(Ok(())) => {
                info!("[{}] ✅ {} 输入完成", field.phase(), field);
                Ok(())
            }
            Ok(Err(e)) => Err(InputError::Failed {
                field,
                reason: e.to_string(),
            }
            .into()),
            Err(_) => Err(AppError::Input(InputError::Timeout {
                field,
                timeout_ms: budget.as_millis(),
            })),
        }
    }
}
