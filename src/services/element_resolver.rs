//! 元素定位服务 - 业务能力层
//!
//! 按候选列表的声明顺序依次尝试，每个候选在自己的时间片内轮询"存在且可见"。
//! 第一个命中的候选即为结果，后面的候选不会再被查询。

use std::fmt;
use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info};

use crate::error::{AppResult, ElementError};
use crate::infrastructure::PageDriver;
use crate::models::{CandidateMatcher, Field, Locator};

/// 定位结果
pub struct ResolvedElement<E> {
    pub element: E,
    pub field: Field,
    /// 命中的候选在列表中的位置
    pub index: usize,
    pub locator: Locator,
}

impl<E> fmt::Debug for ResolvedElement<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedElement")
            .field("field", &self.field)
            .field("index", &self.index)
            .field("locator", &self.locator.to_string())
            .finish()
    }
}

/// 元素定位器
#[derive(Debug, Clone, Copy)]
pub struct ElementResolver {
    per_candidate: Duration,
    poll_interval: Duration,
}

impl ElementResolver {
    pub fn new(per_candidate: Duration, poll_interval: Duration) -> Self {
        Self {
            per_candidate,
            poll_interval,
        }
    }

    /// 换一个单候选等待时间（发布按钮的等待更长）
    pub fn with_wait(self, per_candidate: Duration) -> Self {
        Self {
            per_candidate,
            ..self
        }
    }

    pub fn per_candidate(&self) -> Duration {
        self.per_candidate
    }

    /// 定位字段；全部候选都未命中时返回 `ElementError::NotFound`
    pub async fn resolve<P: PageDriver>(
        &self,
        page: &P,
        matcher: &CandidateMatcher,
    ) -> AppResult<ResolvedElement<P::Element>> {
        let field = matcher.field;

        for (index, locator) in matcher.candidates.iter().enumerate() {
            debug!("[{}] 尝试候选 #{}: {}", field.phase(), index, locator);

            if let Some(element) = self.wait_visible(page, locator).await {
                info!(
                    "[{}] ✅ {} 定位成功 (候选 #{}: {})",
                    field.phase(),
                    field,
                    index,
                    locator
                );
                return Ok(ResolvedElement {
                    element,
                    field,
                    index,
                    locator: locator.clone(),
                });
            }
        }

        Err(ElementError::NotFound {
            field,
            tried: matcher.candidates.len(),
        }
        .into())
    }

    /// 在时间片内轮询单个候选；查询出错或超时都按未命中处理
    async fn wait_visible<P: PageDriver>(&self, page: &P, locator: &Locator) -> Option<P::Element> {
        let deadline = Instant::now() + self.per_candidate;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match timeout(remaining, Self::visible_once(page, locator)).await {
                Ok(Some(element)) => return Some(element),
                Ok(None) => {}
                Err(_) => {
                    debug!("候选 {} 的查询超出时间片", locator);
                    return None;
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    async fn visible_once<P: PageDriver>(page: &P, locator: &Locator) -> Option<P::Element> {
        match page.query(locator).await {
            Ok(Some(element)) => match page.is_visible(&element).await {
                Ok(true) => Some(element),
                Ok(false) => None,
                Err(e) => {
                    debug!("可见性检查失败 {}: {}", locator, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                debug!("查询失败 {}: {}", locator, e);
                None
            }
        }
    }
}
