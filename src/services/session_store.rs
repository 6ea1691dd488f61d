//! 会话存储服务 - 业务能力层
//!
//! 读取 → 修复域名 → 写回，三步显式分开；修复本身是纯函数。

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{AppResult, SessionError};
use crate::models::{CookieRecord, SessionState};

/// 一次域名修复的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// 属于目标站点的 Cookie 数
    pub matched: usize,
    /// 新增的 Cookie 数
    pub added: usize,
}

/// 会话存储
///
/// 职责：
/// - 读取 / 写回会话状态文件
/// - 为别名域名补齐 Cookie
pub struct SessionStore {
    path: PathBuf,
    target_domain: String,
    alias_domains: Vec<String>,
}

impl SessionStore {
    pub fn new(
        path: impl Into<PathBuf>,
        target_domain: impl Into<String>,
        alias_domains: Vec<String>,
    ) -> Self {
        Self {
            path: path.into(),
            target_domain: target_domain.into(),
            alias_domains,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取会话状态
    pub async fn load(path: &Path) -> AppResult<SessionState> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SessionError::Read {
                path: path.display().to_string(),
                source: e,
            })?;

        let state: SessionState =
            serde_json::from_str(&content).map_err(|e| SessionError::Parse {
                path: path.display().to_string(),
                source: e,
            })?;

        debug!("读取会话状态: {} 条 Cookie", state.cookies.len());
        Ok(state)
    }

    /// 写回会话状态（临时文件 + rename）
    pub async fn persist(path: &Path, state: &SessionState) -> AppResult<()> {
        let write_err = |reason: String| SessionError::Write {
            path: path.display().to_string(),
            reason,
        };

        let json = serde_json::to_string_pretty(state).map_err(|e| write_err(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| write_err(e.to_string()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| write_err(e.to_string()))?;
        Ok(())
    }

    /// 读取并修复会话状态；有新增时写回原文件
    pub async fn load_and_repair(&self) -> AppResult<SessionState> {
        let state = Self::load(&self.path).await?;
        let (state, report) = repair_domains(state, &self.target_domain, &self.alias_domains);

        if report.added > 0 {
            Self::persist(&self.path, &state).await?;
            info!(
                "🍪 Cookie 补全: 目标站点 {} 条，新增 {} 条，已写回 {}",
                report.matched,
                report.added,
                self.path.display()
            );
        } else {
            info!("🍪 Cookie 已覆盖全部别名域名，无需写回 ({} 条)", report.matched);
        }

        Ok(state)
    }
}

/// 为目标站点的每条 Cookie 补齐所有别名域名
///
/// 域名比较是精确字符串比较；已存在 (name, path, domain) 相同的记录时不再添加，
/// 因此对同一输入重复执行不会产生新的记录。
pub fn repair_domains(
    mut state: SessionState,
    target_domain: &str,
    alias_domains: &[String],
) -> (SessionState, RepairReport) {
    let mut report = RepairReport::default();
    let mut present: HashSet<(String, String, String)> = state
        .cookies
        .iter()
        .map(|c| {
            let (name, path, domain) = c.identity();
            (name.to_string(), path.to_string(), domain.to_string())
        })
        .collect();

    let mut extra: Vec<CookieRecord> = Vec::new();
    for cookie in state.cookies.iter() {
        if !cookie.domain.contains(target_domain) {
            continue;
        }
        report.matched += 1;

        for alias in alias_domains {
            if cookie.domain == *alias {
                continue;
            }
            let key = (cookie.name.clone(), cookie.path.clone(), alias.clone());
            if present.insert(key) {
                extra.push(cookie.rescoped(alias));
            }
        }
    }

    report.added = extra.len();
    state.cookies.extend(extra);
    (state, report)
}
