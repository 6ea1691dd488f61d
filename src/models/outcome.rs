//! 运行阶段与结果

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// 发布模式，整个运行期间固定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PublishMode {
    /// 仅保存草稿
    Draft,
    /// 公开发布
    Publish,
}

impl PublishMode {
    /// 只有字面量 `true` 才表示公开发布
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("true") => PublishMode::Publish,
            _ => PublishMode::Draft,
        }
    }
}

impl fmt::Display for PublishMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishMode::Draft => f.write_str("draft"),
            PublishMode::Publish => f.write_str("publish"),
        }
    }
}

/// 流水线阶段，按执行顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Startup,
    Article,
    Session,
    Launch,
    Navigation,
    Login,
    Title,
    Body,
    Publish,
    Teardown,
    Completed,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Startup => "startup",
            Phase::Article => "article",
            Phase::Session => "session",
            Phase::Launch => "launch",
            Phase::Navigation => "navigation",
            Phase::Login => "login",
            Phase::Title => "title",
            Phase::Body => "body",
            Phase::Publish => "publish",
            Phase::Teardown => "teardown",
            Phase::Completed => "completed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 发布流程的终态（成功侧）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Terminal {
    /// 草稿已保存；`explicit_save` 为 false 表示依赖编辑器自动保存
    DraftSaved { explicit_save: bool },
    PublishConfirmed,
}

impl Terminal {
    pub fn mode(self) -> PublishMode {
        match self {
            Terminal::DraftSaved { .. } => PublishMode::Draft,
            Terminal::PublishConfirmed => PublishMode::Publish,
        }
    }
}

/// 一次运行的最终结果
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub success: bool,
    /// 成功时为 `Completed`，失败时为出错阶段
    pub phase: Phase,
    pub terminal: Option<Terminal>,
    pub diagnostic_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl RunOutcome {
    pub fn succeeded(terminal: Terminal) -> Self {
        Self {
            success: true,
            phase: Phase::Completed,
            terminal: Some(terminal),
            diagnostic_path: None,
            error: None,
        }
    }

    pub fn failed(phase: Phase, error: impl Into<String>, diagnostic_path: Option<PathBuf>) -> Self {
        Self {
            success: false,
            phase,
            terminal: None,
            diagnostic_path,
            error: Some(error.into()),
        }
    }

    /// 进程退出码
    pub fn exit_code(&self) -> u8 {
        if self.success {
            0
        } else {
            1
        }
    }
}
