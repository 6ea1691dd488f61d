//! 运行上下文
//!
//! 封装"这是哪一次运行、现在走到哪个阶段"这一信息

use std::fmt::Display;
use std::sync::Mutex;

use tracing::info;

use crate::models::{Phase, PublishMode};

/// 运行上下文
///
/// 阶段记录在内部可变状态里，流水线中途 panic 时编排层仍能读到最后进入的阶段
#[derive(Debug)]
pub struct RunCtx {
    /// 运行标识（时间戳），也用作诊断文件名前缀
    pub run_id: String,

    /// 本次运行的发布模式
    pub mode: PublishMode,

    phase: Mutex<Phase>,
}

impl RunCtx {
    /// 以当前时间创建上下文
    pub fn new(mode: PublishMode) -> Self {
        Self::with_id(chrono::Local::now().format("%Y%m%d-%H%M%S").to_string(), mode)
    }

    pub fn with_id(run_id: impl Into<String>, mode: PublishMode) -> Self {
        Self {
            run_id: run_id.into(),
            mode,
            phase: Mutex::new(Phase::Startup),
        }
    }

    /// 进入新阶段
    pub fn enter(&self, phase: Phase) {
        let mut current = self.phase.lock().unwrap_or_else(|p| p.into_inner());
        *current = phase;
        info!("[{}] ▶ 进入阶段", phase);
    }

    /// 最后进入的阶段
    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Display for RunCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[运行 #{} 模式#{} 阶段#{}]",
            self.run_id,
            self.mode,
            self.phase()
        )
    }
}
