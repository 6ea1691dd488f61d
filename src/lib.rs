//! # Note Auto Post
//!
//! 一个把生成好的 Markdown 文章自动投稿到 note.com 编辑器的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 页面能力端口（导航、查询、点击、输入）
//! - `CdpPage` - 基于 chromiumoxide 的唯一 page owner
//! - `browser/` - 启动 Chrome、预置会话、关闭
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个能力只做一件事
//! - `SessionStore` - 读取 / 修复 / 写回会话 Cookie
//! - `Navigator` - 打开编辑器，登录重定向时恢复一次
//! - `ElementResolver` - 按有序候选列表定位控件
//! - `ContentInjector` - 输入标题与正文
//! - `DiagnosticSink` - 失败截图与结构化记录
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一篇文章"的完整处理流程
//! - `RunCtx` - 上下文封装（运行标识 + 当前阶段）
//! - `PublishFlow` - 流程编排（标题 → 正文 → 草稿 / 发布）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 单次运行，管理浏览器生命周期与失败收尾
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{ChromeLauncher, ChromeSession};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{BrowserLauncher, BrowserSession, CdpPage, PageDriver};
pub use models::{Article, PublishMode, RunOutcome, Terminal};
pub use orchestrator::App;
pub use workflow::{PublishFlow, RunCtx};
