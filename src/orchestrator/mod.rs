//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层是整个系统的"指挥中心"：持有浏览器会话，按固定顺序调度各阶段。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (一次运行，持有 BrowserSession)
//!     ↓
//! workflow::PublishFlow (标题 → 正文 → 保存/发布)
//!     ↓
//! services (能力层：session / navigator / resolver / injector / diagnostics)
//!     ↓
//! infrastructure (基础设施：PageDriver)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有 BrowserSession
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度、收尾和结果汇总

pub mod app;

pub use app::App;
