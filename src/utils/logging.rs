/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use tracing::{error, info};
use tracing::Subscriber;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::RunOutcome;
use crate::workflow::RunCtx;

/// 构造日志订阅者
///
/// `RUST_LOG` 优先；否则按 `verbose` 选择 debug / info。
pub fn subscriber(verbose: bool) -> impl Subscriber + Send + Sync + 'static {
    let default_level = if verbose { "note_auto_post=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish()
}

/// 安装全局 tracing 输出。重复调用是安全的。
pub fn init(verbose: bool) {
    let _ = subscriber(verbose).try_init();
}

/// 加载配置，再按配置里的 `verbose_logging` 安装全局日志
///
/// 加载期间使用临时的 info 级订阅者，配置项的解析警告不会丢失。
pub fn init_with_config<F>(load: F) -> crate::error::AppResult<Config>
where
    F: FnOnce() -> crate::error::AppResult<Config>,
{
    let config = tracing::subscriber::with_default(subscriber(false), load);
    init(config.as_ref().map_or(false, |c| c.verbose_logging));
    config
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, ctx: &RunCtx) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - note 自动投稿 {}", ctx);
    info!("📝 发布模式: {}", config.publish_mode);
    info!("🌐 目标地址: {}", config.start_url);
    info!("📄 文章文件: {}", config.article_path.display());
    info!("🍪 会话文件: {}", config.state_path.display());
    info!("{}", "=".repeat(60));
}

/// 打印最终结果
pub fn log_outcome(outcome: &RunOutcome, ctx: &RunCtx) {
    info!("\n{}", "=".repeat(60));
    info!(
        "📊 运行结束 {} | 完成时间: {}",
        ctx.run_id,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    if outcome.success {
        if let Some(terminal) = &outcome.terminal {
            info!("✅ 成功: {:?}", terminal);
        }
    } else {
        error!(
            "❌ 失败于阶段 [{}]: {}",
            outcome.phase,
            outcome.error.as_deref().unwrap_or("未知错误")
        );
        if let Some(path) = &outcome.diagnostic_path {
            error!("📸 诊断文件: {}", path.display());
        }
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
