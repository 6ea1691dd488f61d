use thiserror::Error;

use crate::models::matcher::Field;
use crate::models::outcome::Phase;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 会话状态文件错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 导航 / 登录错误
    #[error("导航错误: {0}")]
    Navigation(#[from] NavigationError),
    /// 元素定位错误
    #[error("元素错误: {0}")]
    Element(#[from] ElementError),
    /// 内容输入错误
    #[error("输入错误: {0}")]
    Input(#[from] InputError),
    /// 发布流程错误
    #[error("发布错误: {0}")]
    Publish(#[from] PublishError),
    /// 文章文件错误
    #[error("文章错误: {0}")]
    Article(#[from] ArticleError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 流水线内部 panic
    #[error("未预期的错误: {0}")]
    Unexpected(String),
}

/// 会话状态错误（SessionReadError）
#[derive(Debug, Error)]
pub enum SessionError {
    /// 文件不存在或无法读取
    #[error("无法读取会话文件 {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 不是合法的 JSON 结构
    #[error("会话文件格式错误 {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// 回写失败
    #[error("无法写回会话文件 {path}: {reason}")]
    Write { path: String, reason: String },
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 浏览器配置失败
    #[error("浏览器配置失败: {0}")]
    ConfigurationFailed(String),
    /// 启动浏览器失败
    #[error("启动浏览器失败: {0}")]
    LaunchFailed(String),
    /// 创建页面失败
    #[error("创建页面失败: {0}")]
    PageCreationFailed(String),
    /// CDP 调用失败
    #[error("CDP 调用失败: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
    /// 执行脚本返回了意外结果
    #[error("脚本返回异常: {0}")]
    Script(String),
    /// 截图失败
    #[error("截图失败: {0}")]
    Screenshot(String),
}

/// 导航与登录错误
#[derive(Debug, Error)]
pub enum NavigationError {
    /// 页面未在期限内就绪（NavigationTimeout）
    #[error("导航到 {url} 超时 ({timeout_ms}ms)")]
    Timeout { url: String, timeout_ms: u128 },
    /// 导航本身失败
    #[error("导航到 {url} 失败: {reason}")]
    Failed { url: String, reason: String },
    /// 重试一次后仍被重定向到登录页（LoginRedirectDetected）
    #[error("会话被拒绝，重试后仍跳转到登录页: {landed}")]
    LoginRedirect { landed: String },
}

/// 元素定位错误
#[derive(Debug, Error)]
pub enum ElementError {
    /// 所有候选都未命中（ElementNotFound）
    #[error("未找到 {field} 控件 (已尝试 {tried} 个候选)")]
    NotFound { field: Field, tried: usize },
}

/// 内容输入错误（InputFailure）
#[derive(Debug, Error)]
pub enum InputError {
    #[error("{field} 输入失败: {reason}")]
    Failed { field: Field, reason: String },
    #[error("{field} 输入超时 ({timeout_ms}ms)")]
    Timeout { field: Field, timeout_ms: u128 },
}

/// 发布流程错误
#[derive(Debug, Error)]
pub enum PublishError {
    /// 按钮未在等待期内出现（PublishButtonNotFound）
    #[error("{field} 按钮未出现 (等待 {waited_ms}ms)")]
    ButtonNotFound { field: Field, waited_ms: u128 },
    /// 点击失败
    #[error("点击 {field} 失败: {reason}")]
    ClickFailed { field: Field, reason: String },
    /// 状态机收到非法事件
    #[error("非法的状态迁移: {from} -> {event}")]
    InvalidTransition { from: String, event: String },
}

/// 文章文件错误
#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("无法读取文章 {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("文章内容为空: {path}")]
    Empty { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必需的环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
    /// 选择器覆盖文件不可用
    #[error("选择器文件 {path} 不可用: {reason}")]
    SelectorFileUnreadable { path: String, reason: String },
    /// 候选列表为空
    #[error("字段 {field} 的候选列表为空")]
    EmptyCandidates { field: Field },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::Cdp(err))
    }
}

// ========== 阶段归属 ==========

impl AppError {
    /// 错误天然归属的阶段；浏览器层错误没有固定阶段，由调用方的当前阶段决定
    pub fn phase(&self) -> Option<Phase> {
        match self {
            AppError::Session(_) => Some(Phase::Session),
            AppError::Article(_) => Some(Phase::Article),
            AppError::Config(_) => Some(Phase::Startup),
            AppError::Navigation(NavigationError::LoginRedirect { .. }) => Some(Phase::Login),
            AppError::Navigation(_) => Some(Phase::Navigation),
            AppError::Element(ElementError::NotFound { field, .. }) => Some(field.phase()),
            AppError::Input(InputError::Failed { field, .. })
            | AppError::Input(InputError::Timeout { field, .. }) => Some(field.phase()),
            AppError::Publish(_) => Some(Phase::Publish),
            AppError::Browser(_) | AppError::Unexpected(_) => None,
        }
    }

    /// 结构化记录里使用的错误种类
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Session(_) => "SessionReadError",
            AppError::Browser(_) => "BrowserError",
            AppError::Navigation(NavigationError::LoginRedirect { .. }) => "LoginRedirectDetected",
            AppError::Navigation(NavigationError::Timeout { .. }) => "NavigationTimeout",
            AppError::Navigation(NavigationError::Failed { .. }) => "NavigationFailed",
            AppError::Element(_) => "ElementNotFound",
            AppError::Input(_) => "InputFailure",
            AppError::Publish(PublishError::ButtonNotFound { .. }) => "PublishButtonNotFound",
            AppError::Publish(PublishError::ClickFailed { .. }) => "PublishClickFailed",
            AppError::Publish(PublishError::InvalidTransition { .. }) => "InvalidTransition",
            AppError::Article(_) => "ArticleReadError",
            AppError::Config(_) => "ConfigError",
            AppError::Unexpected(_) => "Unexpected",
        }
    }

    /// 构造脚本异常
    pub fn script(msg: impl Into<String>) -> Self {
        AppError::Browser(BrowserError::Script(msg.into()))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_know_their_phase() {
        let not_found = AppError::from(ElementError::NotFound {
            field: Field::Body,
            tried: 5,
        });
        assert_eq!(not_found.phase(), Some(Phase::Body));
        assert_eq!(not_found.kind(), "ElementNotFound");
        assert!(not_found.to_string().contains("body"));

        let login = AppError::from(NavigationError::LoginRedirect {
            landed: "https://note.com/login".into(),
        });
        assert_eq!(login.phase(), Some(Phase::Login));
        assert_eq!(login.kind(), "LoginRedirectDetected");

        assert_eq!(AppError::script("x").phase(), None);
    }
}
