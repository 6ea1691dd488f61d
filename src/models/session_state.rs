//! 会话状态模型
//!
//! 与 Playwright `storageState` 文件格式保持一致：`cookies` + `origins`，
//! 未识别的字段原样保留，回写时不会丢失。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// 持久化的浏览器登录状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub cookies: Vec<CookieRecord>,

    #[serde(default)]
    pub origins: Vec<OriginState>,

    /// 其他未知字段
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// 单条 Cookie 记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,

    #[serde(default = "default_path")]
    pub path: String,

    /// 过期时间（秒），-1 表示会话 Cookie
    #[serde(default = "default_expires")]
    pub expires: f64,

    #[serde(default)]
    pub http_only: bool,

    #[serde(default)]
    pub secure: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// 某个源下的 localStorage 快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginState {
    pub origin: String,

    #[serde(default)]
    pub local_storage: Vec<StorageEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEntry {
    pub name: String,
    pub value: String,
}

fn default_path() -> String {
    "/".to_string()
}

fn default_expires() -> f64 {
    -1.0
}

impl CookieRecord {
    /// Cookie 的身份键：(name, path, domain)
    pub fn identity(&self) -> (&str, &str, &str) {
        (&self.name, &self.path, &self.domain)
    }

    /// 复制一份并改写作用域域名
    pub fn rescoped(&self, domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            ..self.clone()
        }
    }

    /// 是否为会话 Cookie（无过期时间）
    pub fn is_session(&self) -> bool {
        self.expires < 0.0
    }
}
