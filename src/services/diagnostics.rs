//! 失败诊断服务 - 业务能力层
//!
//! 失败时保存整页截图和一条结构化记录。诊断本身的失败只记日志，
//! 绝不覆盖原始错误。

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::infrastructure::SnapshotSource;
use crate::models::Phase;

const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(15);

/// 一次失败的结构化记录
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    pub run_id: String,
    pub phase: Phase,
    pub kind: String,
    pub message: String,
    pub url: Option<String>,
    pub timestamp: String,
    pub screenshot: Option<String>,
}

impl FailureRecord {
    pub fn new(
        run_id: impl Into<String>,
        phase: Phase,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            phase,
            kind: kind.into(),
            message: message.into(),
            url: None,
            timestamp: chrono::Local::now().to_rfc3339(),
            screenshot: None,
        }
    }
}

/// 诊断输出端口
#[async_trait]
pub trait DiagnosticSink: Send + Sync {
    /// 保存诊断产物；返回主要产物的路径，无法保存时返回 None
    async fn capture(
        &self,
        page: Option<&dyn SnapshotSource>,
        record: FailureRecord,
    ) -> Option<PathBuf>;
}

/// 写入产物目录的诊断实现
///
/// 文件名：`<run-stamp>_error_<phase>.png` 与同名 `.json`
pub struct ArtifactDiagnostics {
    dir: PathBuf,
}

impl ArtifactDiagnostics {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn snapshot(&self, page: &dyn SnapshotSource, path: &Path) -> Option<PathBuf> {
        let png = match timeout(SNAPSHOT_TIMEOUT, page.screenshot_png()).await {
            Ok(Ok(png)) => png,
            Ok(Err(e)) => {
                warn!("⚠️ 截图失败: {}", e);
                return None;
            }
            Err(_) => {
                warn!("⚠️ 截图超时 ({:?})", SNAPSHOT_TIMEOUT);
                return None;
            }
        };

        match tokio::fs::write(path, png).await {
            Ok(()) => Some(path.to_path_buf()),
            Err(e) => {
                warn!("⚠️ 保存截图失败 {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[async_trait]
impl DiagnosticSink for ArtifactDiagnostics {
    async fn capture(
        &self,
        page: Option<&dyn SnapshotSource>,
        mut record: FailureRecord,
    ) -> Option<PathBuf> {
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!("⚠️ 无法创建诊断目录 {}: {}", self.dir.display(), e);
            return None;
        }

        let stem = format!("{}_error_{}", record.run_id, record.phase.label());
        let png_path = self.dir.join(format!("{}.png", stem));
        let json_path = self.dir.join(format!("{}.json", stem));

        let mut screenshot = None;
        if let Some(page) = page {
            if record.url.is_none() {
                record.url = page.current_url().await.ok();
            }
            screenshot = self.snapshot(page, &png_path).await;
        }
        record.screenshot = screenshot.as_ref().map(|p| p.display().to_string());

        let written = match serde_json::to_vec_pretty(&record) {
            Ok(json) => match tokio::fs::write(&json_path, json).await {
                Ok(()) => Some(json_path),
                Err(e) => {
                    warn!("⚠️ 保存失败记录失败: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("⚠️ 序列化失败记录失败: {}", e);
                None
            }
        };

        let primary = screenshot.or(written);
        if let Some(path) = &primary {
            info!("📸 诊断已保存: {}", path.display());
        }
        primary
    }
}

/// 关闭诊断（`CAPTURE_ON_FAILURE=false`）
pub struct DisabledDiagnostics;

#[async_trait]
impl DiagnosticSink for DisabledDiagnostics {
    async fn capture(
        &self,
        _page: Option<&dyn SnapshotSource>,
        _record: FailureRecord,
    ) -> Option<PathBuf> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppResult, BrowserError};

    struct StaticPage {
        png: Option<Vec<u8>>,
    }

    #[async_trait]
    impl SnapshotSource for StaticPage {
        async fn screenshot_png(&self) -> AppResult<Vec<u8>> {
            self.png
                .clone()
                .ok_or_else(|| BrowserError::Screenshot("page crashed".into()).into())
        }

        async fn current_url(&self) -> AppResult<String> {
            Ok("https://editor.note.com/notes/n1/edit".into())
        }
    }

    #[tokio::test]
    async fn writes_png_and_json_record() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ArtifactDiagnostics::new(dir.path());
        let page = StaticPage {
            png: Some(vec![0x89, b'P', b'N', b'G']),
        };
        let record = FailureRecord::new("20260101-120000", Phase::Publish, "PublishButtonNotFound", "boom");

        let path = sink.capture(Some(&page), record).await.unwrap();
        assert_eq!(path, dir.path().join("20260101-120000_error_publish.png"));
        assert_eq!(std::fs::read(&path).unwrap(), vec![0x89, b'P', b'N', b'G']);

        let json = std::fs::read_to_string(dir.path().join("20260101-120000_error_publish.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "PublishButtonNotFound");
        assert_eq!(value["phase"], "publish");
        assert_eq!(value["url"], "https://editor.note.com/notes/n1/edit");
    }

    #[tokio::test]
    async fn screenshot_failure_still_leaves_a_record() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ArtifactDiagnostics::new(dir.path());
        let page = StaticPage { png: None };
        let record = FailureRecord::new("run", Phase::Body, "InputFailure", "x");

        let path = sink.capture(Some(&page), record).await.unwrap();
        assert_eq!(path, dir.path().join("run_error_body.json"));
        assert!(!dir.path().join("run_error_body.png").exists());
    }

    #[tokio::test]
    async fn pageless_capture_writes_json_only() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ArtifactDiagnostics::new(dir.path().join("nested"));
        let record = FailureRecord::new("run", Phase::Session, "SessionReadError", "missing");

        let path = sink.capture(None, record).await.unwrap();
        assert_eq!(path, dir.path().join("nested").join("run_error_session.json"));
    }
}
