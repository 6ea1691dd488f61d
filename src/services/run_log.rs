//! 运行记录服务 - 业务能力层
//!
//! 只负责"追加一行运行结果到 runs.log"，不关心流程

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::models::{PublishMode, RunOutcome};

/// 运行记录写入服务
///
/// 职责：
/// - 每次运行追加恰好一行
/// - 不解析、不轮转已有内容
pub struct RunLogWriter {
    log_path: PathBuf,
}

impl RunLogWriter {
    /// 写入 `<dir>/runs.log`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            log_path: dir.as_ref().join("runs.log"),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// 追加一条运行记录
    pub async fn append(&self, run_id: &str, mode: PublishMode, outcome: &RunOutcome) -> std::io::Result<()> {
        let line = format_line(run_id, mode, outcome);
        debug!("写入运行记录: {}", line.trim_end());

        if let Some(parent) = self.log_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .await?;

        file.write_all(line.as_bytes()).await?;

        Ok(())
    }
}

fn format_line(run_id: &str, mode: PublishMode, outcome: &RunOutcome) -> String {
    let status = if outcome.success { "OK" } else { "FAIL" };
    let mut line = format!(
        "{} | {} | mode={} | phase={}",
        run_id, status, mode, outcome.phase
    );
    if let Some(terminal) = &outcome.terminal {
        line.push_str(&format!(" | terminal={:?}", terminal));
    }
    if let Some(error) = &outcome.error {
        line.push_str(&format!(" | error={}", error.replace('\n', " ")));
    }
    if let Some(path) = &outcome.diagnostic_path {
        line.push_str(&format!(" | diagnostic={}", path.display()));
    }
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Phase, Terminal};

    #[tokio::test]
    async fn appends_one_line_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RunLogWriter::in_dir(dir.path().join("artifacts"));

        writer
            .append(
                "r1",
                PublishMode::Draft,
                &RunOutcome::succeeded(Terminal::DraftSaved { explicit_save: true }),
            )
            .await
            .unwrap();
        writer
            .append(
                "r2",
                PublishMode::Publish,
                &RunOutcome::failed(Phase::Publish, "投稿する 未出现\n第二行", None),
            )
            .await
            .unwrap();

        let content = std::fs::read_to_string(writer.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("r1 | OK | mode=draft | phase=completed"));
        assert!(lines[1].contains("FAIL | mode=publish | phase=publish"));
        assert!(lines[1].contains("未出现 第二行"));
    }
}
