use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::session::ChromeSession;
use crate::error::{AppResult, BrowserError};
use crate::infrastructure::{BrowserLauncher, BrowserSession, CdpPage, LaunchOptions};
use crate::models::SessionState;

/// 启动全新的 Chrome 实例
///
/// 每次运行使用独立的临时 profile 目录，互不影响
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    profile_root: Option<PathBuf>,
}

impl ChromeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定 profile 目录的父目录（默认系统临时目录）
    pub fn with_profile_root(path: impl Into<PathBuf>) -> Self {
        Self {
            profile_root: Some(path.into()),
        }
    }

    fn profile_dir(&self) -> PathBuf {
        let root = self.profile_root.clone().unwrap_or_else(std::env::temp_dir);
        root.join(format!(
            "note-auto-post-{}-{}",
            std::process::id(),
            chrono::Local::now().format("%Y%m%d%H%M%S")
        ))
    }
}

fn build_config(options: &LaunchOptions, profile_dir: &Path) -> AppResult<BrowserConfig> {
    let args = vec![
        "--disable-gpu".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        format!("--lang={}", options.locale),
    ];

    let mut builder = BrowserConfig::builder()
        .user_data_dir(profile_dir)
        .window_size(options.viewport_width, options.viewport_height)
        .viewport(Viewport {
            width: options.viewport_width,
            height: options.viewport_height,
            ..Default::default()
        })
        .request_timeout(options.request_timeout)
        .args(args);

    builder = if options.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };

    if let Some(exe) = &options.chrome_executable {
        builder = builder.chrome_executable(exe);
    }

    builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        BrowserError::ConfigurationFailed(e).into()
    })
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    type Session = ChromeSession;

    async fn open(&self, state: &SessionState, options: &LaunchOptions) -> AppResult<ChromeSession> {
        info!("🚀 启动浏览器 (headless: {})...", options.headless);
        let profile_dir = self.profile_dir();
        let config = build_config(options, &profile_dir)?;

        let (mut browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            error!("启动浏览器失败: {}", e);
            BrowserError::LaunchFailed(e.to_string())
        })?;
        debug!("浏览器启动成功, profile: {}", profile_dir.display());

        // 在后台处理浏览器事件
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    debug!("浏览器事件处理出错: {}", e);
                }
            }
        });

        // 添加短暂延迟以等待浏览器状态同步
        sleep(tokio::time::Duration::from_millis(300)).await;

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                error!("创建页面失败: {}", e);
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                let _ = tokio::fs::remove_dir_all(&profile_dir).await;
                return Err(BrowserError::PageCreationFailed(e.to_string()).into());
            }
        };

        let page = CdpPage::new(page, options.request_timeout);
        let session = ChromeSession::new(browser, handler_task, page, profile_dir);
        if let Err(e) = session.seed(state, &options.locale).await {
            error!("预置会话状态失败: {}", e);
            if let Err(close_err) = session.close().await {
                error!("关闭浏览器失败: {}", close_err);
            }
            return Err(e);
        }

        info!("✅ 浏览器已就绪");
        Ok(session)
    }
}
