use std::process::ExitCode;

use anyhow::Result;
use note_auto_post::utils::logging;
use note_auto_post::{App, ChromeLauncher, Config};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // 加载配置并初始化日志
    let config = logging::init_with_config(Config::from_env)?;

    // 初始化并运行应用
    let outcome = App::new(config, ChromeLauncher::new()).run().await;

    Ok(ExitCode::from(outcome.exit_code()))
}
