use anyhow::{Context, Result};
use tracing::{error, warn};

use quiz_autosolver::orchestrator::menu;
use quiz_autosolver::services::credentials;
use quiz_autosolver::utils::{logging, Console};
use quiz_autosolver::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load().context("加载配置失败")?;

    // 初始化日志
    logging::init(config.verbose_logging);

    let mut console = Console::new();
    let credentials = credentials::load_or_bootstrap(&config.credentials_file, &mut console)
        .await
        .context("读取凭据失败")?;

    // 初始化并运行应用
    let app = App::initialize(config, credentials).await?;

    let (result, interrupted) = tokio::select! {
        result = menu::run(&app, &mut console) => (result, false),
        _ = tokio::signal::ctrl_c() => {
            warn!("\n⚠️ 收到中断信号");
            (Ok(()), true)
        }
    };

    app.shutdown().await;

    if interrupted {
        // stdin 读取停在阻塞线程里，runtime 无法正常结束
        std::process::exit(130);
    }

    if let Err(e) = &result {
        error!("❌ 运行终止: {}", e);
    }
    result.context("浏览器会话错误")
}
