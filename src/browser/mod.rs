//! 浏览器资源
//!
//! 启动或连接浏览器，返回 `BrowserHandle` + `Page`。
//! `BrowserHandle` 负责在任何退出路径上释放浏览器。

pub mod connection;
pub mod launch;

use chromiumoxide::{Browser, Page};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;

pub use connection::connect_to_browser_and_page;
pub use launch::launch_browser;

/// 浏览器句柄
pub struct BrowserHandle {
    browser: Browser,
    handler_task: JoinHandle<()>,
    /// 是否由本程序启动（连接到外部浏览器时不关闭它）
    owned: bool,
}

impl BrowserHandle {
    pub(crate) fn new(browser: Browser, handler_task: JoinHandle<()>, owned: bool) -> Self {
        Self {
            browser,
            handler_task,
            owned,
        }
    }

    /// 关闭浏览器并结束事件处理任务
    pub async fn close(mut self) {
        if self.owned {
            if let Err(e) = self.browser.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
            if let Err(e) = self.browser.wait().await {
                warn!("等待浏览器进程退出失败: {}", e);
            }
            info!("✅ 浏览器已关闭");
        } else {
            info!("✅ 已断开与外部浏览器的连接");
        }
        self.handler_task.abort();
    }
}

/// 按配置打开浏览器：有调试端口时连接，否则自行启动
pub async fn open(config: &Config) -> AppResult<(BrowserHandle, Page)> {
    match config.browser_debug_port {
        Some(port) => connect_to_browser_and_page(port, Some(&config.site_url)).await,
        None => {
            launch_browser(
                &config.site_url,
                config.headless,
                config.chrome_executable.as_deref(),
            )
            .await
        }
    }
}
