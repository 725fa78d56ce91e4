use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::BrowserHandle;
use crate::error::{AppError, AppResult, BrowserError};

/// 启动浏览器并导航到指定 URL
///
/// `headless` 为 false 时打开可见窗口，方便观察答题过程。
pub async fn launch_browser(
    url: &str,
    headless: bool,
    chrome_executable: Option<&str>,
) -> AppResult<(BrowserHandle, Page)> {
    info!("🚀 启动浏览器 (无头模式: {})...", headless);
    debug!("目标 URL: {}", url);

    let mut builder = BrowserConfig::builder();
    builder = if headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = chrome_executable {
        builder = builder.chrome_executable(Path::new(path));
    }

    let config = builder
        .window_size(1600, 1000)
        .args(vec![
            "--no-sandbox",                                  // 禁用沙盒，防止权限问题导致的崩溃
            "--disable-dev-shm-usage",                       // 防止共享内存不足
            "--disable-blink-features=AutomationControlled", // 隐藏自动化标记
        ])
        .build()
        .map_err(|e| {
            error!("配置浏览器失败: {}", e);
            AppError::Browser(BrowserError::LaunchFailed(e))
        })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        AppError::Browser(BrowserError::LaunchFailed(e.to_string()))
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let handle = BrowserHandle::new(browser, handler_task, true);
    let page = match handle.new_page(url).await {
        Ok(page) => page,
        Err(e) => {
            error!("创建页面失败: {}", e);
            handle.close().await;
            return Err(e);
        }
    };

    info!("✅ 浏览器已导航到: {}", url);
    Ok((handle, page))
}

impl BrowserHandle {
    async fn new_page(&self, url: &str) -> AppResult<Page> {
        self.browser
            .new_page(url)
            .await
            .map_err(|e| AppError::page_load_failed(url, e))
    }
}
