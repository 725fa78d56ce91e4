//! 现场截图 - 业务能力层
//!
//! 登录失败、测验失败或找不到题目时，把整个页面截图保存到 `screenshot_dir`。
//! 截图只用于事后排查，保存失败只记警告，不影响主流程。

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::DocumentSession;

/// 登录失败
pub const LOGIN_ERROR: &str = "login_error.png";
/// 答题页上找不到题目
pub const NO_QUESTIONS: &str = "no_questions.png";
/// 测验处理失败
pub const QUIZ_ERROR: &str = "quiz_error.png";

/// 截图并保存为 `dir/name`，返回保存路径
pub async fn capture(session: &dyn DocumentSession, dir: &str, name: &str) -> AppResult<PathBuf> {
    let png = session.page_screenshot().await?;
    fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::file_write_failed(dir, e))?;

    let path = Path::new(dir).join(name);
    fs::write(&path, png)
        .await
        .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
    Ok(path)
}

/// 尽力截图：失败时只记录警告
pub async fn save_page_screenshot(session: &dyn DocumentSession, dir: &str, name: &str) {
    match capture(session, dir, name).await {
        Ok(path) => info!("📸 已保存页面截图: {}", path.display()),
        Err(e) => warn!("⚠️ 保存页面截图 {} 失败: {}", name, e),
    }
}
