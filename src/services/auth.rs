//! 登录 - 业务能力层

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppResult, NavigationError};
use crate::infrastructure::{DocumentSession, Selector};
use crate::services::credentials::Credentials;
use crate::services::{diagnostics, probes};

/// 登录后用来判断是否仍停留在登录页
const LOGIN_URL_MARKER: &str = "login";

/// 登录 LMS
///
/// 关闭可能出现的弹窗 → 填写用户名密码 → 点击登录 → 检查地址。
/// 失败时保存 `login_error.png`。
pub async fn login(
    session: &dyn DocumentSession,
    config: &Config,
    credentials: &Credentials,
) -> AppResult<()> {
    let result = submit_login_form(session, config, credentials).await;
    if let Err(e) = &result {
        if !e.is_fatal() {
            diagnostics::save_page_screenshot(session, &config.screenshot_dir, diagnostics::LOGIN_ERROR)
                .await;
        }
    }
    result
}

async fn submit_login_form(
    session: &dyn DocumentSession,
    config: &Config,
    credentials: &Credentials,
) -> AppResult<()> {
    info!("\n🔐 正在登录...");
    session.navigate(&config.site_url).await?;
    sleep(config.settle_delay()).await;

    dismiss_popup(session, config).await;

    let username = probes::wait_for(session, &Selector::css("#username"), config.wait_timeout()).await?;
    session.fill(username, &credentials.username).await?;
    info!("✅ 已输入用户名");

    let password = probes::wait_for(session, &Selector::css("#password"), config.wait_timeout()).await?;
    session.fill(password, &credentials.password).await?;
    info!("✅ 已输入密码");

    let login_candidates = probes::login_probes(&config.labels);
    let (button, _) = probes::first_match(session, &login_candidates)
        .await
        .ok_or_else(|| NavigationError::ElementNotFound {
            selector: "登录按钮".to_string(),
            timeout_secs: 0,
        })?;

    session.scroll_into_view(button).await?;
    session.click(button).await?;
    info!("✅ 已点击登录按钮");

    sleep(config.settle_delay()).await;

    let url = session.current_url().await?;
    if url.to_lowercase().contains(LOGIN_URL_MARKER) {
        return Err(NavigationError::LoginRejected { url }.into());
    }

    info!("✅ 登录成功");
    Ok(())
}

/// 关闭 cookie / 公告弹窗，失败不影响登录
async fn dismiss_popup(session: &dyn DocumentSession, config: &Config) {
    let candidates = probes::popup_probes(&config.labels);
    if let Some((button, selector)) = probes::first_match(session, &candidates).await {
        match session.click(button).await {
            Ok(()) => {
                info!("✅ 弹窗已关闭");
                sleep(config.question_pause()).await;
            }
            Err(e) => warn!("关闭弹窗失败 ({}): {}", selector, e),
        }
    } else {
        debug!("没有弹窗");
    }
}
