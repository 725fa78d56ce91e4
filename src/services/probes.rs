//! 控件探测 - 业务能力层
//!
//! "按顺序尝试一组候选选择器，第一个命中的生效"。
//! 候选全部落空时返回 `None`，由调用方决定这是否算失败。

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::config::LabelSet;
use crate::error::{AppResult, NavigationError};
use crate::infrastructure::{DocumentSession, ElementRef, Selector};

/// 轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 依次尝试候选，返回第一个命中的元素及其选择器
///
/// 单个候选出错只记日志，继续尝试下一个。
pub async fn first_match<'a>(
    session: &dyn DocumentSession,
    candidates: &'a [Selector],
) -> Option<(ElementRef, &'a Selector)> {
    for candidate in candidates {
        match session.find_first(candidate).await {
            Ok(Some(element)) => {
                debug!("✓ 命中候选: {}", candidate);
                return Some((element, candidate));
            }
            Ok(None) => debug!("候选未命中: {}", candidate),
            Err(e) => debug!("候选 {} 查找出错: {}", candidate, e),
        }
    }
    None
}

/// 等待元素出现，超时返回 `ElementNotFound`
///
/// 至少查找一次，超时为 0 时只查找一次。
pub async fn wait_for(
    session: &dyn DocumentSession,
    selector: &Selector,
    timeout: Duration,
) -> AppResult<ElementRef> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(element) = session.find_first(selector).await? {
            return Ok(element);
        }
        if Instant::now() >= deadline {
            return Err(NavigationError::ElementNotFound {
                selector: selector.to_string(),
                timeout_secs: timeout.as_secs(),
            }
            .into());
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// 把文字转成 XPath 字符串字面量
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{}'", text)
    } else if !text.contains('"') {
        format!("\"{}\"", text)
    } else {
        let parts: Vec<String> = text.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// 文字包含 `label` 的按钮
pub fn button_with_text(label: &str) -> Selector {
    Selector::xpath(format!(
        "//button[contains(text(), {})]",
        xpath_literal(label)
    ))
}

/// value 包含 `label` 的提交输入框
pub fn submit_input_with_value(label: &str) -> Selector {
    Selector::xpath(format!(
        "//input[@type='submit' and contains(@value, {})]",
        xpath_literal(label)
    ))
}

/// 文字包含任一 `labels` 的按钮
pub fn button_with_any_text(labels: &[String]) -> Selector {
    let conditions: Vec<String> = labels
        .iter()
        .map(|l| format!("contains(text(), {})", xpath_literal(l)))
        .collect();
    Selector::xpath(format!("//button[{}]", conditions.join(" or ")))
}

/// "开始/继续答题" 候选
pub fn start_probes(labels: &LabelSet) -> Vec<Selector> {
    let mut probes = vec![Selector::css("button[type='submit']")];
    probes.extend(labels.start.iter().map(|l| button_with_text(l)));
    probes.extend(labels.start.iter().map(|l| submit_input_with_value(l)));
    probes.extend(labels.resume.iter().map(|l| submit_input_with_value(l)));
    probes
}

/// "结束答题" 候选
pub fn submit_probes(labels: &LabelSet) -> Vec<Selector> {
    let mut probes = Vec::new();
    if !labels.finish.is_empty() {
        probes.push(button_with_any_text(&labels.finish));
    }
    probes.push(Selector::css("button[type='submit']"));
    probes.extend(
        labels
            .finish
            .iter()
            .map(|l| Selector::css(format!("input[type='submit'][value*='{}']", l))),
    );
    probes
}

/// 二次确认提交候选
pub fn confirm_probes(labels: &LabelSet) -> Vec<Selector> {
    if labels.confirm.is_empty() {
        return Vec::new();
    }
    vec![button_with_any_text(&labels.confirm)]
}

/// 登录按钮候选
pub fn login_probes(labels: &LabelSet) -> Vec<Selector> {
    let mut probes = vec![
        Selector::css("#loginbtn"),
        Selector::css("[name='loginbtn']"),
        Selector::css("button[type='submit']"),
    ];
    probes.extend(
        labels
            .login
            .iter()
            .map(|l| Selector::css(format!("input[type='submit'][value*='{}']", l))),
    );
    probes
}

/// 弹窗关闭按钮候选
pub fn popup_probes(labels: &LabelSet) -> Vec<Selector> {
    let mut probes: Vec<Selector> = labels
        .accept_popup
        .iter()
        .map(|l| Selector::css(format!("button[title*='{}']", l)))
        .collect();
    probes.push(Selector::css(".modal-footer button"));
    probes.extend(
        labels
            .accept_popup
            .iter()
            .map(|l| Selector::css(format!("input[value*='{}']", l))),
    );
    probes
}
