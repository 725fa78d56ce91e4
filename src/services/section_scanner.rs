//! 章节扫描 - 业务能力层
//!
//! 列出课程章节中的测验并判断完成状态。

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{Config, LabelSet};
use crate::error::{AppError, AppResult, NavigationError};
use crate::infrastructure::{DocumentSession, ElementRef, Selector};
use crate::models::{CompletionStatus, QuizActivity};
use crate::services::probes;

/// 章节内容列表
pub const SECTION_CONTENT_SELECTOR: &str = "ul.section";
/// 测验条目
pub const QUIZ_ACTIVITY_SELECTOR: &str = "li.activity.quiz, li.activity.modtype_quiz";
/// 测验链接
pub const QUIZ_LINK_SELECTOR: &str = "a[href*='/mod/quiz/view.php']";
/// 测验名称
pub const INSTANCE_NAME_SELECTOR: &str = ".instancename";
/// 完成状态图标
pub const COMPLETION_ICON_SELECTOR: &str = ".autocompletion img, .completion img";

/// 章节的 DOM id 选择器
pub fn section_selector(section: u32) -> Selector {
    Selector::css(format!("#section-{}", section))
}

/// 根据完成图标的 src / alt 判断状态
///
/// "已完成" 优先于 "未完成"；都不匹配时为 `Unknown`。
pub fn classify(src: &str, alt: &str, labels: &LabelSet) -> CompletionStatus {
    let alt = alt.to_lowercase();
    let src_has = |needles: &[String]| needles.iter().any(|n| src.contains(n.as_str()));
    let alt_has = |needles: &[String]| {
        needles
            .iter()
            .any(|n| alt.contains(n.to_lowercase().as_str()))
    };

    if src_has(&labels.done_icon_src) || alt_has(&labels.done_icon_alt) {
        CompletionStatus::Done
    } else if src_has(&labels.pending_icon_src) || alt_has(&labels.pending_icon_alt) {
        CompletionStatus::Pending
    } else {
        CompletionStatus::Unknown
    }
}

/// 从扫描结果中选出待做列表（保持文档顺序）
///
/// `solve_unknown` 为 false 时只保留明确未完成的测验。
pub fn pending(activities: &[QuizActivity], solve_unknown: bool) -> Vec<QuizActivity> {
    activities
        .iter()
        .filter(|a| match a.status {
            CompletionStatus::Done => false,
            CompletionStatus::Pending => true,
            CompletionStatus::Unknown => solve_unknown,
        })
        .cloned()
        .collect()
}

/// 扫描章节
///
/// 章节不存在时返回 `SectionNotFound`；读不出的单个条目记日志后跳过。
pub async fn scan(
    session: &dyn DocumentSession,
    config: &Config,
    section: u32,
) -> AppResult<Vec<QuizActivity>> {
    info!("\n📚 分析章节 {}...", section);

    session.navigate(&config.course_url).await?;
    sleep(config.settle_delay()).await;

    let section_el = probes::wait_for(session, &section_selector(section), config.wait_timeout())
        .await
        .map_err(|e| match e {
            AppError::Navigation(NavigationError::ElementNotFound { .. }) => {
                AppError::Navigation(NavigationError::SectionNotFound { section })
            }
            other => other,
        })?;
    info!("✅ 找到章节 {}", section);

    let content = session
        .find_first_within(section_el, SECTION_CONTENT_SELECTOR)
        .await?
        .ok_or_else(|| NavigationError::ElementNotFound {
            selector: SECTION_CONTENT_SELECTOR.to_string(),
            timeout_secs: 0,
        })?;

    let items = session.find_within(content, QUIZ_ACTIVITY_SELECTOR).await?;
    if items.is_empty() {
        warn!("⚠️ 章节 {} 中没有测验", section);
        return Ok(Vec::new());
    }
    info!("📝 找到测验: {} 个\n", items.len());

    let mut activities = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let number = i + 1;
        match read_activity(session, item, number, &config.labels).await {
            Ok(Some(activity)) => {
                log_activity(&activity);
                activities.push(activity);
            }
            Ok(None) => warn!("  ⚠️ 条目 {} 没有测验链接，已跳过", number),
            Err(e) => warn!("  ⚠️ 读取条目 {} 失败: {}", number, e),
        }
    }

    Ok(activities)
}

async fn read_activity(
    session: &dyn DocumentSession,
    item: ElementRef,
    number: usize,
    labels: &LabelSet,
) -> AppResult<Option<QuizActivity>> {
    let Some(link) = session.find_first_within(item, QUIZ_LINK_SELECTOR).await? else {
        return Ok(None);
    };
    let url = session.attribute(link, "href").await?.unwrap_or_default();

    let display_name = match session
        .find_first_within(link, INSTANCE_NAME_SELECTOR)
        .await?
    {
        Some(name) => session.text(name).await?,
        None => session.text(link).await?,
    };

    let status = match session
        .find_first_within(item, COMPLETION_ICON_SELECTOR)
        .await?
    {
        Some(icon) => {
            let src = session.attribute(icon, "src").await?.unwrap_or_default();
            let alt = session.attribute(icon, "alt").await?.unwrap_or_default();
            classify(&src, &alt, labels)
        }
        None => CompletionStatus::Unknown,
    };

    Ok(Some(QuizActivity {
        number,
        id: QuizActivity::id_from_url(&url),
        display_name: display_name.trim().to_string(),
        status,
        url,
    }))
}

fn log_activity(activity: &QuizActivity) {
    info!(
        "  {}. {}",
        activity.number,
        crate::utils::logging::truncate_text(&activity.display_name, 60)
    );
    info!(
        "     状态: {} | ID: {}",
        activity.status.label(),
        activity.id
    );
}
