//! 作答执行 - 业务能力层
//!
//! 把 `AppliedAction` 落到页面上：写文本或点选项。

use tracing::{debug, info};

use crate::error::{AppResult, InterpretationError};
use crate::infrastructure::{DocumentSession, ElementRef};
use crate::models::AppliedAction;
use crate::services::question_extractor::{choice_controls, FREE_TEXT_SELECTOR};

/// 在题目区域内执行作答动作
///
/// - 文本：清空后写入第一个文本框
/// - 选项：按位置找到该选项行的输入框，未选中的通过脚本点击；不会取消其它选项
pub async fn apply(
    session: &dyn DocumentSession,
    region: ElementRef,
    action: &AppliedAction,
) -> AppResult<()> {
    match action {
        AppliedAction::WriteText(text) => {
            let input = session
                .find_first_within(region, FREE_TEXT_SELECTOR)
                .await?
                .ok_or(InterpretationError::NoAnswerTarget)?;
            session.fill(input, text).await?;
            info!("✅ 答案已写入文本框: {}", text);
        }
        AppliedAction::SelectPositions(positions) => {
            let controls = choice_controls(session, region).await?;
            if controls.is_empty() {
                return Err(InterpretationError::NoAnswerTarget.into());
            }
            for &position in positions {
                let input = position
                    .checked_sub(1)
                    .and_then(|i| controls.get(i))
                    .and_then(|control| control.input)
                    .ok_or(InterpretationError::PositionUnavailable {
                        position,
                        available: controls.len(),
                    })?;

                if session.is_checked(input).await? {
                    debug!("选项 {} 已是选中状态", position);
                    continue;
                }
                session.scroll_into_view(input).await?;
                session.force_click(input).await?;
                info!("✅ 已选择选项 №{}", position);
            }
        }
    }
    Ok(())
}
