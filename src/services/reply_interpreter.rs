//! 回复解析 - 业务能力层
//!
//! 把 Oracle 的自由文本回复映射成对作答控件的具体动作。

use tracing::debug;

use crate::models::{AnswerWidget, AppliedAction, WidgetKind};

/// 解析 Oracle 回复
///
/// 规则：
/// 1. 没有控件、自由作答题、或回复里没有数字：整段回复（去掉首尾空白）作为文本写入
/// 2. 选择题：回复中每一段连续数字都是候选编号，只保留 `1..=控件数` 内的，去重后保持出现顺序
/// 3. 没有可用编号，或文本为空：`None`，题目留空
///
/// 单选/多选不在这里区分，由调用方根据题型决定只用第一个编号还是全部。
pub fn interpret(reply: &str, widgets: &[AnswerWidget]) -> Option<AppliedAction> {
    let reply = reply.trim();
    let is_free_text =
        widgets.is_empty() || widgets.iter().any(|w| w.kind == WidgetKind::FreeText);

    if is_free_text || !reply.chars().any(|c| c.is_ascii_digit()) {
        if reply.is_empty() {
            return None;
        }
        return Some(AppliedAction::WriteText(reply.to_string()));
    }

    let positions = valid_positions(reply, widgets.len());
    debug!("回复 {:?} 解析出编号: {:?}", reply, positions);

    if positions.is_empty() {
        None
    } else {
        Some(AppliedAction::SelectPositions(positions))
    }
}

/// 提取所有连续数字段，过滤越界编号并去重
fn valid_positions(reply: &str, widget_count: usize) -> Vec<usize> {
    let mut positions = Vec::new();
    for run in reply
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
    {
        let Ok(position) = run.parse::<usize>() else {
            continue;
        };
        if (1..=widget_count).contains(&position) && !positions.contains(&position) {
            positions.push(position);
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choices(count: usize, kind: WidgetKind) -> Vec<AnswerWidget> {
        (1..=count)
            .map(|position| AnswerWidget {
                position,
                kind,
                label: format!("option {}", position),
            })
            .collect()
    }

    #[test]
    fn bare_number_selects_that_position() {
        assert_eq!(
            interpret("2", &choices(4, WidgetKind::SingleChoice)),
            Some(AppliedAction::SelectPositions(vec![2]))
        );
    }

    #[test]
    fn comma_separated_numbers_select_all() {
        assert_eq!(
            interpret("1, 3, 4", &choices(4, WidgetKind::MultiChoice)),
            Some(AppliedAction::SelectPositions(vec![1, 3, 4]))
        );
    }

    #[test]
    fn out_of_range_positions_are_dropped() {
        assert_eq!(
            interpret("1, 3, 9", &choices(4, WidgetKind::MultiChoice)),
            Some(AppliedAction::SelectPositions(vec![1, 3]))
        );
        assert_eq!(
            interpret("0", &choices(4, WidgetKind::SingleChoice)),
            None
        );
    }

    #[test]
    fn multi_digit_runs_are_single_candidates() {
        assert_eq!(interpret("12", &choices(4, WidgetKind::SingleChoice)), None);
        assert_eq!(
            interpret("12", &choices(12, WidgetKind::SingleChoice)),
            Some(AppliedAction::SelectPositions(vec![12]))
        );
    }

    #[test]
    fn numbers_inside_prose_are_found() {
        assert_eq!(
            interpret("The answer is 3.", &choices(4, WidgetKind::SingleChoice)),
            Some(AppliedAction::SelectPositions(vec![3]))
        );
        assert_eq!(
            interpret("2,2,1", &choices(4, WidgetKind::MultiChoice)),
            Some(AppliedAction::SelectPositions(vec![2, 1]))
        );
    }

    #[test]
    fn reply_without_digits_on_choice_question_is_text() {
        assert_eq!(
            interpret("  goes ", &choices(3, WidgetKind::SingleChoice)),
            Some(AppliedAction::WriteText("goes".to_string()))
        );
    }

    #[test]
    fn free_text_reply_is_written_verbatim() {
        let widgets = vec![AnswerWidget::free_text()];
        assert_eq!(
            interpret(" 1990s \n", &widgets),
            Some(AppliedAction::WriteText("1990s".to_string()))
        );
        assert_eq!(
            interpret("have been working", &widgets),
            Some(AppliedAction::WriteText("have been working".to_string()))
        );
    }

    #[test]
    fn no_widgets_falls_back_to_text() {
        assert_eq!(
            interpret("3", &[]),
            Some(AppliedAction::WriteText("3".to_string()))
        );
    }

    #[test]
    fn empty_reply_is_no_action() {
        assert_eq!(interpret("   ", &[AnswerWidget::free_text()]), None);
        assert_eq!(interpret("", &choices(2, WidgetKind::SingleChoice)), None);
    }

    #[test]
    fn huge_numbers_are_ignored() {
        assert_eq!(
            interpret("99999999999999999999999 2", &choices(3, WidgetKind::SingleChoice)),
            Some(AppliedAction::SelectPositions(vec![2]))
        );
    }
}
