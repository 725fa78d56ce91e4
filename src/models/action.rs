use crate::models::question::QuestionKind;

/// 由 Oracle 回复推导出的作答动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedAction {
    /// 写入文本框（覆盖原内容）
    WriteText(String),
    /// 选中这些位置（从 1 开始，按回复中出现的顺序，不重复）
    SelectPositions(Vec<usize>),
}

impl AppliedAction {
    /// 按题型收窄动作：单选题只保留回复中的第一个编号
    pub fn narrow_for(self, kind: QuestionKind) -> Self {
        match (self, kind) {
            (AppliedAction::SelectPositions(positions), QuestionKind::SingleChoice) => {
                AppliedAction::SelectPositions(positions.into_iter().take(1).collect())
            }
            (action, _) => action,
        }
    }
}
