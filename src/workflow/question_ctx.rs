//! 题目处理上下文
//!
//! 封装"我正在处理哪个测验的第几题"这一信息

use std::fmt::Display;

/// 题目处理上下文
#[derive(Debug, Clone)]
pub struct QuestionCtx {
    /// 测验在章节中的编号（仅用于日志显示）
    pub quiz_number: usize,

    /// 题目在测验中的索引（从1开始）
    pub question_index: usize,

    /// 本测验的题目总数
    pub total: usize,
}

impl QuestionCtx {
    /// 创建新的题目上下文
    pub fn new(quiz_number: usize, question_index: usize, total: usize) -> Self {
        Self {
            quiz_number,
            question_index,
            total,
        }
    }
}

impl Display for QuestionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[测验 #{} 题目 {}/{}]",
            self.quiz_number, self.question_index, self.total
        )
    }
}
