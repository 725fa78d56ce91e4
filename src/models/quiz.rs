use std::fmt;

use serde::{Deserialize, Serialize};

/// 测验完成状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionStatus {
    Done,
    Pending,
    Unknown,
}

impl CompletionStatus {
    pub fn label(self) -> &'static str {
        match self {
            CompletionStatus::Done => "✅ 已完成",
            CompletionStatus::Pending => "⏳ 未完成",
            CompletionStatus::Unknown => "❔ 未知",
        }
    }
}

/// 章节中的一个测验
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizActivity {
    /// 在章节列表中的序号（从 1 开始）
    pub number: usize,
    /// 链接中的 `id=` 参数，没有时为 `N/A`
    pub id: String,
    pub display_name: String,
    pub status: CompletionStatus,
    pub url: String,
}

impl QuizActivity {
    /// 从测验链接中取出 `id=` 参数
    pub fn id_from_url(url: &str) -> String {
        url.split_once("id=")
            .map(|(_, rest)| rest.split('&').next().unwrap_or_default().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| "N/A".to_string())
    }
}

/// 跳过测验的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 页面上有音频/视频
    AudioPresent,
    /// 没有找到题目
    NoQuestions,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AudioPresent => write!(f, "包含音频/视频"),
            SkipReason::NoQuestions => write!(f, "未找到题目"),
        }
    }
}

/// 单个测验的最终结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizOutcome {
    /// 已提交
    Done,
    Skipped(SkipReason),
    Failed(String),
}

/// 章节运行统计
///
/// 跨测验共享的唯一状态。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionSummary {
    pub section: u32,
    /// 章节中的测验总数
    pub listed: usize,
    /// 待做列表长度
    pub pending: usize,
    pub done: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SectionSummary {
    pub fn new(section: u32, listed: usize, pending: usize) -> Self {
        Self {
            section,
            listed,
            pending,
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: &QuizOutcome) {
        match outcome {
            QuizOutcome::Done => self.done += 1,
            QuizOutcome::Skipped(_) => self.skipped += 1,
            QuizOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn processed(&self) -> usize {
        self.done + self.skipped + self.failed
    }
}
