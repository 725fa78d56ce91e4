pub mod action;
pub mod question;
pub mod quiz;

pub use action::AppliedAction;
pub use question::{AnswerWidget, MediaBlob, Question, QuestionKind, WidgetKind};
pub use quiz::{CompletionStatus, QuizActivity, QuizOutcome, SectionSummary, SkipReason};
