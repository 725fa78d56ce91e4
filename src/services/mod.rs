//! 业务能力层（Services）
//!
//! 每个模块描述"我能做什么"，只处理单个题目 / 单个页面，不关心整体流程。

pub mod answer_applier;
pub mod audio_guard;
pub mod auth;
pub mod credentials;
pub mod diagnostics;
pub mod oracle;
pub mod probes;
pub mod question_extractor;
pub mod reply_interpreter;
pub mod section_scanner;

pub use credentials::Credentials;
pub use oracle::{Oracle, OracleClient};
pub use question_extractor::QuestionExtractor;
