//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责章节和测验的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `section_runner` - 章节处理器
//! - 管理应用生命周期（初始化、运行、清理）
//! - 扫描章节得到待做列表（Vec<QuizActivity>）
//! - 持有浏览器资源（BrowserHandle、PageSession）
//! - 输出章节统计
//!
//! ### `quiz_resolver` - 单个测验处理器
//! - 测验状态机（Loading → AudioCheck → InProgress → Submitting）
//! - 遍历题目区域，复用 QuestionFlow
//! - 提交测验
//!
//! ### `menu` - 交互菜单
//!
//! ## 层次关系
//!
//! ```text
//! section_runner (处理 Vec<QuizActivity>)
//!     ↓
//! quiz_resolver (处理 Vec<题目区域>)
//!     ↓
//! workflow::QuestionFlow (处理单个 Question)
//!     ↓
//! services (能力层：extract / oracle / interpret / apply)
//!     ↓
//! infrastructure (基础设施：DocumentSession)
//! ```

pub mod menu;
pub mod quiz_resolver;
pub mod section_runner;

// 重新导出主要类型
pub use quiz_resolver::{resolve_quiz, QuizState};
pub use section_runner::{process_worklist, App, RunMode, SectionRunner};
