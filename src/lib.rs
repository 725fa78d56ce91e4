//! # Quiz Autosolver
//!
//! 自动完成 Moodle 课程章节中测验的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `DocumentSession` - 页面能力 trait（查找、读取、点击、输入、截图）
//! - `PageSession` - 基于 chromiumoxide 的实现，唯一的 page owner
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个题目或单个页面
//! - `QuestionExtractor` - 题目提取
//! - `OracleClient` - Oracle 问答
//! - `reply_interpreter` / `answer_applier` - 解析回复并作答
//! - `section_scanner` / `auth` / `probes` / `audio_guard` - 页面级能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整处理流程
//! - `QuestionCtx` - 上下文封装（测验编号 + 题目索引）
//! - `QuestionFlow` - 流程编排（extract → oracle → interpret → apply）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/section_runner` - 章节处理器，管理资源
//! - `orchestrator/quiz_resolver` - 单个测验处理器，状态机
//! - `orchestrator/menu` - 交互菜单
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{DocumentSession, ElementRef, PageSession, Selector};
pub use models::{AppliedAction, Question, QuizActivity, QuizOutcome, SectionSummary};
pub use orchestrator::{App, RunMode, SectionRunner};
pub use services::{Oracle, OracleClient};
pub use workflow::{QuestionCtx, QuestionFlow};
