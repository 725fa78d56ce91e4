//! 题目处理流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整处理流程
//!
//! 流程顺序：
//! 1. 提取题目（文本、图片、控件）
//! 2. 询问 Oracle
//! 3. 解析回复 → 作答动作
//! 4. 在页面上执行动作

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppResult, InterpretationError};
use crate::infrastructure::{DocumentSession, ElementRef};
use crate::models::{AppliedAction, Question};
use crate::services::{answer_applier, reply_interpreter, Oracle, QuestionExtractor};
use crate::utils::logging::truncate_text;
use crate::workflow::question_ctx::QuestionCtx;

/// 题目处理流程
///
/// - 编排单道题的处理顺序
/// - 不持有任何资源（page），只借用 `DocumentSession`
/// - 只依赖业务能力（services）
pub struct QuestionFlow {
    extractor: QuestionExtractor,
    oracle: Arc<dyn Oracle>,
    verbose_logging: bool,
}

impl QuestionFlow {
    /// 创建新的题目处理流程
    pub fn new(config: &Config, oracle: Arc<dyn Oracle>) -> Self {
        Self {
            extractor: QuestionExtractor::new(),
            oracle,
            verbose_logging: config.verbose_logging,
        }
    }

    pub fn extractor(&self) -> &QuestionExtractor {
        &self.extractor
    }

    /// 处理一道题
    ///
    /// 成功时返回已写入页面的作答动作；任何一步失败都以 `Err` 返回，
    /// 由调用方记录后继续下一题。
    pub async fn run(
        &self,
        session: &dyn DocumentSession,
        region: ElementRef,
        title_fragment: &str,
        ctx: &QuestionCtx,
    ) -> AppResult<AppliedAction> {
        let question = self
            .extractor
            .extract(session, region, ctx.question_index, title_fragment)
            .await?;
        self.log_question(ctx, &question);

        let prompt = question.render_prompt();
        if self.verbose_logging {
            debug!("{} 完整提示词:\n{}", ctx, prompt);
        }

        let reply = self.oracle.query(&prompt, &question.media).await?;
        info!("{} 🤖 Oracle 回复: {}", ctx, reply);

        let action = reply_interpreter::interpret(&reply, &question.widgets)
            .ok_or_else(|| InterpretationError::NoActionableAnswer {
                reply: reply.clone(),
            })?
            .narrow_for(question.kind());
        debug!("{} 作答动作: {:?}", ctx, action);

        answer_applier::apply(session, region, &action).await?;
        Ok(action)
    }

    // ========== 日志辅助方法 ==========

    fn log_question(&self, ctx: &QuestionCtx, question: &Question) {
        info!(
            "{} 题干: {}",
            ctx,
            truncate_text(&question.prompt_text.replace('\n', " "), 80)
        );
        info!(
            "{} 题型: {:?}, 选项 {} 个, 图片 {} 张",
            ctx,
            question.kind(),
            question.choices().count(),
            question.media.len()
        );
        if question.widgets.is_empty() {
            warn!("{} ⚠️ 没有找到作答控件", ctx);
        }
    }
}
