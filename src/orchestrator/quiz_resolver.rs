//! 单个测验处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责处理单个测验，是测验级别的编排器。
//!
//! ## 状态
//!
//! ```text
//! Loading → AudioCheck → (开始答题) → AudioCheck → InProgress → Submitting → Done
//!                ↓                         ↓            ↓             ↓
//!             Skipped                   Skipped      Skipped        Failed
//! ```
//!
//! 每次状态切换都会记录日志。单题失败只记日志，不影响后续题目；
//! 测验内的非致命错误统一转成 `Failed`，章节继续处理下一个测验。
//! 找不到题目或测验失败时保存页面截图。

use std::fmt;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppResult, SubmissionError};
use crate::infrastructure::{DocumentSession, ElementRef, Selector};
use crate::models::{QuizActivity, QuizOutcome, SkipReason};
use crate::services::question_extractor::QUESTION_REGION_SELECTORS;
use crate::services::{audio_guard, diagnostics, probes};
use crate::utils::logging::truncate_text;
use crate::workflow::{QuestionCtx, QuestionFlow};

/// 测验处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    Loading,
    AudioCheck,
    InProgress,
    Submitting,
    Done,
    Skipped,
    Failed,
}

impl fmt::Display for QuizState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuizState::Loading => "Loading",
            QuizState::AudioCheck => "AudioCheck",
            QuizState::InProgress => "InProgress",
            QuizState::Submitting => "Submitting",
            QuizState::Done => "Done",
            QuizState::Skipped => "Skipped",
            QuizState::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// 题目处理统计
#[derive(Debug, Default)]
pub struct QuestionStats {
    pub answered: usize,
    pub unanswered: usize,
}

/// 单个测验的处理过程
struct QuizRun<'a> {
    session: &'a dyn DocumentSession,
    flow: &'a QuestionFlow,
    config: &'a Config,
    activity: &'a QuizActivity,
    state: QuizState,
}

/// 处理单个测验
///
/// 只有会话级的致命错误以 `Err` 返回，其余失败都体现在 `QuizOutcome` 中。
pub async fn resolve_quiz(
    session: &dyn DocumentSession,
    flow: &QuestionFlow,
    config: &Config,
    activity: &QuizActivity,
) -> AppResult<QuizOutcome> {
    log_quiz_start(activity);

    let mut run = QuizRun {
        session,
        flow,
        config,
        activity,
        state: QuizState::Loading,
    };
    info!("[测验 #{}] 状态: {}", activity.number, run.state);

    let outcome = match run.drive().await {
        Ok(outcome) => outcome,
        Err(e) if e.is_fatal() => {
            error!("[测验 #{}] ❌ 浏览器会话已断开: {}", activity.number, e);
            return Err(e);
        }
        Err(e) => {
            error!("[测验 #{}] ❌ 处理过程中发生错误: {}", activity.number, e);
            diagnostics::save_page_screenshot(session, &config.screenshot_dir, diagnostics::QUIZ_ERROR)
                .await;
            QuizOutcome::Failed(e.to_string())
        }
    };

    let terminal = match outcome {
        QuizOutcome::Done => QuizState::Done,
        QuizOutcome::Skipped(_) => QuizState::Skipped,
        QuizOutcome::Failed(_) => QuizState::Failed,
    };
    run.transition(terminal);
    log_quiz_complete(activity, &outcome);

    Ok(outcome)
}

impl QuizRun<'_> {
    fn transition(&mut self, next: QuizState) {
        if self.state != next {
            info!(
                "[测验 #{}] 状态: {} → {}",
                self.activity.number, self.state, next
            );
            self.state = next;
        }
    }

    async fn drive(&mut self) -> AppResult<QuizOutcome> {
        // ========== Loading ==========
        self.session.navigate(&self.activity.url).await?;
        sleep(self.config.settle_delay()).await;

        // ========== AudioCheck（测验首页） ==========
        self.transition(QuizState::AudioCheck);
        if self.has_audio().await? {
            return Ok(QuizOutcome::Skipped(SkipReason::AudioPresent));
        }

        self.start_attempt().await?;

        // ========== AudioCheck（答题页） ==========
        if self.has_audio().await? {
            return Ok(QuizOutcome::Skipped(SkipReason::AudioPresent));
        }

        // ========== InProgress ==========
        self.transition(QuizState::InProgress);
        let regions = self.question_regions().await?;
        if regions.is_empty() {
            warn!("[测验 #{}] ⚠️ 未找到题目", self.activity.number);
            diagnostics::save_page_screenshot(
                self.session,
                &self.config.screenshot_dir,
                diagnostics::NO_QUESTIONS,
            )
            .await;
            return Ok(QuizOutcome::Skipped(SkipReason::NoQuestions));
        }
        info!(
            "[测验 #{}] 📝 找到题目: {} 道",
            self.activity.number,
            regions.len()
        );

        let stats = self.answer_all(&regions).await?;
        info!(
            "[测验 #{}] 题目统计: 已作答 {}, 未作答 {}, 总计 {}",
            self.activity.number,
            stats.answered,
            stats.unanswered,
            regions.len()
        );

        // ========== Submitting ==========
        self.transition(QuizState::Submitting);
        self.submit().await?;
        Ok(QuizOutcome::Done)
    }

    async fn has_audio(&self) -> AppResult<bool> {
        match audio_guard::find_audio(self.session).await? {
            Some(selector) => {
                warn!(
                    "[测验 #{}] 🔊 检测到音频 ({})，跳过该测验",
                    self.activity.number, selector
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// 点击"开始/继续答题"，找不到按钮时直接继续
    async fn start_attempt(&self) -> AppResult<()> {
        let candidates = probes::start_probes(&self.config.labels);
        let Some((button, selector)) = probes::first_match(self.session, &candidates).await else {
            warn!(
                "[测验 #{}] ⚠️ 未找到开始按钮，假定已在答题页",
                self.activity.number
            );
            return Ok(());
        };

        info!(
            "[测验 #{}] ▶️ 点击开始按钮 ({})",
            self.activity.number, selector
        );
        if let Err(e) = self.session.click(button).await {
            warn!("普通点击失败 ({})，改用脚本点击", e);
            self.session.force_click(button).await?;
        }
        sleep(self.config.settle_delay()).await;
        Ok(())
    }

    /// 题目区域，按候选选择器顺序取第一组非空结果
    async fn question_regions(&self) -> AppResult<Vec<ElementRef>> {
        for css in QUESTION_REGION_SELECTORS {
            let regions = self.session.find_all(&Selector::css(*css)).await?;
            if !regions.is_empty() {
                return Ok(regions);
            }
        }
        Ok(Vec::new())
    }

    async fn answer_all(&self, regions: &[ElementRef]) -> AppResult<QuestionStats> {
        let title_fragment = self
            .flow
            .extractor()
            .quiz_title_fragment(&self.activity.display_name);
        let mut stats = QuestionStats::default();

        for (i, region) in regions.iter().enumerate() {
            let ctx = QuestionCtx::new(self.activity.number, i + 1, regions.len());
            info!("\n{} {}", ctx, "─".repeat(30));

            match self
                .flow
                .run(self.session, *region, &title_fragment, &ctx)
                .await
            {
                Ok(_) => stats.answered += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!("{} ❌ 题目处理失败: {}", ctx, e);
                    stats.unanswered += 1;
                }
            }

            sleep(self.config.question_pause()).await;
        }

        Ok(stats)
    }

    /// 提交测验：提交按钮 → 确认按钮（如果有）
    async fn submit(&self) -> AppResult<()> {
        let candidates = probes::submit_probes(&self.config.labels);
        let (button, selector) = probes::first_match(self.session, &candidates)
            .await
            .ok_or(SubmissionError::SubmitControlNotFound)?;

        info!(
            "[测验 #{}] 📤 点击提交按钮 ({})",
            self.activity.number, selector
        );
        self.session.scroll_into_view(button).await?;
        if let Err(e) = self.session.click(button).await {
            warn!("普通点击失败 ({})，改用脚本点击", e);
            self.session.force_click(button).await?;
        }
        sleep(self.config.submit_pause()).await;

        let confirm = probes::confirm_probes(&self.config.labels);
        match probes::first_match(self.session, &confirm).await {
            Some((button, _)) => {
                self.session.click(button).await?;
                info!("[测验 #{}] ✅ 已确认提交", self.activity.number);
                sleep(self.config.submit_pause()).await;
            }
            None => info!("[测验 #{}] 没有确认对话框", self.activity.number),
        }
        Ok(())
    }
}

// ========== 日志辅助函数 ==========

fn log_quiz_start(activity: &QuizActivity) {
    info!("\n{}", "=".repeat(60));
    info!(
        "[测验 #{}] 开始处理: {}",
        activity.number,
        truncate_text(&activity.display_name, 60)
    );
    info!("[测验 #{}] ID: {}", activity.number, activity.id);
    info!("{}", "=".repeat(60));
}

fn log_quiz_complete(activity: &QuizActivity, outcome: &QuizOutcome) {
    match outcome {
        QuizOutcome::Done => info!("[测验 #{}] ✅ 测验已提交\n", activity.number),
        QuizOutcome::Skipped(reason) => {
            info!("[测验 #{}] ⏭️ 测验已跳过: {}\n", activity.number, reason)
        }
        QuizOutcome::Failed(reason) => {
            error!("[测验 #{}] ❌ 测验失败: {}\n", activity.number, reason)
        }
    }
}
