//! 章节处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责资源管理和章节级别的调度。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：日志文件、启动浏览器、登录
//! 2. **章节扫描**：列出测验并得到待做列表
//! 3. **顺序处理**：逐个委托 quiz_resolver 处理测验
//! 4. **资源管理**：持有浏览器和页面会话，退出时统一释放
//! 5. **章节统计**：汇总并写入日志文件

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::browser::{self, BrowserHandle};
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{DocumentSession, PageSession};
use crate::models::{QuizActivity, SectionSummary};
use crate::orchestrator::quiz_resolver;
use crate::services::{auth, section_scanner, Credentials, OracleClient};
use crate::utils::{logging, Console};
use crate::workflow::QuestionFlow;

/// 章节运行方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// 只列出测验，之后可选择处理下一个待做测验
    Inspect,
    /// 自动处理所有待做测验
    AutoSolve,
    /// 自动处理，每个测验开始前等待回车
    Debug,
}

/// 按章节编号处理测验
///
/// 菜单只依赖这一能力。
#[async_trait(?Send)]
pub trait SectionRunner {
    async fn run_section(
        &self,
        section: u32,
        mode: RunMode,
        console: &mut Console,
    ) -> AppResult<SectionSummary>;
}

/// 应用主结构
pub struct App {
    config: Config,
    browser: BrowserHandle,
    session: PageSession,
    flow: QuestionFlow,
}

impl App {
    /// 初始化应用：日志文件 → 浏览器 → 登录
    pub async fn initialize(config: Config, credentials: Credentials) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)
            .await
            .context("初始化日志文件失败")?;
        logging::log_startup(&config);

        let (browser, page) = browser::open(&config).await.context("打开浏览器失败")?;
        let session = PageSession::new(page);

        if let Err(e) = auth::login(&session, &config, &credentials).await {
            browser.close().await;
            return Err(e).context("登录失败");
        }

        let flow = QuestionFlow::new(&config, Arc::new(OracleClient::new(&config)));

        Ok(Self {
            config,
            browser,
            session,
            flow,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 释放浏览器
    pub async fn shutdown(self) {
        info!("\n🛑 正在退出...");
        self.browser.close().await;
    }
}

#[async_trait(?Send)]
impl SectionRunner for App {
    /// 处理一个章节
    async fn run_section(
        &self,
        section: u32,
        mode: RunMode,
        console: &mut Console,
    ) -> AppResult<SectionSummary> {
        let activities = section_scanner::scan(&self.session, &self.config, section).await?;
        let worklist = section_scanner::pending(&activities, self.config.solve_unknown);
        let mut summary = SectionSummary::new(section, activities.len(), worklist.len());
        info!("\n⏳ 待做测验: {} / {}", worklist.len(), activities.len());

        match mode {
            RunMode::Inspect => {
                if let Some(next) = worklist.first() {
                    let prompt = format!("\n处理下一个待做测验 \"{}\"? (y/n): ", next.display_name);
                    if console.confirm(&prompt).await? {
                        process_worklist(
                            &self.session,
                            &self.flow,
                            &self.config,
                            std::slice::from_ref(next),
                            &mut summary,
                            None,
                        )
                        .await?;
                    }
                } else {
                    info!("✅ 本章节没有待做测验");
                }
            }
            RunMode::AutoSolve => {
                process_worklist(
                    &self.session,
                    &self.flow,
                    &self.config,
                    &worklist,
                    &mut summary,
                    None,
                )
                .await?;
            }
            RunMode::Debug => {
                process_worklist(
                    &self.session,
                    &self.flow,
                    &self.config,
                    &worklist,
                    &mut summary,
                    Some(console),
                )
                .await?;
            }
        }

        logging::print_section_summary(&summary, &self.config.output_log_file);
        if let Err(e) = logging::append_section_summary(&self.config.output_log_file, &summary).await
        {
            warn!("⚠️ 写入日志文件失败: {}", e);
        }

        Ok(summary)
    }
}

/// 按顺序处理待做列表
///
/// 单个测验的失败只计入统计；会话级错误立即返回。
/// `debug_console` 存在时，每个测验开始前等待回车。
pub async fn process_worklist(
    session: &dyn DocumentSession,
    flow: &QuestionFlow,
    config: &Config,
    worklist: &[QuizActivity],
    summary: &mut SectionSummary,
    mut debug_console: Option<&mut Console>,
) -> AppResult<()> {
    for (i, activity) in worklist.iter().enumerate() {
        info!(
            "\n📦 测验 {}/{}: {}",
            i + 1,
            worklist.len(),
            logging::truncate_text(&activity.display_name, 60)
        );

        if let Some(console) = debug_console.as_deref_mut() {
            let answer = console.ask("🐞 按回车开始该测验，输入 s 跳过: ").await?;
            if matches!(answer.as_deref(), Some("s") | Some("S")) {
                info!("⏭️ 已手动跳过");
                continue;
            }
        }

        match quiz_resolver::resolve_quiz(session, flow, config, activity).await {
            Ok(outcome) => summary.record(&outcome),
            Err(e) => {
                error!("❌ 会话错误，停止处理章节 {}: {}", summary.section, e);
                return Err(e);
            }
        }
    }
    Ok(())
}
