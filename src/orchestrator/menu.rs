//! 交互菜单 - 编排层
//!
//! 1 查看章节，2 自动作答，3 退出；隐藏选项 4 为带暂停的调试模式。

use tracing::{error, warn};

use crate::error::AppResult;
use crate::orchestrator::section_runner::{RunMode, SectionRunner};
use crate::utils::console::{parse_section, Console};

/// 菜单选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Run(RunMode),
    Exit,
}

/// 解析菜单输入，无效输入返回 `None`
pub fn parse_choice(input: &str) -> Option<MenuChoice> {
    match input.trim() {
        "1" => Some(MenuChoice::Run(RunMode::Inspect)),
        "2" => Some(MenuChoice::Run(RunMode::AutoSolve)),
        "3" => Some(MenuChoice::Exit),
        "4" => Some(MenuChoice::Run(RunMode::Debug)),
        _ => None,
    }
}

fn print_menu() {
    println!("\n{}", "=".repeat(40));
    println!("1. 查看章节中的测验");
    println!("2. 自动完成章节中的测验");
    println!("3. 退出");
    println!("{}", "=".repeat(40));
}

/// 菜单主循环
///
/// 章节级错误只记日志，回到菜单；会话级错误结束循环并返回。
pub async fn run(runner: &impl SectionRunner, console: &mut Console) -> AppResult<()> {
    loop {
        print_menu();
        let Some(input) = console.ask("请选择: ").await? else {
            return Ok(());
        };

        let mode = match parse_choice(&input) {
            Some(MenuChoice::Run(mode)) => mode,
            Some(MenuChoice::Exit) => return Ok(()),
            None => {
                warn!("⚠️ 无效的选择: {}", input);
                continue;
            }
        };

        let Some(input) = console.ask("章节编号: ").await? else {
            return Ok(());
        };
        let Some(section) = parse_section(&input) else {
            warn!("⚠️ 章节编号必须是正整数: {}", input);
            continue;
        };

        match runner.run_section(section, mode, console).await {
            Ok(_) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => error!("❌ 章节 {} 处理失败: {}", section, e),
        }
    }
}
