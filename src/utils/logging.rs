//! 日志工具模块
//!
//! 控制台日志初始化，以及运行日志文件的写入。

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::SectionSummary;

/// 初始化 tracing
///
/// `RUST_LOG` 优先；未设置时默认 `info`，`verbose` 时为 `debug`。
/// 重复调用是安全的。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件（覆盖旧内容）
pub async fn init_log_file(log_file_path: &str) -> AppResult<()> {
    let log_header = format!(
        "{}\n测验处理日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .await
        .map_err(|e| AppError::file_write_failed(log_file_path, e))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 测验自动作答模式");
    info!("🌐 站点: {}", config.site_url);
    info!("📖 课程: {}", config.course_url);
    info!("🤖 模型: {} @ {}", config.llm_model_name, config.llm_api_base_url);
    match config.browser_debug_port {
        Some(port) => info!("🔌 连接已有浏览器，端口: {}", port),
        None => info!("🖥️ 启动新浏览器 (headless: {})", config.headless),
    }
    info!("{}", "=".repeat(60));
}

fn format_summary(summary: &SectionSummary) -> String {
    format!(
        "[{}] 章节 {}: 共 {} 个测验, 待做 {}, 完成 {}, 跳过 {}, 失败 {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        summary.section,
        summary.listed,
        summary.pending,
        summary.done,
        summary.skipped,
        summary.failed
    )
}

/// 把章节统计追加到日志文件
pub async fn append_section_summary(log_file_path: &str, summary: &SectionSummary) -> AppResult<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .await
        .map_err(|e| AppError::file_write_failed(log_file_path, e))?;

    file.write_all(format_summary(summary).as_bytes())
        .await
        .map_err(|e| AppError::file_write_failed(log_file_path, e))?;
    // tokio 的文件写入在后台线程完成，必须 flush 才能保证落盘
    file.flush()
        .await
        .map_err(|e| AppError::file_write_failed(log_file_path, e))?;
    Ok(())
}

/// 打印章节统计
pub fn print_section_summary(summary: &SectionSummary, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 章节 {} 处理完成统计", summary.section);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📝 测验总数: {}", summary.listed);
    info!("⏳ 待做: {}", summary.pending);
    info!("✅ 完成: {}", summary.done);
    info!("⏭️ 跳过: {}", summary.skipped);
    info!("❌ 失败: {}", summary.failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_by_chars() {
        assert_eq!(truncate_text("Тест по грамматике", 4), "Тест...");
        assert_eq!(truncate_text("short", 10), "short");
    }

    #[tokio::test]
    async fn summary_is_appended_after_header() {
        let path = std::env::temp_dir().join(format!("quiz_log_{}.txt", std::process::id()));
        let path = path.to_string_lossy().to_string();

        init_log_file(&path).await.unwrap();
        let mut summary = SectionSummary::new(4, 6, 2);
        summary.done = 2;
        append_section_summary(&path, &summary).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
        assert!(content.contains("章节 4: 共 6 个测验, 待做 2, 完成 2, 跳过 0, 失败 0"));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn consecutive_summaries_are_all_on_disk() {
        let path = std::env::temp_dir().join(format!("quiz_log_seq_{}.txt", std::process::id()));
        let path = path.to_string_lossy().to_string();

        init_log_file(&path).await.unwrap();
        for section in 1..=5 {
            append_section_summary(&path, &SectionSummary::new(section, 3, 1))
                .await
                .unwrap();
            // 每次追加后立即读取，不能丢失刚写入的行
            let content = std::fs::read_to_string(&path).unwrap();
            assert_eq!(content.matches("个测验").count(), section as usize);
        }

        let _ = std::fs::remove_file(&path);
    }
}
