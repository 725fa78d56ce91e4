//! 控制台交互
//!
//! 菜单和调试暂停都从这里读取用户输入。

use std::io::Write;

use tokio::io::{stdin, AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use crate::error::{AppError, AppResult};

const STDIN: &str = "<stdin>";

type LineSource = Box<dyn AsyncBufRead + Unpin + Send>;

/// 按行读取用户输入（默认为标准输入）
pub struct Console {
    lines: Lines<LineSource>,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(stdin()))
    }

    /// 从任意输入源读取，测试中用来预置输入
    pub fn from_reader(reader: impl AsyncBufRead + Unpin + Send + 'static) -> Self {
        let source: LineSource = Box::new(reader);
        Self {
            lines: source.lines(),
        }
    }

    /// 打印提示并读取一行（已去掉首尾空白）
    ///
    /// 输入流结束时返回 `None`。
    pub async fn ask(&mut self, prompt: &str) -> AppResult<Option<String>> {
        print!("{}", prompt);
        let _ = std::io::stdout().flush();

        let line = self
            .lines
            .next_line()
            .await
            .map_err(|e| AppError::file_read_failed(STDIN, e))?;
        Ok(line.map(|l| l.trim().to_string()))
    }

    /// 是/否确认，只有 `y` / `yes` / `д` / `да` 视为确认
    pub async fn confirm(&mut self, prompt: &str) -> AppResult<bool> {
        Ok(self
            .ask(prompt)
            .await?
            .map(|answer| is_yes(&answer))
            .unwrap_or(false))
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "д" | "да"
    )
}

/// 解析章节编号，必须是正整数
pub fn parse_section(input: &str) -> Option<u32> {
    input.trim().parse::<u32>().ok().filter(|n| *n > 0)
}
