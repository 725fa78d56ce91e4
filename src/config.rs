use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ConfigError};

/// 默认配置文件名（可通过 `CONFIG_FILE` 环境变量覆盖）
pub const DEFAULT_CONFIG_FILE: &str = "quiz_autosolver.toml";

/// 界面文字（两种语言）
///
/// 所有按钮、完成状态的识别都基于这里的子串，页面换语言时只需改配置。
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LabelSet {
    /// "开始答题" 按钮文字
    pub start: Vec<String>,
    /// "继续上次答题" 按钮文字
    pub resume: Vec<String>,
    /// "结束答题" 按钮文字
    pub finish: Vec<String>,
    /// 二次确认提交按钮文字
    pub confirm: Vec<String>,
    /// 登录按钮文字
    pub login: Vec<String>,
    /// 弹窗 "接受" 按钮文字
    pub accept_popup: Vec<String>,
    /// 完成图标 src 中表示 "已完成" 的子串
    pub done_icon_src: Vec<String>,
    /// 完成图标 alt 中表示 "已完成" 的子串（小写比较）
    pub done_icon_alt: Vec<String>,
    /// 完成图标 src 中表示 "未完成" 的子串
    pub pending_icon_src: Vec<String>,
    /// 完成图标 alt 中表示 "未完成" 的子串（小写比较）
    pub pending_icon_alt: Vec<String>,
}

impl Default for LabelSet {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            start: owned(&["Начать", "Attempt"]),
            resume: owned(&["Продолжить", "Continue"]),
            finish: owned(&["Finish", "Завершить"]),
            confirm: owned(&["Submit", "Отправить"]),
            login: owned(&["Войти", "Log in"]),
            accept_popup: owned(&["Accept", "Принять"]),
            done_icon_src: owned(&["completion-auto-pass"]),
            done_icon_alt: owned(&["pass"]),
            pending_icon_src: owned(&["completion-auto-n"]),
            pending_icon_alt: owned(&["not completed"]),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 登录页地址
    pub site_url: String,
    /// 课程页地址
    pub course_url: String,
    /// 凭据文件（两行：用户名、密码）
    pub credentials_file: String,
    /// 已启动浏览器的调试端口；为空时自行启动浏览器
    pub browser_debug_port: Option<u16>,
    /// 自行启动时是否使用无头模式
    pub headless: bool,
    /// 浏览器可执行文件路径；为空时自动查找
    pub chrome_executable: Option<String>,
    /// 是否显示详细日志（包括发送给 Oracle 的完整提示词）
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 出错时页面截图的保存目录
    pub screenshot_dir: String,
    // --- Oracle 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub oracle_timeout_secs: u64,
    pub oracle_temperature: f32,
    pub oracle_max_tokens: u32,
    // --- 页面节奏 ---
    /// 等待元素出现的超时时间
    pub wait_timeout_secs: u64,
    /// 页面加载后的等待时间
    pub settle_delay_ms: u64,
    /// 每道题作答后的等待时间
    pub question_pause_ms: u64,
    /// 点击提交后的等待时间
    pub submit_pause_ms: u64,
    /// 是否把状态未知的测验也放进待做列表
    pub solve_unknown: bool,
    /// 界面文字
    pub labels: LabelSet,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_url: "https://esdo.ssuwt.ru/login/index.php".to_string(),
            course_url: "https://esdo.ssuwt.ru/course/view.php?id=1105".to_string(),
            credentials_file: "credentials.txt".to_string(),
            browser_debug_port: None,
            headless: false,
            chrome_executable: None,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            screenshot_dir: ".".to_string(),
            llm_api_key: "lm-studio".to_string(),
            llm_api_base_url: "http://localhost:1234/v1".to_string(),
            llm_model_name: "google/gemma-3-4b".to_string(),
            oracle_timeout_secs: 60,
            oracle_temperature: 0.3,
            oracle_max_tokens: 500,
            wait_timeout_secs: 15,
            settle_delay_ms: 3000,
            question_pause_ms: 1000,
            submit_pause_ms: 2000,
            solve_unknown: true,
            labels: LabelSet::default(),
        }
    }
}

impl Config {
    /// 加载配置：默认值 → TOML 文件（可选）→ 环境变量
    pub fn load() -> AppResult<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let base = if Path::new(&path).exists() {
            Self::from_toml_file(&path)?
        } else {
            Self::default()
        };
        base.with_env(|name| std::env::var(name).ok())
    }

    /// 从 TOML 文件读取配置，缺失字段使用默认值
    pub fn from_toml_file(path: &str) -> AppResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| AppError::file_read_failed(path, e))?;
        Self::from_toml_str(&content, path)
    }

    fn from_toml_str(content: &str, path: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|source| {
            ConfigError::TomlParseFailed {
                path: path.to_string(),
                source,
            }
            .into()
        })
    }

    /// 用环境变量覆盖配置
    ///
    /// `lookup` 按变量名返回值，方便测试时注入。
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        if let Some(v) = lookup("SITE_URL") {
            self.site_url = v;
        }
        if let Some(v) = lookup("COURSE_URL") {
            self.course_url = v;
        }
        if let Some(v) = lookup("CREDENTIALS_FILE") {
            self.credentials_file = v;
        }
        if let Some(v) = parse_var::<u16>(&lookup, "BROWSER_DEBUG_PORT", "u16")? {
            self.browser_debug_port = Some(v);
        }
        if let Some(v) = parse_var(&lookup, "HEADLESS", "bool")? {
            self.headless = v;
        }
        if let Some(v) = lookup("CHROME_EXECUTABLE") {
            self.chrome_executable = Some(v);
        }
        if let Some(v) = parse_var(&lookup, "VERBOSE_LOGGING", "bool")? {
            self.verbose_logging = v;
        }
        if let Some(v) = lookup("OUTPUT_LOG_FILE") {
            self.output_log_file = v;
        }
        if let Some(v) = lookup("SCREENSHOT_DIR") {
            self.screenshot_dir = v;
        }
        if let Some(v) = lookup("LLM_API_KEY") {
            self.llm_api_key = v;
        }
        if let Some(v) = lookup("LLM_API_BASE_URL") {
            self.llm_api_base_url = v;
        }
        if let Some(v) = lookup("LLM_MODEL_NAME") {
            self.llm_model_name = v;
        }
        if let Some(v) = parse_var(&lookup, "ORACLE_TIMEOUT_SECS", "u64")? {
            self.oracle_timeout_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "WAIT_TIMEOUT_SECS", "u64")? {
            self.wait_timeout_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "SOLVE_UNKNOWN", "bool")? {
            self.solve_unknown = v;
        }
        Ok(self)
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn question_pause(&self) -> Duration {
        Duration::from_millis(self.question_pause_ms)
    }

    pub fn submit_pause(&self) -> Duration {
        Duration::from_millis(self.submit_pause_ms)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var_name: &str,
    expected_type: &str,
) -> AppResult<Option<T>> {
    match lookup(var_name) {
        None => Ok(None),
        Some(value) => value.trim().parse().map(Some).map_err(|_| {
            ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }
            .into()
        }),
    }
}
