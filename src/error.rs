use thiserror::Error;

/// 应用程序错误类型
///
/// 按失败的影响范围分组：题目级（Oracle / Interpretation）不影响测验，
/// 测验级（Navigation / Submission）不影响章节，只有 Browser 会终止整个运行。
#[derive(Debug, Error)]
pub enum AppError {
    /// 页面或元素导航错误
    #[error("导航错误: {0}")]
    Navigation(#[from] NavigationError),
    /// Oracle 调用错误
    #[error("Oracle错误: {0}")]
    Oracle(#[from] OracleError),
    /// 无法从回复中得到可执行的答案
    #[error("答案解析错误: {0}")]
    Interpretation(#[from] InterpretationError),
    /// 测验提交错误
    #[error("提交错误: {0}")]
    Submission(#[from] SubmissionError),
    /// 浏览器会话错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
}

impl AppError {
    /// 是否为会话级的致命错误（浏览器已不可用）
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Browser(BrowserError::SessionLost { .. }))
    }
}

/// 导航错误
#[derive(Debug, Error)]
pub enum NavigationError {
    /// 页面加载失败
    #[error("导航到 {url} 失败: {source}")]
    PageLoadFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 在超时时间内未找到元素
    #[error("{timeout_secs} 秒内未找到元素: {selector}")]
    ElementNotFound { selector: String, timeout_secs: u64 },
    /// 元素句柄已失效（页面已切换）
    #[error("元素句柄 #{index} 已失效")]
    StaleElement { index: usize },
    /// 课程页面中不存在该章节
    #[error("章节 {section} 不存在")]
    SectionNotFound { section: u32 },
    /// 登录后仍停留在登录页
    #[error("登录失败，当前页面: {url}")]
    LoginRejected { url: String },
}

/// Oracle 调用错误
#[derive(Debug, Error)]
pub enum OracleError {
    /// 网络错误或非 2xx 响应
    #[error("Oracle 请求失败 (模型: {model}): {source}")]
    RequestFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 请求超时
    #[error("Oracle 请求超时 ({timeout_secs} 秒)")]
    Timeout { timeout_secs: u64 },
    /// 返回内容为空
    #[error("Oracle 返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 请求构建失败
    #[error("无法构建 Oracle 请求: {0}")]
    InvalidRequest(String),
}

/// 答案解析错误
#[derive(Debug, Error)]
pub enum InterpretationError {
    /// 回复中没有可用的选项编号或文本
    #[error("回复中没有可执行的答案: {reply:?}")]
    NoActionableAnswer { reply: String },
    /// 题目没有任何作答控件
    #[error("题目没有可作答的控件")]
    NoAnswerTarget,
    /// 选项编号在页面上找不到对应的输入框
    #[error("选项 {position} 在页面上不存在 (共 {available} 个)")]
    PositionUnavailable { position: usize, available: usize },
}

/// 提交错误
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// 找不到提交按钮
    #[error("未找到提交按钮")]
    SubmitControlNotFound,
}

/// 浏览器会话错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 启动浏览器失败
    #[error("启动浏览器失败: {0}")]
    LaunchFailed(String),
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 页面脚本或元素操作失败
    #[error("页面操作失败: {source}")]
    OperationFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 与浏览器的连接已断开
    #[error("浏览器连接已断开: {source}")]
    SessionLost {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 凭据文件格式不正确
    #[error("凭据文件 {path} 损坏或格式不正确")]
    CredentialsMalformed { path: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        use chromiumoxide::error::CdpError;

        if is_session_lost(&err) {
            AppError::Browser(BrowserError::SessionLost {
                source: Box::new(err),
            })
        } else {
            AppError::Browser(BrowserError::OperationFailed {
                source: Box::new(err),
            })
        }
    }
}

/// 与浏览器的 CDP 连接是否已断开
pub fn is_session_lost(err: &chromiumoxide::error::CdpError) -> bool {
    use chromiumoxide::error::CdpError;
    matches!(err, CdpError::Ws(_) | CdpError::NoResponse)
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建页面加载错误
    pub fn page_load_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Navigation(NavigationError::PageLoadFailed {
            url: url.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
