//! 凭据存储 - 业务能力层
//!
//! 本地明文文件，两行：用户名、密码。

use std::fmt;
use std::path::Path;

use tokio::fs;
use tracing::{info, warn};

use crate::error::{AppError, AppResult, ConfigError};
use crate::utils::Console;

/// 登录凭据
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    /// 解析文件内容，至少两行
    pub fn parse(content: &str, path: &str) -> AppResult<Self> {
        let mut lines = content.lines().map(str::trim);
        match (lines.next(), lines.next()) {
            (Some(username), Some(password)) => Ok(Self {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => Err(ConfigError::CredentialsMalformed {
                path: path.to_string(),
            }
            .into()),
        }
    }

    /// 从文件读取凭据
    pub async fn load(path: &str) -> AppResult<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| AppError::file_read_failed(path, e))?;
        Self::parse(&content, path)
    }

    /// 写入凭据文件
    pub async fn save(&self, path: &str) -> AppResult<()> {
        fs::write(path, format!("{}\n{}\n", self.username, self.password))
            .await
            .map_err(|e| AppError::file_write_failed(path, e))?;
        info!("✅ 凭据文件已创建: {}", path);
        Ok(())
    }

    pub fn exists(path: &str) -> bool {
        Path::new(path).is_file()
    }
}

/// 读取凭据；文件不存在时在控制台询问并保存
pub async fn load_or_bootstrap(path: &str, console: &mut Console) -> AppResult<Credentials> {
    if Credentials::exists(path) {
        return Credentials::load(path).await;
    }

    warn!("⚠️ 未找到凭据文件: {}", path);
    let malformed = || ConfigError::CredentialsMalformed {
        path: path.to_string(),
    };

    let username = console
        .ask("用户名: ")
        .await?
        .filter(|s| !s.is_empty())
        .ok_or_else(malformed)?;
    let password = console
        .ask("密码: ")
        .await?
        .filter(|s| !s.is_empty())
        .ok_or_else(malformed)?;

    let credentials = Credentials { username, password };
    credentials.save(path).await?;
    Ok(credentials)
}
