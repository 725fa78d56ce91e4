//! Oracle 服务 - 业务能力层
//!
//! 只负责"把一道题发给 Oracle 并拿回原始回复"，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（LM Studio、Ollama、vLLM 等）
//! - 图片以 data URI 内联

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, ImageDetail, ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::OracleError;
use crate::models::MediaBlob;

/// 固定的系统指令：只要答案，不要解释
pub const SYSTEM_PROMPT: &str = "You are solving English tests. Follow the algorithm strictly:

1) If multiple choice answers are given:
- Determine which answer is correct in meaning.
- Return ONLY the answer number, without words or comments.
- No explanations.
- If there are multiple choices (multiple choice), return the numbers separated by commas, for example: 1, 3, 4

2) If a word or phrase is required:
- Answer in English only.
- Minimum length.
- No quotation marks, no final period.

3) Never add unnecessary phrases.
4) Never retell the question.
5) DO NOT use languages other than English.";

/// Oracle 能力
///
/// 失败只影响当前这道题。
#[async_trait]
pub trait Oracle: Send + Sync {
    /// 发送题目，返回原始回复（已去掉首尾空白）
    async fn query(&self, prompt: &str, media: &[MediaBlob]) -> Result<String, OracleError>;
}

/// 基于 OpenAI 兼容接口的 Oracle 客户端
///
/// 职责：
/// - 构建 system + user 两条消息的请求
/// - 限时等待回复，不重试
/// - 不关心题型和作答
pub struct OracleClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl OracleClient {
    /// 创建新的 Oracle 客户端
    ///
    /// 关闭 async-openai 自带的退避重试：5xx / 429 直接作为失败返回。
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let no_retry = ExponentialBackoff {
            max_elapsed_time: Some(Duration::ZERO),
            ..Default::default()
        };

        Self {
            client: Client::with_config(openai_config).with_backoff(no_retry),
            model_name: config.llm_model_name.clone(),
            temperature: config.oracle_temperature,
            max_tokens: config.oracle_max_tokens,
            timeout: config.oracle_timeout(),
        }
    }

    /// 构建请求：没有图片时 user 内容是纯文本，有图片时是文本 + 图片数组
    pub fn build_request(
        &self,
        prompt: &str,
        media: &[MediaBlob],
    ) -> Result<CreateChatCompletionRequest, OracleError> {
        let invalid = |e: async_openai::error::OpenAIError| OracleError::InvalidRequest(e.to_string());

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_PROMPT)
            .build()
            .map_err(invalid)?;

        let user_msg = if media.is_empty() {
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(invalid)?
        } else {
            let mut content_parts: Vec<ChatCompletionRequestUserMessageContentPart> =
                Vec::with_capacity(media.len() + 1);

            content_parts.push(ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: prompt.to_string(),
                },
            ));

            for blob in media {
                content_parts.push(ChatCompletionRequestUserMessageContentPart::ImageUrl(
                    ChatCompletionRequestMessageContentPartImage {
                        image_url: ImageUrl {
                            url: blob.to_data_uri(),
                            detail: Some(ImageDetail::Auto),
                        },
                    },
                ));
            }

            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
                .build()
                .map_err(invalid)?
        };

        CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(invalid)
    }
}

#[async_trait]
impl Oracle for OracleClient {
    async fn query(&self, prompt: &str, media: &[MediaBlob]) -> Result<String, OracleError> {
        debug!("调用 Oracle，模型: {}", self.model_name);
        debug!("提示词长度: {} 字符, 图片 {} 张", prompt.len(), media.len());

        let request = self.build_request(prompt, media)?;

        info!("🤖 正在向 Oracle 发送请求...");
        let chat = self.client.chat();
        let call = chat.create(request);
        let response =
            match tokio::time::timeout(self.timeout, call).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    warn!("Oracle 调用失败: {}", e);
                    return Err(OracleError::RequestFailed {
                        model: self.model_name.clone(),
                        source: Box::new(e),
                    });
                }
                Err(_) => {
                    warn!("Oracle 调用超时 ({} 秒)", self.timeout.as_secs());
                    return Err(OracleError::Timeout {
                        timeout_secs: self.timeout.as_secs(),
                    });
                }
            };

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| OracleError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        info!("✅ 收到回复: {}", content);
        Ok(content)
    }
}
