//! 图像生成服务 - 业务能力层
//!
//! 只负责"根据源图片和提示词生成一张图"的能力，不关心批次和重试策略
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（如 Gemini 图像模型网关等）
//! - 源图片以 data URL 的形式作为图片内容发送

use std::time::Duration;

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, ImageDetail, ImageUrl,
    },
    Client,
};
use regex::Regex;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::GenerationError;
use crate::infrastructure::{GenerateFuture, ImageGenerator};
use crate::models::{ImageRef, Period, SourceImage};

/// 图像生成服务
///
/// 职责：
/// - 调用模型 API 生成单张图像
/// - 暂时性错误（5xx、限流）在服务内部重试
/// - 主提示词没有产出图像时改用备用提示词
/// - 不出现 Vec<Period>
/// - 不关心任务状态
pub struct LlmImageService {
    client: Client<OpenAIConfig>,
    model_name: String,
    max_attempts: u32,
    retry_delay: Duration,
    extractor: ImageExtractor,
}

impl LlmImageService {
    /// 创建新的图像生成服务
    pub fn new(config: &Config) -> Result<Self> {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Ok(Self {
            client: Client::with_config(openai_config),
            model_name: config.image_model_name.clone(),
            max_attempts: config.generation_max_attempts.max(1),
            retry_delay: Duration::from_millis(config.generation_retry_delay_ms),
            extractor: ImageExtractor::new()?,
        })
    }

    /// 生成图像，必要时改用备用提示词再试一次
    ///
    /// 备用提示词按提示词中出现的年代标签（如 `1970s`）选取，
    /// 依赖 [`Period::prompt`] 的文本包含该标签；找不到年代时直接返回 `NoImage`
    pub async fn generate_image(
        &self,
        source: &SourceImage,
        prompt: &str,
    ) -> Result<ImageRef, GenerationError> {
        match self.generate_with_retry(source, prompt).await {
            Err(GenerationError::NoImage(content)) => match Period::find_in(prompt) {
                Some(period) => {
                    warn!("[年代 {}] 主提示词未返回图像，改用备用提示词", period);
                    self.generate_with_retry(source, &period.fallback_prompt())
                        .await
                }
                None => Err(GenerationError::NoImage(content)),
            },
            other => other,
        }
    }

    /// 暂时性错误时按次数线性退避重试
    async fn generate_with_retry(
        &self,
        source: &SourceImage,
        prompt: &str,
    ) -> Result<ImageRef, GenerationError> {
        let mut attempt = 1;
        loop {
            match self.request_image(source, prompt).await {
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = self.retry_delay * attempt;
                    warn!(
                        "图像生成遇到暂时性错误 (尝试 {}/{}), 等待 {:?} 后重试: {}",
                        attempt, self.max_attempts, delay, e
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// 发送一次生成请求
    async fn request_image(
        &self,
        source: &SourceImage,
        prompt: &str,
    ) -> Result<ImageRef, GenerationError> {
        debug!("调用图像模型 API，模型: {}", self.model_name);

        // 文本 + 源图片
        let content_parts = vec![
            ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: prompt.to_string(),
                },
            ),
            ChatCompletionRequestUserMessageContentPart::ImageUrl(
                ChatCompletionRequestMessageContentPartImage {
                    image_url: ImageUrl {
                        url: source.data_url().to_string(),
                        detail: Some(ImageDetail::Auto),
                    },
                },
            ),
        ];

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
            .build()
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .build()
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("图像模型 API 调用失败: {}", e);
            GenerationError::Request(e.to_string())
        })?;

        debug!("图像模型 API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();

        self.extractor
            .extract(&content)
            .ok_or_else(|| GenerationError::NoImage(crate::utils::truncate_text(content.trim(), 200)))
    }
}

impl ImageGenerator for LlmImageService {
    fn generate<'a>(&'a self, source: &'a SourceImage, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(self.generate_image(source, prompt))
    }
}

/// 从模型返回的文本中提取图像引用
///
/// 依次尝试：data URL、markdown 图片链接、裸图片 URL
struct ImageExtractor {
    patterns: Vec<Regex>,
}

impl ImageExtractor {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            patterns: vec![
                Regex::new(r"data:image/[a-zA-Z0-9.+-]+;base64,[A-Za-z0-9+/=]+")?,
                Regex::new(r"!\[[^\]]*\]\((https?://[^\s)]+)\)")?,
                Regex::new(r#"https?://[^\s"'<>)]+\.(?:png|jpe?g|webp|gif)(?:\?[^\s"'<>)]*)?"#)?,
            ],
        })
    }

    fn extract(&self, content: &str) -> Option<ImageRef> {
        self.patterns.iter().find_map(|re| {
            re.captures(content).map(|caps| {
                let m = caps.get(1).or_else(|| caps.get(0));
                ImageRef::new(m.map(|m| m.as_str()).unwrap_or_default())
            })
        })
    }
}
