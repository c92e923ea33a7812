//! 图像变换客户端 - 基础设施层
//!
//! 只暴露"把一张图片按指令变换成另一张图片"的能力，
//! 不认识分组、画板，也不关心失败后如何兜底。

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::BoxFuture;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, TransformError};
use crate::utils::logging::truncate_text;

/// 变换结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// 外部图像变换能力
///
/// 实现方只需满足 `transform(bytes, mime, instruction) -> ok | fail` 的约定。
pub trait ImageTransformer: Send + Sync {
    fn transform<'a>(
        &'a self,
        bytes: &'a [u8],
        mime_type: &'a str,
        instruction: &'a str,
    ) -> BoxFuture<'a, AppResult<TransformOutput>>;
}

/// 基于 generateContent 接口的图像变换客户端
pub struct GeminiTransformer {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model_name: String,
}

impl GeminiTransformer {
    /// 创建新的变换客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::transform_request_failed(&config.transform_api_base_url, e))?;

        Ok(Self {
            http,
            api_key: config.transform_api_key.clone(),
            api_base_url: config.transform_api_base_url.clone(),
            model_name: config.transform_model_name.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base_url.trim_end_matches('/'),
            self.model_name
        )
    }

    /// 构建请求体：指令文本 + 内联图片
    fn build_request_body(bytes: &[u8], mime_type: &str, instruction: &str) -> JsonValue {
        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": instruction },
                    {
                        "inline_data": {
                            "mime_type": mime_type,
                            "data": STANDARD.encode(bytes)
                        }
                    }
                ]
            }],
            "generationConfig": {
                "responseModalities": ["IMAGE"]
            }
        })
    }

    /// 从响应中提取第一张内联图片
    ///
    /// 同时兼容 `inlineData` / `inline_data` 两种字段写法。
    pub fn extract_image(response: &JsonValue) -> AppResult<TransformOutput> {
        let parts = response
            .get("candidates")
            .and_then(|v| v.as_array())
            .and_then(|candidates| candidates.first())
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .ok_or(AppError::Transform(TransformError::EmptyPayload))?;

        let inline = parts
            .iter()
            .find_map(|part| part.get("inlineData").or_else(|| part.get("inline_data")))
            .ok_or(AppError::Transform(TransformError::EmptyPayload))?;

        let data = inline
            .get("data")
            .and_then(|v| v.as_str())
            .ok_or(AppError::Transform(TransformError::EmptyPayload))?;

        let mime_type = inline
            .get("mimeType")
            .or_else(|| inline.get("mime_type"))
            .and_then(|v| v.as_str())
            .unwrap_or("image/png")
            .to_string();

        let bytes = STANDARD.decode(data).map_err(|e| {
            AppError::Transform(TransformError::MalformedResponse {
                source: Box::new(e),
            })
        })?;

        if bytes.is_empty() {
            return Err(AppError::Transform(TransformError::EmptyPayload));
        }

        Ok(TransformOutput { bytes, mime_type })
    }

    async fn request(
        &self,
        bytes: &[u8],
        mime_type: &str,
        instruction: &str,
    ) -> AppResult<TransformOutput> {
        let endpoint = self.endpoint();
        debug!(
            "调用图像变换服务，模型: {}，图片大小: {} 字节",
            self.model_name,
            bytes.len()
        );

        let body = Self::build_request_body(bytes, mime_type, instruction);

        let response = self
            .http
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("图像变换请求失败: {}", e);
                AppError::transform_request_failed(&endpoint, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Transform(TransformError::BadStatus {
                status: status.as_u16(),
                body: truncate_text(&text, 200),
            }));
        }

        let value: JsonValue = response.json().await.map_err(|e| {
            AppError::Transform(TransformError::MalformedResponse {
                source: Box::new(e),
            })
        })?;

        let output = Self::extract_image(&value)?;
        debug!(
            "图像变换成功，输出 {} ({} 字节)",
            output.mime_type,
            output.bytes.len()
        );
        Ok(output)
    }
}

impl ImageTransformer for GeminiTransformer {
    fn transform<'a>(
        &'a self,
        bytes: &'a [u8],
        mime_type: &'a str,
        instruction: &'a str,
    ) -> BoxFuture<'a, AppResult<TransformOutput>> {
        Box::pin(self.request(bytes, mime_type, instruction))
    }
}
