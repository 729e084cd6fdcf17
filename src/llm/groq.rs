//! Groq（OpenAI 兼容 Chat Completions）实现

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, error, info};

use super::format::{build_openai_endpoint, build_openai_models_endpoint};
use super::provider::{ChatCompletionProvider, ProviderKind};
use super::types::{ChatMessage, ChatOptions, LlmError};
use crate::config::ProviderSettings;

/// 非流式响应
#[derive(Deserialize, Debug)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize, Debug)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Deserialize, Debug)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize, Debug)]
struct ModelEntry {
    id: String,
}

/// Groq 提供方
pub struct GroqProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl GroqProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self, LlmError> {
        if settings.api_key.is_empty() {
            return Err(LlmError::ConfigError("Groq API Key is required".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(LlmError::HttpError)?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.clone(),
            default_model: settings.default_model.clone(),
        })
    }

    /// 请求体：全部选项平铺在顶层，model 与 messages 不可被选项覆盖
    fn build_payload(model: &str, messages: &[ChatMessage], options: &ChatOptions) -> Result<Value, LlmError> {
        let mut payload: Map<String, Value> = options.as_map().clone();
        payload.insert("model".to_string(), Value::String(model.to_string()));
        payload.insert("messages".to_string(), serde_json::to_value(messages)?);
        Ok(Value::Object(payload))
    }
}

#[async_trait]
impl ChatCompletionProvider for GroqProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Groq
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn send_chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, LlmError> {
        let endpoint = build_openai_endpoint(&self.base_url);
        let payload = Self::build_payload(model, messages, options)?;

        info!("Groq request: model={}, messages={}", model, messages.len());
        debug!("Groq API request: endpoint={}", endpoint);

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "Groq API error: status={}, body={}",
                status_code,
                truncate(&error_text, 500)
            );
            return Err(LlmError::ApiError {
                status: status_code,
                message: error_text,
            });
        }

        let body: CompletionResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or(LlmError::EmptyResponse)?;

        debug!("Groq response length: {}", content.len());
        Ok(content)
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let endpoint = build_openai_models_endpoint(&self.base_url);
        let response = self
            .client
            .get(&endpoint)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let list: ModelList = response.json().await?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}

/// 按字符边界截断，用于日志
pub(crate) fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
