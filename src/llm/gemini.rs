//! Gemini generateContent 实现

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, error, info};

use super::format::{build_gemini_endpoint, build_gemini_models_endpoint};
use super::groq::truncate;
use super::provider::{ChatCompletionProvider, ProviderKind};
use super::types::{ChatMessage, ChatOptions, LlmError};
use crate::config::ProviderSettings;

/// Gemini 请求载荷
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    generation_config: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize, Debug)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Deserialize, Debug)]
struct ModelEntry {
    name: String,
}

/// Gemini 提供方
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl GeminiProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self, LlmError> {
        if settings.api_key.is_empty() {
            return Err(LlmError::ConfigError("Gemini API Key is required".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(LlmError::HttpError)?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.clone(),
            default_model: settings.default_model.clone(),
        })
    }

    fn build_request(messages: &[ChatMessage], options: &ChatOptions) -> GenerateRequest {
        // 分离系统消息，多条时按顺序拼接
        let mut system_parts: Vec<Part> = Vec::new();
        let mut contents: Vec<Content> = Vec::new();

        for msg in messages {
            let part = Part {
                text: Some(msg.content.clone()),
            };
            match msg.role.as_str() {
                "system" => system_parts.push(part),
                "assistant" => contents.push(Content {
                    role: Some("model".to_string()),
                    parts: vec![part],
                }),
                _ => contents.push(Content {
                    role: Some("user".to_string()),
                    parts: vec![part],
                }),
            }
        }

        let mut generation_config: Map<String, Value> = options
            .extra()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if let Some(temperature) = options.temperature() {
            generation_config.insert("temperature".to_string(), temperature.into());
        }
        if let Some(max_tokens) = options.max_tokens() {
            generation_config.insert("maxOutputTokens".to_string(), max_tokens.into());
        }

        GenerateRequest {
            contents,
            system_instruction: (!system_parts.is_empty()).then(|| Content {
                role: None,
                parts: system_parts,
            }),
            generation_config,
        }
    }
}

#[async_trait]
impl ChatCompletionProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
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
        let endpoint = build_gemini_endpoint(&self.base_url, model);
        let payload = Self::build_request(messages, options);

        info!("Gemini request: model={}, messages={}", model, messages.len());
        debug!("Gemini API request: endpoint={}", endpoint);

        let response = self
            .client
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "Gemini API error: status={}, body={}",
                status_code,
                truncate(&error_text, 500)
            );
            return Err(LlmError::ApiError {
                status: status_code,
                message: error_text,
            });
        }

        let body: GenerateResponse = response.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        debug!("Gemini response length: {}", text.len());
        Ok(text)
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let endpoint = build_gemini_models_endpoint(&self.base_url);
        let response = self
            .client
            .get(&endpoint)
            .header("x-goog-api-key", &self.api_key)
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
        Ok(list
            .models
            .into_iter()
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn settings(base_url: String) -> ProviderSettings {
        ProviderSettings {
            api_key: "g-key".to_string(),
            base_url,
            default_model: "gemini-1.5-flash".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_request_shape() {
        let messages = [
            ChatMessage::system("be brief"),
            ChatMessage::user("q1"),
            ChatMessage::assistant("a1"),
            ChatMessage::user("q2"),
        ];
        let options = ChatOptions::new().with_temperature(0.1).with_max_tokens(2000);
        let value = serde_json::to_value(GeminiProvider::build_request(&messages, &options)).unwrap();

        assert_eq!(
            value,
            json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "q1"}]},
                    {"role": "model", "parts": [{"text": "a1"}]},
                    {"role": "user", "parts": [{"text": "q2"}]}
                ],
                "systemInstruction": {"parts": [{"text": "be brief"}]},
                "generationConfig": {"temperature": 0.1, "maxOutputTokens": 2000}
            })
        );
    }

    #[tokio::test]
    async fn test_generate_content_contract() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
            .match_header("x-goog-api-key", "g-key")
            .match_body(Matcher::PartialJson(json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"parts":[{"text":"Hello"},{"text":" world"}],"role":"model"},"finishReason":"STOP"}]}"#,
            )
            .create_async()
            .await;

        let provider = GeminiProvider::new(&settings(server.url())).unwrap();
        let reply = provider
            .send_chat_completion("gemini-1.5-flash", &[ChatMessage::user("hello")], &ChatOptions::new())
            .await
            .unwrap();

        assert_eq!(reply, "Hello world");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_and_empty_candidates() {
        let mut server = Server::new_async().await;
        let _bad = server
            .mock("POST", "/v1beta/models/bad:generateContent")
            .with_status(400)
            .with_body("invalid argument")
            .create_async()
            .await;
        let _empty = server
            .mock("POST", "/v1beta/models/empty:generateContent")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;

        let provider = GeminiProvider::new(&settings(server.url())).unwrap();
        let messages = [ChatMessage::user("hi")];

        let err = provider
            .send_chat_completion("bad", &messages, &ChatOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ApiError { status: 400, .. }));

        let err = provider
            .send_chat_completion("empty", &messages, &ChatOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_list_models_strips_prefix() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1beta/models")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"models":[{"name":"models/gemini-1.5-flash"},{"name":"models/gemini-1.5-pro"}]}"#)
            .create_async()
            .await;

        let provider = GeminiProvider::new(&settings(server.url())).unwrap();
        assert_eq!(
            provider.list_models().await.unwrap(),
            vec!["gemini-1.5-flash", "gemini-1.5-pro"]
        );
    }
}
