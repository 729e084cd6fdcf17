//! LLM 类型定义

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 聊天消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// 角色：system, user, assistant
    pub role: String,
    /// 消息内容
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// 聊天选项
///
/// 松散的键值集合。`temperature` 与 `max_tokens` 由各后端识别，
/// 其余键原样透传给后端。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatOptions(Map<String, Value>);

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置任意选项
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn with_temperature(self, temperature: f64) -> Self {
        self.with("temperature", temperature)
    }

    pub fn with_max_tokens(self, max_tokens: u32) -> Self {
        self.with("max_tokens", max_tokens)
    }

    pub fn temperature(&self) -> Option<f64> {
        self.0.get("temperature").and_then(Value::as_f64)
    }

    pub fn max_tokens(&self) -> Option<u64> {
        self.0.get("max_tokens").and_then(Value::as_u64)
    }

    /// 除 temperature / max_tokens 外的其余选项
    pub fn extra(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0
            .iter()
            .filter(|(k, _)| k.as_str() != "temperature" && k.as_str() != "max_tokens")
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// LLM 错误类型
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// HTTP 请求错误
    #[error("HTTP 请求失败: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API 返回错误
    #[error("API 错误 ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// 响应中没有可用文本
    #[error("响应为空")]
    EmptyResponse,

    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// JSON 解析错误
    #[error("JSON 解析失败: {0}")]
    JsonError(#[from] serde_json::Error),
}
