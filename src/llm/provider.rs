//! LLM 提供方抽象与注册表

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use super::gemini::GeminiProvider;
use super::groq::GroqProvider;
use super::types::{ChatMessage, ChatOptions, LlmError};
use crate::config::AppConfig;

/// 提供方类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProviderKind {
    Groq,
    Gemini,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Groq, ProviderKind::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "GROQ",
            ProviderKind::Gemini => "GEMINI",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    /// 大小写不敏感，未知名称直接报错
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GROQ" => Ok(ProviderKind::Groq),
            "GEMINI" => Ok(ProviderKind::Gemini),
            other => Err(LlmError::ConfigError(format!(
                "Unknown LLM provider: '{}'",
                other
            ))),
        }
    }
}

/// 聊天补全能力
#[async_trait]
pub trait ChatCompletionProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// 未指定模型时使用的默认模型
    fn default_model(&self) -> &str;

    /// 发送一次聊天补全请求，返回回复文本（不重试）
    async fn send_chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, LlmError>;

    /// 列出可用模型
    async fn list_models(&self) -> Result<Vec<String>, LlmError>;
}

/// 提供方注册表
///
/// 启动时根据配置构建一次，随后注入各服务。
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn ChatCompletionProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 根据配置构建，未配置 API Key 的提供方不注册
    pub fn from_config(config: &AppConfig) -> Result<Self, LlmError> {
        let mut registry = Self::new();

        if config.groq.is_configured() {
            registry = registry.with_provider(Arc::new(GroqProvider::new(&config.groq)?));
        } else {
            warn!("GROQ_API_KEY is not set, Groq provider disabled");
        }

        if config.gemini.is_configured() {
            registry = registry.with_provider(Arc::new(GeminiProvider::new(&config.gemini)?));
        } else {
            warn!("GEMINI_API_KEY is not set, Gemini provider disabled");
        }

        info!("LLM providers ready: {:?}", registry.kinds());
        Ok(registry)
    }

    /// 注册提供方，同类型覆盖
    pub fn with_provider(mut self, provider: Arc<dyn ChatCompletionProvider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    /// 获取提供方，未配置时报错
    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn ChatCompletionProvider>, LlmError> {
        self.providers.get(&kind).cloned().ok_or_else(|| {
            LlmError::ConfigError(format!("LLM provider {} is not configured", kind))
        })
    }

    /// 已注册的提供方（排序）
    pub fn kinds(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<ProviderKind> = self.providers.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// 汇总所有提供方的模型列表
    ///
    /// 未配置或调用失败的提供方对应空列表。
    pub async fn available_models(&self) -> BTreeMap<ProviderKind, Vec<String>> {
        let mut result = BTreeMap::new();

        for kind in ProviderKind::ALL {
            let models = match self.providers.get(&kind) {
                Some(provider) => match provider.list_models().await {
                    Ok(models) => models,
                    Err(e) => {
                        warn!("Failed to list models for {}: {}", kind, e);
                        Vec::new()
                    }
                },
                None => Vec::new(),
            };
            result.insert(kind, models);
        }

        result
    }
}
