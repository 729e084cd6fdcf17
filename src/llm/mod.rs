//! LLM 模块
//!
//! 统一的聊天补全抽象，支持 Groq（OpenAI 兼容格式）和 Gemini。

mod format;
mod gemini;
mod groq;
mod provider;
mod types;

pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
pub use provider::{ChatCompletionProvider, ProviderKind, ProviderRegistry};
pub use types::*;

#[cfg(test)]
pub(crate) use provider::testing;
