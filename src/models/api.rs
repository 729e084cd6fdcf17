//! REST API 请求/响应模型

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::AppError;
use crate::llm::ProviderKind;
use crate::services::diagnosis::ReconcileOutcome;
use crate::services::generator::GeneratedDocumentation;
use crate::services::segmenter::CodeSource;
use crate::services::templates::DocumentationTemplate;

/// 提供方与模型选择（均可省略，省略提供方时使用 GROQ）
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSelection {
    pub provider: Option<String>,
    pub model: Option<String>,
}

impl ProviderSelection {
    /// 解析提供方，未知名称返回 400
    pub fn kind(&self) -> Result<ProviderKind, AppError> {
        match self.provider.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(name) => name
                .parse()
                .map_err(|e: crate::llm::LlmError| AppError::BadRequest(e.to_string())),
            None => Ok(ProviderKind::Groq),
        }
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref().filter(|m| !m.trim().is_empty())
    }
}

/// 模板引用：内联模板、模板 id 或模板名称，按此优先级取第一个
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRef {
    pub template: Option<DocumentationTemplate>,
    pub template_id: Option<u64>,
    pub template_name: Option<String>,
}

/// 文档生成请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDocumentationRequest {
    #[serde(flatten)]
    pub template: TemplateRef,
    #[serde(default)]
    pub code_sources: Vec<CodeSource>,
    #[serde(default)]
    pub text_descriptions: Vec<String>,
    #[serde(default)]
    pub specifications: Vec<String>,
    #[serde(flatten)]
    pub selection: ProviderSelection,
    #[serde(default)]
    pub save_to_storage: bool,
    pub file_name: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// 文档生成响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDocumentationResponse {
    #[serde(flatten)]
    pub result: GeneratedDocumentation,
    /// 仅在请求保存时出现
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<bool>,
}

/// 可用模型响应
#[derive(Debug, Serialize)]
pub struct AvailableModelsResponse {
    pub models: BTreeMap<ProviderKind, Vec<String>>,
}

/// 文档校验请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateDocumentationRequest {
    pub documentation: Option<String>,
    #[serde(flatten)]
    pub template: TemplateRef,
    pub additional_standards: Option<String>,
    #[serde(flatten)]
    pub selection: ProviderSelection,
}

/// 诊断对账请求（直接提交 LLM 回复原文）
#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub text: String,
}

/// 诊断卡片更新请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardRequest {
    pub report: String,
    #[serde(flatten)]
    pub selection: ProviderSelection,
}

/// 医疗助手对话请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub prompt: Option<String>,
    pub user_id: Option<u64>,
    /// 是否用回复更新该用户的诊断卡片
    #[serde(default)]
    pub update_card: bool,
    #[serde(flatten)]
    pub selection: ProviderSelection,
}

/// 医疗助手对话响应
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    /// 仅在请求更新卡片时出现
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<ReconcileOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_selection() {
        let selection = ProviderSelection::default();
        assert_eq!(selection.kind().unwrap(), ProviderKind::Groq);

        let selection = ProviderSelection {
            provider: Some("gemini".into()),
            model: Some(" ".into()),
        };
        assert_eq!(selection.kind().unwrap(), ProviderKind::Gemini);
        assert!(selection.model().is_none());

        let selection = ProviderSelection {
            provider: Some("openai".into()),
            model: None,
        };
        assert!(matches!(selection.kind(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_generate_request_decoding() {
        let request: GenerateDocumentationRequest = serde_json::from_value(json!({
            "template": {"name": "T", "type": "mkdocs", "content": "c"},
            "codeSources": [{"fileName": "a.js", "language": "js", "content": "function a() {}"}],
            "textDescriptions": ["d"],
            "provider": "GROQ",
            "model": "llama-3.3-70b-versatile",
            "saveToStorage": true,
            "fileName": "out.md",
            "metadata": {"author": "me"}
        }))
        .unwrap();

        assert_eq!(request.template.template.as_ref().unwrap().name, "T");
        assert_eq!(request.code_sources[0].file_name, "a.js");
        assert_eq!(request.selection.model(), Some("llama-3.3-70b-versatile"));
        assert!(request.save_to_storage);
        assert_eq!(request.metadata["author"], "me");
    }
}
