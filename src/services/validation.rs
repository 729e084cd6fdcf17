//! 文档校验服务
//!
//! 构建校验提示词、调用 LLM，并把模型返回的 JSON 报告解析为结构化结果。
//! 模型输出无法解析时不报错，而是返回一份描述解析失败的报告。

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::prompts::{assemble_validation_prompt, VALIDATION_SYSTEM_PROMPT};
use super::request_id;
use super::templates::DocumentationTemplate;
use crate::llm::{ChatMessage, ChatOptions, LlmError, ProviderKind, ProviderRegistry};

/// 问题类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    Format,
    Content,
    Structure,
    Standard,
    ParsingError,
    #[serde(other)]
    Other,
}

/// 严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
    #[serde(other)]
    Other,
}

/// 校验问题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
}

/// 校验报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    #[serde(alias = "valid", default)]
    pub is_valid: bool,
    /// 0-100，超出范围的值会被截断
    #[serde(default, deserialize_with = "deserialize_score")]
    pub compliance_score: u8,
    #[serde(default)]
    pub summary: String,
    #[serde(default, deserialize_with = "deserialize_issues")]
    pub issues: Vec<ValidationIssue>,
}

fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let score = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    Ok(score.round().clamp(0.0, 100.0) as u8)
}

fn deserialize_issues<'de, D>(deserializer: D) -> Result<Vec<ValidationIssue>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ValidationIssue>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ValidationReport {
    /// 解析失败时返回的报告
    fn parsing_failure(reason: &str) -> Self {
        Self {
            is_valid: false,
            compliance_score: 0,
            summary: format!("Failed to parse the LLM response: {}", reason),
            issues: vec![ValidationIssue {
                issue_type: IssueType::ParsingError,
                severity: Severity::Error,
                description: "The LLM response could not be parsed. It is probably not valid JSON."
                    .to_string(),
                location: Some("LLM Response".to_string()),
                recommendation: Some("Check the output format of the LLM model.".to_string()),
            }],
        }
    }
}

/// 去掉首尾的 Markdown 代码围栏
fn strip_code_fence(text: &str) -> &str {
    let mut json = text.trim();
    if let Some(rest) = json.strip_prefix("```json") {
        json = rest;
    } else if let Some(rest) = json.strip_prefix("```") {
        json = rest;
    }
    if let Some(rest) = json.strip_suffix("```") {
        json = rest;
    }
    json.trim()
}

/// 解析模型返回的校验报告，永不失败
pub fn parse_validation_response(text: &str) -> ValidationReport {
    let json = strip_code_fence(text);
    match serde_json::from_str::<ValidationReport>(json) {
        Ok(report) => {
            debug!("Parsed validation report with {} issues", report.issues.len());
            report
        }
        Err(e) => {
            error!("Failed to parse LLM response as JSON: {}", e);
            debug!("Raw LLM response: {}", text);
            ValidationReport::parsing_failure(&e.to_string())
        }
    }
}

/// 校验请求
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub documentation: String,
    pub template: DocumentationTemplate,
    pub additional_standards: Option<String>,
}

/// 文档校验服务
pub struct ValidationService {
    providers: Arc<ProviderRegistry>,
}

impl ValidationService {
    pub fn new(providers: Arc<ProviderRegistry>) -> Self {
        Self { providers }
    }

    /// 校验文档，提供方错误直接向上传递
    pub async fn validate(
        &self,
        request: &ValidationRequest,
        kind: ProviderKind,
        model: Option<&str>,
    ) -> Result<ValidationReport, LlmError> {
        let request_id = request_id();
        let provider = self.providers.get(kind)?;
        let model = model.unwrap_or_else(|| provider.default_model()).to_string();

        info!(
            "[{}] Validating documentation: template={}, length={}, provider={}, model={}",
            request_id,
            request.template.name,
            request.documentation.len(),
            kind,
            model
        );

        let prompt = assemble_validation_prompt(
            &request.template,
            &request.documentation,
            request.additional_standards.as_deref(),
        );
        debug!("[{}] Validation prompt length: {}", request_id, prompt.len());

        let messages = [
            ChatMessage::system(VALIDATION_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];
        let options = ChatOptions::new().with_temperature(0.1).with_max_tokens(2000);

        let started = Instant::now();
        let reply = provider
            .send_chat_completion(&model, &messages, &options)
            .await?;
        info!(
            "[{}] LLM validation response received in {} ms",
            request_id,
            started.elapsed().as_millis()
        );

        let report = parse_validation_response(&reply);
        if !report.is_valid {
            warn!("[{}] Validation found {} issues", request_id, report.issues.len());
            for issue in &report.issues {
                warn!(
                    "[{}] Issue [{:?}]: {:?} - {}",
                    request_id, issue.severity, issue.issue_type, issue.description
                );
            }
        } else {
            info!(
                "[{}] Validation passed, score={}",
                request_id, report.compliance_score
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedProvider;
    use crate::services::templates::TemplateType;

    const VALID_JSON: &str = r#"{"isValid": true, "complianceScore": 95, "summary": "ok", "issues": []}"#;

    #[test]
    fn test_plain_and_fenced_json() {
        let report = parse_validation_response(VALID_JSON);
        assert!(report.is_valid);
        assert_eq!(report.compliance_score, 95);

        let fenced = format!("```json\n{}\n```", VALID_JSON);
        assert_eq!(parse_validation_response(&fenced), report);

        let bare_fence = format!("  ```\n{}\n```  ", VALID_JSON);
        assert_eq!(parse_validation_response(&bare_fence), report);
    }

    #[test]
    fn test_non_json_becomes_parsing_error_report() {
        let report = parse_validation_response("Looks good to me!");

        assert!(!report.is_valid);
        assert_eq!(report.compliance_score, 0);
        assert!(report.summary.starts_with("Failed to parse the LLM response"));
        assert_eq!(report.issues.len(), 1);
        let issue = &report.issues[0];
        assert_eq!(issue.issue_type, IssueType::ParsingError);
        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(issue.location.as_deref(), Some("LLM Response"));
        assert!(issue.recommendation.is_some());
    }

    #[test]
    fn test_lenient_fields() {
        let report = parse_validation_response(
            r###"{"valid": false, "complianceScore": 140.4, "summary": "s", "issues": [
                {"type": "GRAMMAR", "severity": "CRITICAL", "description": "d"},
                {"type": "STRUCTURE", "severity": "WARNING", "description": "missing section", "location": "## Usage"}
            ]}"###,
        );

        assert!(!report.is_valid);
        assert_eq!(report.compliance_score, 100);
        assert_eq!(report.issues[0].issue_type, IssueType::Other);
        assert_eq!(report.issues[0].severity, Severity::Other);
        assert_eq!(report.issues[1].issue_type, IssueType::Structure);
        assert_eq!(report.issues[1].location.as_deref(), Some("## Usage"));

        let report = parse_validation_response(r#"{"isValid": true, "complianceScore": -3, "issues": null}"#);
        assert_eq!(report.compliance_score, 0);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_report_serializes_with_camel_case() {
        let value = serde_json::to_value(parse_validation_response("nope")).unwrap();
        assert_eq!(value["isValid"], false);
        assert_eq!(value["complianceScore"], 0);
        assert_eq!(value["issues"][0]["type"], "PARSING_ERROR");
        assert_eq!(value["issues"][0]["severity"], "ERROR");
    }

    #[tokio::test]
    async fn test_service_sends_system_prompt_and_options() {
        let provider = Arc::new(ScriptedProvider::replying(
            ProviderKind::Groq,
            &format!("```json\n{}\n```", VALID_JSON),
        ));
        let registry = ProviderRegistry::new().with_provider(provider.clone());
        let service = ValidationService::new(Arc::new(registry));

        let request = ValidationRequest {
            documentation: "# Users".to_string(),
            template: DocumentationTemplate::new("Guide", TemplateType::Markdown, "# {title}"),
            additional_standards: None,
        };
        let report = service
            .validate(&request, ProviderKind::Groq, Some("llama-3.3-70b-versatile"))
            .await
            .unwrap();
        assert!(report.is_valid);

        let calls = provider.calls.lock();
        let (model, messages, options) = &calls[0];
        assert_eq!(model, "llama-3.3-70b-versatile");
        assert_eq!(messages[0], ChatMessage::system(VALIDATION_SYSTEM_PROMPT));
        assert!(messages[1].content.contains("DOCUMENTATION TO VALIDATE:\n```\n# Users\n```"));
        assert_eq!(options.temperature(), Some(0.1));
        assert_eq!(options.max_tokens(), Some(2000));
    }

    #[tokio::test]
    async fn test_service_propagates_provider_errors() {
        let provider = ScriptedProvider::new(
            ProviderKind::Gemini,
            vec![Err(LlmError::ApiError {
                status: 500,
                message: "boom".to_string(),
            })],
        );
        let registry = ProviderRegistry::new().with_provider(Arc::new(provider));
        let service = ValidationService::new(Arc::new(registry));
        let request = ValidationRequest {
            documentation: "doc".to_string(),
            template: DocumentationTemplate::new("T", TemplateType::Custom, "c"),
            additional_standards: None,
        };

        let result = service.validate(&request, ProviderKind::Gemini, None).await;
        assert!(matches!(result, Err(LlmError::ApiError { status: 500, .. })));

        let result = service.validate(&request, ProviderKind::Groq, None).await;
        assert!(matches!(result, Err(LlmError::ConfigError(_))));
    }
}
