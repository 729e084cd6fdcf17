//! 文档校验端点

use axum::{extract::State, routing::post, Json, Router};
use std::sync::Arc;

use super::resolve_template;
use crate::error::{AppError, AppResult};
use crate::models::api::ValidateDocumentationRequest;
use crate::services::validation::{ValidationReport, ValidationRequest};
use crate::state::AppState;

/// 创建校验路由
pub fn validation_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/validation/validate", post(validate_documentation))
}

/// 按模板校验文档
async fn validate_documentation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidateDocumentationRequest>,
) -> AppResult<Json<ValidationReport>> {
    let documentation = req
        .documentation
        .filter(|doc| !doc.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Documentation is required".to_string()))?;
    let kind = req.selection.kind()?;
    let template = resolve_template(&state, &req.template)?;

    let request = ValidationRequest {
        documentation,
        template,
        additional_standards: req.additional_standards,
    };
    let report = state
        .validator
        .validate(&request, kind, req.selection.model())
        .await?;

    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{send, state_with};
    use crate::llm::testing::ScriptedProvider;
    use crate::llm::{ProviderKind, ProviderRegistry};
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use std::sync::Arc;

    fn registry(reply: &str) -> ProviderRegistry {
        ProviderRegistry::new()
            .with_provider(Arc::new(ScriptedProvider::replying(ProviderKind::Groq, reply)))
    }

    #[tokio::test]
    async fn test_validate_returns_report() {
        let reply = "```json\n{\"isValid\": false, \"complianceScore\": 72.6, \"summary\": \"Missing examples\", \
                     \"issues\": [{\"type\": \"CONTENT\", \"severity\": \"WARNING\", \"description\": \"No examples\", \
                     \"location\": \"Usage\", \"recommendation\": \"Add one\"}]}\n```";
        let (status, body) = send(
            state_with(registry(reply)),
            Method::POST,
            "/api/validation/validate",
            Some(json!({
                "documentation": "# Usage",
                "template": {"name": "T", "type": "MARKDOWN", "content": "## Usage"}
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isValid"], false);
        assert_eq!(body["complianceScore"], 73);
        assert_eq!(body["issues"][0]["type"], "CONTENT");
    }

    #[tokio::test]
    async fn test_validate_unparseable_reply() {
        let (status, body) = send(
            state_with(registry("looks fine to me")),
            Method::POST,
            "/api/validation/validate",
            Some(json!({
                "documentation": "# Usage",
                "template": {"name": "T", "type": "MARKDOWN", "content": "## Usage"}
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isValid"], false);
        assert_eq!(body["issues"][0]["type"], "PARSING_ERROR");
    }

    #[tokio::test]
    async fn test_validate_requires_documentation_and_template() {
        let state = state_with(registry("unused"));

        let (status, _) = send(
            state.clone(),
            Method::POST,
            "/api/validation/validate",
            Some(json!({"template": {"name": "T", "type": "MARKDOWN", "content": "c"}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            state,
            Method::POST,
            "/api/validation/validate",
            Some(json!({"documentation": "# Doc"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
