//! 文档生成 API 端点

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::info;

use super::resolve_template;
use crate::error::AppResult;
use crate::models::api::{
    AvailableModelsResponse, GenerateDocumentationRequest, GenerateDocumentationResponse,
};
use crate::services::generator::{DocumentationRequest, SaveOptions};
use crate::state::AppState;

/// 创建文档生成路由
pub fn docs_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/llm/generate-documentation", post(generate_documentation))
        .route("/api/llm/available-models", get(available_models))
}

/// 生成文档，按需投递到文件存储服务
async fn generate_documentation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateDocumentationRequest>,
) -> AppResult<Json<GenerateDocumentationResponse>> {
    let kind = req.selection.kind()?;
    let template = resolve_template(&state, &req.template)?;

    let request = DocumentationRequest {
        template,
        code_sources: req.code_sources,
        text_descriptions: req.text_descriptions,
        specifications: req.specifications,
    };
    let result = state
        .generator
        .generate(&request, kind, req.selection.model())
        .await?;

    let saved = if req.save_to_storage {
        let options = SaveOptions {
            file_name: req.file_name,
            metadata: req.metadata,
        };
        let saved = state.generator.save(&result.documentation, &options).await;
        info!("[{}] Documentation saved: {}", result.request_id, saved);
        Some(saved)
    } else {
        None
    };

    Ok(Json(GenerateDocumentationResponse { result, saved }))
}

/// 列出各提供方的可用模型
async fn available_models(State(state): State<Arc<AppState>>) -> Json<AvailableModelsResponse> {
    Json(AvailableModelsResponse {
        models: state.providers.available_models().await,
    })
}
