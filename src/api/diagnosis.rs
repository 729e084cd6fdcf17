//! 诊断卡片端点

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::llm::ProviderKind;
use crate::models::api::{ChatRequest, ChatResponse, ReconcileRequest, UpdateCardRequest};
use crate::services::diagnosis::{DiagnosisRecord, ReconcileOutcome};
use crate::state::AppState;

/// 创建诊断路由
pub fn diagnosis_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/diagnosis/:subject_id", get(list_records))
        .route("/api/diagnosis/:subject_id/reconcile", post(reconcile))
        .route("/api/diagnosis/:subject_id/update-card", post(update_card))
        .route("/api/llm/chat", post(chat))
}

/// 卡片更新的默认模型：配置的卡片模型只属于 Groq，其余提供方使用各自的默认模型
fn card_model(state: &AppState, kind: ProviderKind) -> Option<&str> {
    (kind == ProviderKind::Groq).then_some(state.config.card_update_model.as_str())
}

async fn list_records(
    State(state): State<Arc<AppState>>,
    Path(subject_id): Path<u64>,
) -> AppResult<Json<Vec<DiagnosisRecord>>> {
    Ok(Json(state.diagnosis.records(subject_id).await?))
}

/// 对账一段已有的 LLM 回复
async fn reconcile(
    State(state): State<Arc<AppState>>,
    Path(subject_id): Path<u64>,
    Json(req): Json<ReconcileRequest>,
) -> AppResult<Json<ReconcileOutcome>> {
    Ok(Json(state.diagnosis.reconcile(subject_id, &req.text).await?))
}

/// 让 LLM 根据报告更新卡片，未指定模型时使用卡片默认模型
async fn update_card(
    State(state): State<Arc<AppState>>,
    Path(subject_id): Path<u64>,
    Json(req): Json<UpdateCardRequest>,
) -> AppResult<Json<ReconcileOutcome>> {
    let kind = req.selection.kind()?;
    let model = req.selection.model().or_else(|| card_model(&state, kind));

    let outcome = state
        .diagnosis
        .update_card(subject_id, &req.report, kind, model)
        .await?;
    Ok(Json(outcome))
}

/// 医疗助手对话，可选地把回复作为报告更新该用户的卡片
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let user_id = req
        .user_id
        .ok_or_else(|| AppError::BadRequest("userId is required".to_string()))?;
    let prompt = req
        .prompt
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing 'prompt' field".to_string()))?;
    let kind = req.selection.kind()?;

    let response = state
        .diagnosis
        .chat(user_id, prompt, kind, req.selection.model())
        .await?;

    let card = if req.update_card {
        let outcome = state
            .diagnosis
            .update_card(user_id, &response, kind, card_model(&state, kind))
            .await?;
        info!(
            "Card for user {} updated from chat: updated={}, created={}",
            user_id,
            outcome.updated.len(),
            outcome.created.len()
        );
        Some(outcome)
    } else {
        None
    };

    Ok(Json(ChatResponse { response, card }))
}
