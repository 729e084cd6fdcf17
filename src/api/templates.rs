//! 文档模板 CRUD 端点

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::services::templates::{DocumentationTemplate, TemplateType};
use crate::state::AppState;

/// 创建模板路由
pub fn templates_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/templates", get(list_templates).post(create_template))
        .route(
            "/api/templates/:id",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route("/api/templates/by-name/:name", get(get_template_by_name))
        .route("/api/templates/type/:template_type", get(list_templates_by_type))
}

async fn list_templates(State(state): State<Arc<AppState>>) -> Json<Vec<DocumentationTemplate>> {
    Json(state.templates.find_all())
}

async fn list_templates_by_type(
    State(state): State<Arc<AppState>>,
    Path(template_type): Path<String>,
) -> Json<Vec<DocumentationTemplate>> {
    Json(state.templates.find_by_type(TemplateType::from(template_type)))
}

async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> AppResult<Json<DocumentationTemplate>> {
    state
        .templates
        .find_by_id(id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Template {} not found", id)))
}

async fn get_template_by_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<Json<DocumentationTemplate>> {
    state
        .templates
        .find_by_name(&name)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Template '{}' not found", name)))
}

async fn create_template(
    State(state): State<Arc<AppState>>,
    Json(template): Json<DocumentationTemplate>,
) -> AppResult<(StatusCode, Json<DocumentationTemplate>)> {
    let created = state.templates.create(template)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(template): Json<DocumentationTemplate>,
) -> AppResult<Json<DocumentationTemplate>> {
    Ok(Json(state.templates.update(id, template)?))
}

async fn delete_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> AppResult<StatusCode> {
    state.templates.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
