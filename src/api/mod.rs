//! API 路由模块

mod diagnosis;
mod docs;
mod health;
mod templates;
mod validation;

pub use diagnosis::diagnosis_routes;
pub use docs::docs_routes;
pub use health::health_routes;
pub use templates::templates_routes;
pub use validation::validation_routes;

use axum::Router;

use crate::error::{AppError, AppResult};
use crate::models::api::TemplateRef;
use crate::services::templates::DocumentationTemplate;
use crate::state::AppState;
use std::sync::Arc;

/// 创建所有 API 路由
pub fn create_api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(docs_routes())
        .merge(templates_routes())
        .merge(validation_routes())
        .merge(diagnosis_routes())
        .with_state(state)
}

/// 解析请求中的模板引用：内联模板优先，其次 id，最后名称
fn resolve_template(state: &AppState, reference: &TemplateRef) -> AppResult<DocumentationTemplate> {
    if let Some(template) = &reference.template {
        return Ok(template.clone());
    }
    if let Some(id) = reference.template_id {
        return state
            .templates
            .find_by_id(id)
            .ok_or_else(|| AppError::NotFound(format!("Template {} not found", id)));
    }
    if let Some(name) = reference.template_name.as_deref() {
        return state
            .templates
            .find_by_name(name)
            .ok_or_else(|| AppError::NotFound(format!("Template '{}' not found", name)));
    }
    Err(AppError::BadRequest("Template is required".to_string()))
}
