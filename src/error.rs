//! 统一错误处理模块
//!
//! 定义应用级错误类型，并实现 axum 的 IntoResponse trait 以便自动转换为 HTTP 响应。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm::LlmError;
use crate::services::diagnosis::CardUpdateError;
use crate::services::StoreError;

/// 应用错误枚举
#[derive(Error, Debug)]
pub enum AppError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(String),

    /// LLM 调用错误
    #[error("LLM 错误: {0}")]
    Llm(String),

    /// 请求参数错误
    #[error("请求错误: {0}")]
    BadRequest(String),

    /// 资源未找到
    #[error("未找到: {0}")]
    NotFound(String),

    /// 资源冲突
    #[error("冲突: {0}")]
    Conflict(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::ConfigError(msg) => AppError::BadRequest(msg),
            other => AppError::Llm(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Invalid(msg) => AppError::BadRequest(msg),
        }
    }
}

impl From<CardUpdateError> for AppError {
    fn from(err: CardUpdateError) -> Self {
        match err {
            CardUpdateError::Llm(e) => e.into(),
            CardUpdateError::Store(e) => e.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Llm(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "success": false,
            "error": error_message
        }));

        (status, body).into_response()
    }
}

/// 便捷类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_mapping() {
        let err: AppError = LlmError::ConfigError("LLM provider GEMINI is not configured".into()).into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err: AppError = LlmError::ApiError {
            status: 500,
            message: "boom".into(),
        }
        .into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_store_error_mapping() {
        let status = |e: StoreError| AppError::from(e).into_response().status();
        assert_eq!(status(StoreError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(StoreError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(status(StoreError::Invalid("x".into())), StatusCode::BAD_REQUEST);
    }
}
