//! Documentation Generation Platform - Rust Backend
//!
//! 使用 axum 框架构建的后端服务：按函数切分源码，结合模板调用 LLM 生成与校验文档，
//! 并维护诊断卡片。

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod error;
mod llm;
mod models;
mod services;
mod state;

use api::create_api_routes;
use config::AppConfig;
use state::create_shared_state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docgen_rs=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting documentation generation backend...");

    let config = AppConfig::load()?;
    let addr = config.bind_addr();
    let state = create_shared_state(config)?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(create_api_routes(Arc::clone(&state)))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    info!("Server listening on: {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
