//! API 模块
//!
//! 提供嵌入检索、相似度查询与训练触发的 REST API。

#[cfg(test)]
mod api_tests;
pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod routes;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::app_state::AppState;

pub fn create_router(app_state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::embedding_routes::create_embedding_router())
        .merge(routes::training_routes::create_training_router());

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
