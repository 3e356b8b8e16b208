//! Embedding Routes
//!
//! 定义嵌入检索与相似度相关的 API 路由。

use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;
use crate::api::handlers::embedding_handler::*;

/// 创建嵌入路由器
pub fn create_embedding_router() -> Router<AppState> {
    Router::new()
        .route("/embeddings", post(get_embeddings))
        .route("/similar", post(find_similar))
        .route("/similarity-matrix", post(similarity_matrix))
        .route("/stats", get(get_stats))
        .route("/status", get(get_status))
}
