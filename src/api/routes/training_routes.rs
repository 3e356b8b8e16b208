//! Training Routes

use axum::{Router, routing::post};

use crate::api::app_state::AppState;
use crate::api::handlers::training_handler::*;

/// 创建训练路由器
pub fn create_training_router() -> Router<AppState> {
    Router::new()
        .route("/train", post(train_model))
        .route("/train/abort", post(abort_training))
}
