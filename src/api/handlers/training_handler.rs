use axum::{Json, extract::State, response::IntoResponse};
use tracing::{info, warn};

use crate::{
    api::{app_state::AppState, dto::training_dto::*},
    error::AppError,
};

/// 触发训练
///
/// 训练在阻塞线程池中执行；已有训练进行时返回 409。
pub async fn train_model(
    State(state): State<AppState>,
    Json(request): Json<TrainRequest>,
) -> Result<impl IntoResponse, AppError> {
    let epochs = request
        .epochs
        .unwrap_or_else(|| state.engine.default_epochs());
    if epochs > MAX_EPOCHS {
        return Err(AppError::Validation(format!(
            "epochs must be at most {}",
            MAX_EPOCHS
        )));
    }
    if state.engine.is_training() {
        return Err(AppError::TrainingInProgress);
    }

    info!("Training requested for {} epochs", epochs);
    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || engine.train(epochs)).await?;

    match result {
        Ok(report) => {
            state.metrics.record_training(report.epochs_completed);
            Ok(Json(TrainResponse::from(report)))
        }
        Err(e) => {
            state.metrics.record_error();
            Err(e)
        }
    }
}

pub async fn abort_training(State(state): State<AppState>) -> impl IntoResponse {
    let training = state.engine.abort_training();
    if training {
        warn!("Abort requested for running training");
    }

    Json(AbortResponse {
        status: if training { "aborting" } else { "idle" }.to_string(),
        training,
    })
}
