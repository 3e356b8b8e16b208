//! 训练 DTO

use serde::{Deserialize, Serialize};

use crate::services::TrainingReport;

/// 单次请求允许的最大训练轮数
pub const MAX_EPOCHS: usize = 10_000;

/// 训练请求
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrainRequest {
    /// 缺省时使用配置的轮数
    pub epochs: Option<usize>,
}

/// 训练响应
#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub status: String,
    pub run_id: String,
    pub epochs: usize,
    pub final_loss: Option<f32>,
    pub losses: Vec<f32>,
    pub aborted: bool,
    pub model_saved: Option<String>,
}

impl From<TrainingReport> for TrainResponse {
    fn from(report: TrainingReport) -> Self {
        Self {
            status: if report.aborted { "aborted" } else { "success" }.to_string(),
            run_id: report.run_id,
            epochs: report.epochs_completed,
            final_loss: report.final_loss,
            losses: report.losses,
            aborted: report.aborted,
            model_saved: report.model_saved,
        }
    }
}

/// 中止训练响应
#[derive(Debug, Serialize)]
pub struct AbortResponse {
    pub status: String,
    pub training: bool,
}
