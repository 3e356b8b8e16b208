//! 错误处理模块
//!
//! 定义应用程序的错误类型和错误处理逻辑。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 图中没有实体，无法构建模型
    #[error("图为空: 没有可构建模型的实体")]
    EmptyGraph,

    /// 边引用了超出关系数量的关系索引
    #[error("未知关系索引 {relation} (关系数量 {num_relations})")]
    UnknownRelation { relation: usize, num_relations: usize },

    /// 边引用了超出节点数量的节点索引
    #[error("未知节点索引 {node} (节点数量 {num_nodes})")]
    UnknownNode { node: usize, num_nodes: usize },

    /// 模型或边张量尚未初始化时调用训练
    #[error("模型未初始化: {0}")]
    UninitializedModel(String),

    /// 查询时模型尚不可用
    #[error("模型未加载")]
    ModelUnavailable,

    /// 已有训练在进行
    #[error("训练正在进行中")]
    TrainingInProgress,

    /// 训练损失发散
    #[error("第 {epoch} 轮训练损失非有限值: {loss}")]
    NonFiniteLoss { epoch: usize, loss: f32 },

    /// 参数快照与当前模型不兼容
    #[error("参数快照不兼容: {0}")]
    SnapshotMismatch(String),

    /// 参数验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 张量计算错误
    #[error("张量计算错误: {0}")]
    Tensor(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<candle_core::Error> for AppError {
    fn from(e: candle_core::Error) -> Self {
        AppError::Tensor(e.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(e.to_string())
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = (&self).into();
        let body = Json(ErrorResponse::new(&code, &self.to_string()));
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response()
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,
    /// 错误消息
    pub message: String,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
        }
    }
}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::ModelUnavailable | AppError::UninitializedModel(_) | AppError::EmptyGraph => {
                (503, "MODEL_UNAVAILABLE".to_string())
            }
            AppError::TrainingInProgress => (409, "TRAINING_IN_PROGRESS".to_string()),
            AppError::Validation(_) => (400, "BAD_REQUEST".to_string()),
            AppError::NonFiniteLoss { .. } => (500, "TRAINING_DIVERGED".to_string()),
            AppError::Tensor(_) => (500, "TENSOR_ERROR".to_string()),
            _ => (500, "INTERNAL_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;
