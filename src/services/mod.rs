//! 服务模块
//!
//! 嵌入检索/相似度服务与模型状态句柄。

pub mod engine;
pub mod similarity;

pub use engine::{EmbeddingEngine, EngineStatus, TrainingReport, create_embedding_engine};
pub use similarity::{
    EmbeddingService, ServingSnapshot, SimilarEntity, SimilarityMatrix, cosine_similarity,
};
