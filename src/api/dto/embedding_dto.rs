//! 嵌入 DTO
//!
//! 定义嵌入检索与相似度查询的请求和响应数据结构。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::services::SimilarEntity;

/// 默认返回的相似实体数量
pub const DEFAULT_TOP_K: i64 = 10;

/// 嵌入请求
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmbeddingRequest {
    /// 为空时返回全部实体
    pub entity_ids: Option<Vec<String>>,
}

/// 嵌入响应
#[derive(Debug, Serialize)]
pub struct EmbeddingResponse {
    pub embeddings: HashMap<String, Vec<f32>>,
    /// 与 `embeddings` 的键一致，按请求顺序（或节点索引顺序）排列
    pub entity_ids: Vec<String>,
}

/// 相似实体请求
#[derive(Debug, Deserialize)]
pub struct SimilarityRequest {
    pub entity_id: String,
    #[serde(default = "default_top_k")]
    pub top_k: i64,
}

fn default_top_k() -> i64 {
    DEFAULT_TOP_K
}

impl SimilarityRequest {
    /// 非正数视为 0
    pub fn limit(&self) -> usize {
        usize::try_from(self.top_k).unwrap_or(0)
    }
}

/// 相似实体响应
#[derive(Debug, Serialize)]
pub struct SimilarityResponse {
    pub entity_id: String,
    pub similar_entities: Vec<SimilarEntity>,
}

/// 相似度矩阵请求
#[derive(Debug, Deserialize)]
pub struct SimilarityMatrixRequest {
    pub entity_ids: Vec<String>,
}
