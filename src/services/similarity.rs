//! 嵌入检索与相似度服务
//!
//! 只读地消费某一时刻发布的嵌入快照：实体 ID 经图索引转为节点索引，
//! 按余弦相似度排序候选实体。

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::{DEFAULT_LABEL, GraphIndex};

/// 余弦相似度；任一向量范数为 0 时定义为 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// 一次前向传播产出的嵌入矩阵，发布后不再修改
#[derive(Debug)]
pub struct ServingSnapshot {
    pub index: Arc<GraphIndex>,
    pub embeddings: Vec<Vec<f32>>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl ServingSnapshot {
    pub fn new(index: Arc<GraphIndex>, embeddings: Vec<Vec<f32>>, version: u64) -> Self {
        Self {
            index,
            embeddings,
            version,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarEntity {
    pub entity_id: String,
    pub score: f32,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimilarityMatrix {
    pub entity_ids: Vec<String>,
    pub matrix: Vec<Vec<f32>>,
}

impl SimilarityMatrix {
    pub fn is_empty(&self) -> bool {
        self.entity_ids.is_empty()
    }
}

#[derive(Clone)]
pub struct EmbeddingService {
    snapshot: Arc<ServingSnapshot>,
}

impl EmbeddingService {
    pub fn new(snapshot: Arc<ServingSnapshot>) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &ServingSnapshot {
        &self.snapshot
    }

    /// 获取实体嵌入
    ///
    /// `entity_ids` 为 None 时返回全部实体；未知 ID 被静默丢弃。
    pub fn get_embeddings(&self, entity_ids: Option<&[String]>) -> HashMap<String, Vec<f32>> {
        let index = &self.snapshot.index;
        match entity_ids {
            None => index
                .entity_ids()
                .iter()
                .zip(&self.snapshot.embeddings)
                .map(|(id, emb)| (id.clone(), emb.clone()))
                .collect(),
            Some(ids) => ids
                .iter()
                .filter_map(|id| {
                    index
                        .node_index(id)
                        .map(|node| (id.clone(), self.snapshot.embeddings[node].clone()))
                })
                .collect(),
        }
    }

    /// 按余弦相似度查找最相似的实体
    ///
    /// 查询实体本身不会出现在结果中；分数相同时节点索引小的在前。
    pub fn find_similar(&self, entity_id: &str, top_k: usize) -> Vec<SimilarEntity> {
        let index = &self.snapshot.index;
        let Some(query_node) = index.node_index(entity_id) else {
            return Vec::new();
        };
        if top_k == 0 {
            return Vec::new();
        }
        let query = &self.snapshot.embeddings[query_node];

        let mut candidates: Vec<(usize, f32)> = index
            .entity_ids()
            .iter()
            .enumerate()
            .filter(|(_, id)| id.as_str() != entity_id)
            .map(|(node, _)| (node, cosine_similarity(query, &self.snapshot.embeddings[node])))
            .collect();

        // stable: equal scores keep ascending node order
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        candidates.truncate(top_k);

        candidates
            .into_iter()
            .map(|(node, score)| SimilarEntity {
                entity_id: index.entity_ids()[node].clone(),
                score,
                label: index.label(node).unwrap_or(DEFAULT_LABEL).to_string(),
            })
            .collect()
    }

    /// 对能解析的请求实体计算两两余弦相似度
    pub fn similarity_matrix(&self, entity_ids: &[String]) -> SimilarityMatrix {
        let index = &self.snapshot.index;
        let resolved: Vec<(&String, usize)> = entity_ids
            .iter()
            .filter_map(|id| index.node_index(id).map(|node| (id, node)))
            .collect();

        let matrix = resolved
            .iter()
            .map(|(_, a)| {
                resolved
                    .iter()
                    .map(|(_, b)| {
                        cosine_similarity(&self.snapshot.embeddings[*a], &self.snapshot.embeddings[*b])
                    })
                    .collect()
            })
            .collect();

        SimilarityMatrix {
            entity_ids: resolved.into_iter().map(|(id, _)| id.clone()).collect(),
            matrix,
        }
    }
}
