use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

use crate::observability::AppMetrics;
use crate::services::EmbeddingEngine;

/// 查询统计
///
/// 平均相似度沿用简单的两两平滑：`avg = (avg + batch_avg) / 2`。
#[derive(Debug, Default)]
pub struct QueryStats {
    inner: Mutex<StatsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total_queries: u64,
    pub avg_similarity_score: f32,
    pub embeddings_generated: u64,
}

impl QueryStats {
    pub fn record_embeddings(&self, count: usize) {
        let mut inner = self.inner.lock();
        inner.total_queries += 1;
        inner.embeddings_generated += count as u64;
    }

    pub fn record_similarity(&self, scores: &[f32]) {
        let mut inner = self.inner.lock();
        inner.total_queries += 1;
        if !scores.is_empty() {
            let batch_avg = scores.iter().sum::<f32>() / scores.len() as f32;
            inner.avg_similarity_score = (inner.avg_similarity_score + batch_avg) / 2.0;
        }
    }

    pub fn record_query(&self) {
        self.inner.lock().total_queries += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        *self.inner.lock()
    }
}

/// Application state containing the model handle and request counters
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<EmbeddingEngine>,
    pub stats: Arc<QueryStats>,
    pub metrics: Arc<AppMetrics>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("engine", &"Arc<EmbeddingEngine>")
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

impl AppState {
    pub fn new(engine: Arc<EmbeddingEngine>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            engine,
            stats: Arc::new(QueryStats::default()),
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_running_average() {
        let stats = QueryStats::default();
        stats.record_similarity(&[0.8, 0.4]);
        assert!((stats.snapshot().avg_similarity_score - 0.3).abs() < 1e-6);

        stats.record_similarity(&[1.0]);
        assert!((stats.snapshot().avg_similarity_score - 0.65).abs() < 1e-6);

        // empty results count as a query but leave the average alone
        stats.record_similarity(&[]);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_queries, 3);
        assert!((snapshot.avg_similarity_score - 0.65).abs() < 1e-6);
    }

    #[test]
    fn test_embedding_counter() {
        let stats = QueryStats::default();
        stats.record_embeddings(3);
        stats.record_embeddings(0);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_queries, 2);
        assert_eq!(snapshot.embeddings_generated, 3);
    }
}
