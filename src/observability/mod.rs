//! 可观测性模块
//!
//! 提供指标、结构化日志和健康检查。

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

use crate::error::{AppError, Result};
use crate::services::EmbeddingEngine;

// ===== Simple Metrics =====

/// 简单应用指标
#[derive(Default)]
pub struct AppMetrics {
    pub http_requests_total: AtomicU64,
    pub http_request_duration_sum: AtomicU64,
    pub embedding_queries_total: AtomicU64,
    pub similarity_queries_total: AtomicU64,
    pub matrix_queries_total: AtomicU64,
    pub training_runs_total: AtomicU64,
    pub training_epochs_total: AtomicU64,
    pub errors_total: AtomicU64,
}

impl AppMetrics {
    /// 记录 HTTP 请求
    pub fn record_http_request(&self, duration_ms: u64) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);
        self.http_request_duration_sum
            .fetch_add(duration_ms, Ordering::Relaxed);
    }

    /// 记录查询
    pub fn record_query(&self, kind: &str) {
        let counter = match kind {
            "embeddings" => &self.embedding_queries_total,
            "similar" => &self.similarity_queries_total,
            "similarity_matrix" => &self.matrix_queries_total,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录一次完成的训练
    pub fn record_training(&self, epochs: usize) {
        self.training_runs_total.fetch_add(1, Ordering::Relaxed);
        self.training_epochs_total
            .fetch_add(epochs as u64, Ordering::Relaxed);
    }

    /// 记录错误
    pub fn record_error(&self) {
        self.errors_total.fetch_add(1, Ordering::Relaxed);
    }

    /// 生成 Prometheus 文本格式指标
    pub fn gather(&self) -> String {
        let requests = self.http_requests_total.load(Ordering::Relaxed);
        format!(
            r#"# HELP http_requests_total Total HTTP requests
# TYPE http_requests_total counter
http_requests_total {}
# HELP http_request_duration_seconds HTTP request duration in seconds
# TYPE http_request_duration_seconds summary
http_request_duration_seconds_sum {}
http_request_duration_seconds_count {}
# HELP embedding_queries_total Embedding lookups
# TYPE embedding_queries_total counter
embedding_queries_total {}
# HELP similarity_queries_total Top-k similarity searches
# TYPE similarity_queries_total counter
similarity_queries_total {}
# HELP similarity_matrix_queries_total Pairwise similarity matrix requests
# TYPE similarity_matrix_queries_total counter
similarity_matrix_queries_total {}
# HELP training_runs_total Completed training runs
# TYPE training_runs_total counter
training_runs_total {}
# HELP training_epochs_total Applied training epochs
# TYPE training_epochs_total counter
training_epochs_total {}
# HELP errors_total Total errors
# TYPE errors_total counter
errors_total {}
"#,
            requests,
            self.http_request_duration_sum.load(Ordering::Relaxed) as f64 / 1000.0,
            requests,
            self.embedding_queries_total.load(Ordering::Relaxed),
            self.similarity_queries_total.load(Ordering::Relaxed),
            self.matrix_queries_total.load(Ordering::Relaxed),
            self.training_runs_total.load(Ordering::Relaxed),
            self.training_epochs_total.load(Ordering::Relaxed),
            self.errors_total.load(Ordering::Relaxed),
        )
    }
}

// ===== Health Check =====

/// 健康检查状态
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub model_loaded: bool,
    pub training: bool,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: f64,
    pub graph_stats: GraphStats,
    pub model_stats: ModelStats,
}

#[derive(Debug, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub relation_types: usize,
}

#[derive(Debug, Serialize)]
pub struct ModelStats {
    pub embedding_dim: usize,
    pub hidden_dim: usize,
    pub num_layers: usize,
    pub snapshot_version: u64,
}

/// 可观测性路由状态
#[derive(Clone)]
pub struct ObservabilityState {
    pub metrics: Arc<AppMetrics>,
    pub engine: Arc<EmbeddingEngine>,
    pub start_time: DateTime<Utc>,
    pub version: String,
}

impl ObservabilityState {
    pub fn new(version: String, engine: Arc<EmbeddingEngine>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            metrics,
            engine,
            start_time: Utc::now(),
            version,
        }
    }

    /// 获取应用正常运行时间
    pub fn uptime_seconds(&self) -> f64 {
        (Utc::now() - self.start_time).num_seconds() as f64
    }
}

// ===== Health Check Handlers =====

/// 获取完整健康状态
///
/// 模型未加载时返回 `partial` 与 503。
pub async fn health_check(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    let status = state.engine.status();

    let health_status = HealthStatus {
        status: if status.model_loaded { "ok" } else { "partial" }.to_string(),
        model_loaded: status.model_loaded,
        training: status.training,
        timestamp: Utc::now().to_rfc3339(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
        graph_stats: GraphStats {
            nodes: status.num_nodes,
            edges: status.num_edges,
            relation_types: status.num_relations,
        },
        model_stats: ModelStats {
            embedding_dim: status.embedding_dim,
            hidden_dim: status.hidden_dim,
            num_layers: status.num_layers,
            snapshot_version: status.snapshot_version,
        },
    };

    let status_code = if status.model_loaded {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health_status))
}

/// 简单存活检查
pub async fn liveness() -> impl IntoResponse {
    "OK"
}

/// 就绪检查：已发布嵌入快照时就绪
pub async fn readiness(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    if state.engine.status().model_loaded {
        (StatusCode::OK, "Ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Not Ready")
    }
}

/// Prometheus 指标端点
pub async fn metrics(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    let status = state.engine.status();
    let mut output = state.metrics.gather();
    output.push_str(&format!(
        r#"# HELP graph_nodes Entities in the loaded graph
# TYPE graph_nodes gauge
graph_nodes {}
# HELP graph_edges Edges in the loaded graph
# TYPE graph_edges gauge
graph_edges {}
# HELP model_snapshot_version Published embedding snapshot version
# TYPE model_snapshot_version gauge
model_snapshot_version {}
"#,
        status.num_nodes, status.num_edges, status.snapshot_version
    ));
    (StatusCode::OK, output)
}

/// 版本信息端点
pub async fn version(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "version": state.version,
        "uptime_seconds": state.uptime_seconds(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// 创建可观测性路由
pub fn create_observability_router(state: Arc<ObservabilityState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness))
        .route("/metrics", get(metrics))
        .route("/version", get(version))
        .with_state(state)
}

// ===== Structured Logging =====

/// 初始化结构化日志
///
/// `RUST_LOG` 优先于配置的日志级别。
pub fn init_tracing(level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", level)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| AppError::Internal(format!("Failed to set tracing subscriber: {}", e)))
}

// ===== Request Metrics Middleware =====

/// 记录请求指标的中间件
pub async fn metrics_middleware(
    State(metrics): State<Arc<AppMetrics>>,
    req: Request,
    next: Next,
) -> Response {
    let start = std::time::Instant::now();

    let response = next.run(req).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    metrics.record_http_request(duration_ms);
    if response.status().is_server_error() {
        metrics.record_error();
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config::{ModelConfig, TrainingConfig};
    use crate::services::create_embedding_engine;
    use axum::body::Body;
    use tower::ServiceExt;

    #[test]
    fn test_metrics_gather() {
        let metrics = AppMetrics::default();
        metrics.record_http_request(100);
        metrics.record_query("similar");
        metrics.record_query("unknown");
        metrics.record_training(7);
        metrics.record_error();

        let output = metrics.gather();
        assert!(output.contains("http_requests_total 1"));
        assert!(output.contains("similarity_queries_total 1"));
        assert!(output.contains("embedding_queries_total 0"));
        assert!(output.contains("training_epochs_total 7"));
        assert!(output.contains("errors_total 1"));
    }

    #[tokio::test]
    async fn test_unloaded_model_is_not_ready() {
        let engine = create_embedding_engine(ModelConfig::default(), TrainingConfig::default());
        let state = Arc::new(ObservabilityState::new(
            "test".into(),
            engine,
            Arc::new(AppMetrics::default()),
        ));
        let app = create_observability_router(state);

        let live = app
            .clone()
            .oneshot(
                axum::http::Request::get("/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(live.status(), StatusCode::OK);

        let ready = app
            .oneshot(
                axum::http::Request::get("/health/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
