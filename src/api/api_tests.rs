#[cfg(test)]
mod embedding_handler_tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::api::{app_state::AppState, create_router};
    use crate::config::config::{ModelConfig, TrainingConfig};
    use crate::graph::GraphData;
    use crate::observability::AppMetrics;
    use crate::services::{EmbeddingEngine, create_embedding_engine};

    fn engine(dir: &TempDir) -> Arc<EmbeddingEngine> {
        create_embedding_engine(
            ModelConfig {
                embedding_dim: 8,
                hidden_dim: 8,
                num_layers: 2,
                model_path: dir.path().join("model.safetensors"),
                force_retrain: true,
            },
            TrainingConfig {
                epochs: 3,
                seed: Some(11),
                ..Default::default()
            },
        )
    }

    fn app(dir: &TempDir) -> (Router, AppState) {
        let engine = engine(dir);
        engine
            .initialize(GraphData::from_triples(
                ["A", "B", "C"],
                [("A", "B", "LIKES"), ("B", "C", "LIKES")],
            ))
            .unwrap();
        let state = AppState::new(engine, Arc::new(AppMetrics::default()));
        (create_router(state.clone()), state)
    }

    async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_embeddings_drop_unknown_ids() {
        let dir = TempDir::new().unwrap();
        let (app, state) = app(&dir);

        let (status, body) = post(
            &app,
            "/api/v1/embeddings",
            json!({"entity_ids": ["A", "Z", "A"]}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entity_ids"], json!(["A"]));
        assert_eq!(body["embeddings"]["A"].as_array().unwrap().len(), 8);
        assert!(body["embeddings"].get("Z").is_none());
        assert_eq!(state.stats.snapshot().embeddings_generated, 1);
    }

    #[tokio::test]
    async fn test_embeddings_all_in_index_order() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir);

        let (status, body) = post(&app, "/api/v1/embeddings", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entity_ids"], json!(["A", "B", "C"]));
    }

    #[tokio::test]
    async fn test_similar_excludes_query() {
        let dir = TempDir::new().unwrap();
        let (app, state) = app(&dir);

        let (status, body) = post(&app, "/api/v1/similar", json!({"entity_id": "A"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entity_id"], "A");

        let similar = body["similar_entities"].as_array().unwrap();
        assert_eq!(similar.len(), 2);
        assert!(similar.iter().all(|s| s["entity_id"] != "A"));
        assert!(similar.iter().all(|s| s["label"] == "Entity"));
        assert_eq!(state.stats.snapshot().total_queries, 1);
    }

    #[tokio::test]
    async fn test_similar_unknown_entity_is_empty() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir);

        let (status, body) = post(
            &app,
            "/api/v1/similar",
            json!({"entity_id": "nope", "top_k": 5}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["similar_entities"], json!([]));
    }

    #[tokio::test]
    async fn test_similarity_matrix_shape() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir);

        let (status, body) = post(
            &app,
            "/api/v1/similarity-matrix",
            json!({"entity_ids": ["C", "missing", "A"]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entity_ids"], json!(["C", "A"]));
        let matrix = body["matrix"].as_array().unwrap();
        assert_eq!(matrix.len(), 2);
        let diagonal = matrix[0][0].as_f64().unwrap();
        assert!((diagonal - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_unloaded_model_returns_503() {
        let dir = TempDir::new().unwrap();
        let state = AppState::new(engine(&dir), Arc::new(AppMetrics::default()));
        let app = create_router(state);

        let (status, body) = post(&app, "/api/v1/similar", json!({"entity_id": "A"})).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "MODEL_UNAVAILABLE");

        let (status, _) = post(&app, "/api/v1/train", json!({"epochs": 2})).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_train_endpoint_reports_run() {
        let dir = TempDir::new().unwrap();
        let (app, state) = app(&dir);

        let (status, body) = post(&app, "/api/v1/train", json!({"epochs": 4})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["epochs"], 4);
        assert_eq!(body["losses"].as_array().unwrap().len(), 4);
        assert!(body["final_loss"].as_f64().is_some());
        assert!(body["model_saved"].is_string());
        assert_eq!(state.engine.status().snapshot_version, 2);
    }

    #[tokio::test]
    async fn test_train_rejects_excessive_epochs() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir);

        let (status, body) = post(&app, "/api/v1/train", json!({"epochs": 1_000_000})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_abort_when_idle() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir);

        let (status, body) = post(&app, "/api/v1/train/abort", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "idle");
        assert_eq!(body["training"], false);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(&dir);
        post(&app, "/api/v1/embeddings", json!({"entity_ids": ["A", "B"]})).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["total_queries"], 1);
        assert_eq!(body["embeddings_generated"], 2);
    }
}
