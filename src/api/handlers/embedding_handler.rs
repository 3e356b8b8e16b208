use axum::{Json, extract::State, response::IntoResponse};
use std::collections::HashSet;
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::embedding_dto::*},
    error::AppError,
};

pub async fn get_embeddings(
    State(state): State<AppState>,
    Json(request): Json<EmbeddingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let service = state.engine.service()?;
    debug!(
        "Embedding lookup for {} entities",
        request
            .entity_ids
            .as_ref()
            .map(|ids| ids.len().to_string())
            .unwrap_or_else(|| "all".into())
    );

    let embeddings = service.get_embeddings(request.entity_ids.as_deref());

    let order: &[String] = match &request.entity_ids {
        Some(ids) => ids,
        None => service.snapshot().index.entity_ids(),
    };
    let mut seen = HashSet::new();
    let entity_ids: Vec<String> = order
        .iter()
        .filter(|id| embeddings.contains_key(*id) && seen.insert(*id))
        .cloned()
        .collect();

    state.stats.record_embeddings(embeddings.len());
    state.metrics.record_query("embeddings");

    Ok(Json(EmbeddingResponse {
        embeddings,
        entity_ids,
    }))
}

pub async fn find_similar(
    State(state): State<AppState>,
    Json(request): Json<SimilarityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let service = state.engine.service()?;
    debug!(
        "Similarity search for {}, top_k: {}",
        request.entity_id, request.top_k
    );

    let similar = service.find_similar(&request.entity_id, request.limit());

    let scores: Vec<f32> = similar.iter().map(|s| s.score).collect();
    state.stats.record_similarity(&scores);
    state.metrics.record_query("similar");

    Ok(Json(SimilarityResponse {
        entity_id: request.entity_id,
        similar_entities: similar,
    }))
}

pub async fn similarity_matrix(
    State(state): State<AppState>,
    Json(request): Json<SimilarityMatrixRequest>,
) -> Result<impl IntoResponse, AppError> {
    let service = state.engine.service()?;
    debug!("Similarity matrix for {} entities", request.entity_ids.len());

    let matrix = service.similarity_matrix(&request.entity_ids);

    state.stats.record_query();
    state.metrics.record_query("similarity_matrix");

    Ok(Json(matrix))
}

pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.stats.snapshot())
}

pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine.status())
}
