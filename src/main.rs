use anyhow::Context;
use rgcn_embed::api::{self, app_state::AppState};
use rgcn_embed::config::loader::ConfigLoader;
use rgcn_embed::graph::create_graph_source;
use rgcn_embed::observability::{
    AppMetrics, ObservabilityState, create_observability_router, init_tracing, metrics_middleware,
};
use rgcn_embed::services::create_embedding_engine;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load().context("failed to load configuration")?;
    ConfigLoader::validate(&config).context("invalid configuration")?;

    init_tracing(&config.logging.level)?;
    info!("Starting rgcn-embed...");
    info!(
        "Model: embedding_dim={}, hidden_dim={}, num_layers={}",
        config.model.embedding_dim, config.model.hidden_dim, config.model.num_layers
    );

    let engine = create_embedding_engine(config.model.clone(), config.training.clone());

    // 图加载或模型构建失败时以降级模式继续服务，查询返回 503
    let source = create_graph_source(&config.graph);
    match source.load_graph().await {
        Ok(data) => {
            let init_engine = engine.clone();
            match tokio::task::spawn_blocking(move || init_engine.initialize(data)).await? {
                Ok(status) => info!(
                    "Service ready: {} nodes, {} edges, {} relation types",
                    status.num_nodes, status.num_edges, status.num_relations
                ),
                Err(e) => warn!("Model not initialized, serving degraded: {}", e),
            }
        }
        Err(e) => warn!(
            "Failed to load graph from {}: {}, serving degraded",
            source.describe(),
            e
        ),
    }

    let metrics = Arc::new(AppMetrics::default());
    let observability_state = Arc::new(ObservabilityState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        engine.clone(),
        metrics.clone(),
    ));
    let app_state = AppState::new(engine, metrics.clone());

    let router = create_observability_router(observability_state)
        .merge(api::create_router(app_state))
        .layer(axum::middleware::from_fn_with_state(metrics, metrics_middleware));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
