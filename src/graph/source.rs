//! 图数据源
//!
//! 外部图抽取层的边界。内置实现从 JSON 文件读取 [`GraphData`]。

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use crate::config::config::GraphConfig;
use crate::error::Result;
use crate::graph::GraphData;

#[async_trait]
pub trait GraphSource: Send + Sync {
    async fn load_graph(&self) -> Result<GraphData>;
    fn describe(&self) -> String;
}

/// JSON 文件图数据源
pub struct JsonFileGraphSource {
    path: PathBuf,
}

impl JsonFileGraphSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl GraphSource for JsonFileGraphSource {
    async fn load_graph(&self) -> Result<GraphData> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let data: GraphData = serde_json::from_str(&raw)?;
        info!(
            "Loaded graph from {}: {} entities, {} edges, {} relation types",
            self.path.display(),
            data.entity_ids.len(),
            data.edges.len(),
            data.rel_type_map.len()
        );
        Ok(data)
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

pub fn create_graph_source(config: &GraphConfig) -> Box<dyn GraphSource> {
    Box::new(JsonFileGraphSource::new(config.path.clone()))
}
