//! R-GCN 模型模块
//!
//! 可学习嵌入表、关系图卷积层及其堆叠，以及参数快照持久化。

pub mod embedding;
pub mod layer;
pub mod plan;
pub mod rgcn;
pub mod snapshot;

pub use embedding::EmbeddingTable;
pub use layer::RelationalConv;
pub use plan::{EdgePlan, RelationGroup};
pub use rgcn::{ModelDims, RgcnModel};
