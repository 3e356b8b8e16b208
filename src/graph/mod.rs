//! 图索引模块
//!
//! 实体/关系到稠密索引的映射，以及图抽取边界的数据结构。

pub mod index;
pub mod source;

pub use index::{DEFAULT_LABEL, Edge, GraphData, GraphIndex};
pub use source::{GraphSource, JsonFileGraphSource, create_graph_source};
