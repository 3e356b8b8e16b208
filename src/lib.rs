//! rgcn-embed - 关系图卷积实体嵌入服务
//!
//! 从知识图谱学习实体嵌入（R-GCN + 链接预测训练），并提供嵌入检索与
//! 余弦相似度查询。

pub mod api;
pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod observability;
pub mod services;
pub mod training;
