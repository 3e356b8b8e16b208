//! Routes 模块
//!
//! 定义 API 路由。

pub mod embedding_routes;
pub mod training_routes;
