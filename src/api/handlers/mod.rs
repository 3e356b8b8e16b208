//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod embedding_handler;
pub mod training_handler;

pub use embedding_handler::*;
pub use training_handler::*;
