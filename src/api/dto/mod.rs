//! DTO 模块
//!
//! 数据传输对象，用于 API 请求和响应的序列化。

pub mod embedding_dto;
pub mod training_dto;

pub use embedding_dto::*;
pub use training_dto::*;
