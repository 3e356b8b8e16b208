//! 链接预测训练模块

pub mod loss;
pub mod optimizer;
pub mod sampler;
pub mod trainer;

pub use optimizer::{Adam, AdamConfig};
pub use sampler::NegativeSampler;
pub use trainer::Trainer;
