use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
        }
    }
}

/// 图数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// 图数据 JSON 文件路径
    pub path: PathBuf,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("graph.json"),
        }
    }
}

/// 模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// 嵌入表维度
    pub embedding_dim: usize,
    /// 隐藏层维度
    pub hidden_dim: usize,
    /// 关系卷积层数
    pub num_layers: usize,
    /// 参数快照路径
    pub model_path: PathBuf,
    /// 忽略已有快照，从随机初始化开始
    pub force_retrain: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 64,
            hidden_dim: 128,
            num_layers: 2,
            model_path: PathBuf::from("model.safetensors"),
            force_retrain: false,
        }
    }
}

/// 训练配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// 每次训练调用的轮数
    pub epochs: usize,
    /// 负采样倍数
    pub num_negative_samples: usize,
    /// 学习率
    pub learning_rate: f64,
    /// 权重衰减
    pub weight_decay: f64,
    /// 随机种子（初始化与负采样）
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            num_negative_samples: 1,
            learning_rate: 0.01,
            weight_decay: 5e-4,
            seed: None,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 图数据源配置
    pub graph: GraphConfig,
    /// 模型配置
    pub model: ModelConfig,
    /// 训练配置
    pub training: TrainingConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}
