use crate::config::config::AppConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 搜索顺序：
    /// 1. 内置默认值
    /// 2. ./config.toml
    /// 3. 环境变量（`RGCN_MODEL__EMBEDDING_DIM=32`）
    pub fn load() -> Result<AppConfig, figment::Error> {
        Self::load_from(default_config_path())
    }

    /// 从指定路径加载配置
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig, figment::Error> {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("RGCN_").split("__"))
            .extract()
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.model.embedding_dim == 0 || config.model.hidden_dim == 0 {
            return Err(ConfigValidationError::InvalidDimension);
        }

        if config.model.num_layers == 0 {
            return Err(ConfigValidationError::InvalidLayerCount);
        }

        if config.training.num_negative_samples == 0 {
            return Err(ConfigValidationError::InvalidNegativeSamples);
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("嵌入维度无效，必须大于 0")]
    InvalidDimension,

    #[error("卷积层数无效，必须至少为 1")]
    InvalidLayerCount,

    #[error("负采样倍数无效，必须至少为 1")]
    InvalidNegativeSamples,
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("config.toml")
}
