//! 参数快照持久化
//!
//! 以 safetensors 格式保存全部参数，张量名与层结构一一对应，
//! 因此只有相同维度表的模型才能加载。

use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::model::rgcn::RgcnModel;

/// 保存模型参数到 `path`
///
/// 先写入同目录下的临时文件再重命名覆盖，写入中途失败不会留下半个快照。
pub fn save(model: &RgcnModel, path: &Path) -> Result<()> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let tensors = model.export_parameters()?;
    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    candle_core::safetensors::save(&tensors, tmp.path())?;
    tmp.persist(path).map_err(std::io::Error::from)?;
    info!("Saved {} parameter tensors to {}", tensors.len(), path.display());
    Ok(())
}

/// 从 `path` 加载参数；形状不匹配时模型保持不变
pub fn load(model: &RgcnModel, path: &Path) -> Result<()> {
    let tensors = candle_core::safetensors::load(path, model.device())?;
    model.import_parameters(&tensors)?;
    info!("Loaded {} parameter tensors from {}", tensors.len(), path.display());
    Ok(())
}
