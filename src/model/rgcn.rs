//! 关系图卷积网络
//!
//! 嵌入表 + L 层关系卷积。层维度表：
//! - L = 1: embedding_dim → embedding_dim
//! - L > 1: embedding_dim → hidden_dim → … → hidden_dim → embedding_dim
//!
//! 除最后一层外，每层输出经过 ReLU。

use candle_core::{Device, Tensor, Var};
use rand::rngs::StdRng;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::model::embedding::EmbeddingTable;
use crate::model::layer::RelationalConv;
use crate::model::plan::EdgePlan;

/// 模型维度，决定参数快照的形状
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDims {
    pub num_nodes: usize,
    pub num_relations: usize,
    pub embedding_dim: usize,
    pub hidden_dim: usize,
    pub num_layers: usize,
}

impl ModelDims {
    /// 每层的 (输入维度, 输出维度)
    pub fn layer_dims(&self) -> Vec<(usize, usize)> {
        match self.num_layers {
            0 => Vec::new(),
            1 => vec![(self.embedding_dim, self.embedding_dim)],
            n => {
                let mut dims = Vec::with_capacity(n);
                dims.push((self.embedding_dim, self.hidden_dim));
                dims.extend((0..n - 2).map(|_| (self.hidden_dim, self.hidden_dim)));
                dims.push((self.hidden_dim, self.embedding_dim));
                dims
            }
        }
    }
}

pub struct RgcnModel {
    dims: ModelDims,
    embedding: EmbeddingTable,
    layers: Vec<RelationalConv>,
    device: Device,
}

impl RgcnModel {
    pub fn new(dims: ModelDims, rng: &mut StdRng, device: &Device) -> Result<Self> {
        if dims.num_layers == 0 {
            return Err(AppError::Config("num_layers must be at least 1".into()));
        }
        if dims.num_nodes == 0 {
            return Err(AppError::EmptyGraph);
        }

        let embedding = EmbeddingTable::new(dims.num_nodes, dims.embedding_dim, rng, device)?;
        let layers = dims
            .layer_dims()
            .into_iter()
            .map(|(input, output)| {
                RelationalConv::new(input, output, dims.num_relations, rng, device)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Constructed R-GCN: {} nodes, {} relations, layers {:?}",
            dims.num_nodes,
            dims.num_relations,
            dims.layer_dims()
        );

        Ok(Self {
            dims,
            embedding,
            layers,
            device: device.clone(),
        })
    }

    /// 检查计划与模型的关系变换集合一致
    pub fn check_plan(&self, plan: &EdgePlan) -> Result<()> {
        if plan.num_nodes() != self.dims.num_nodes {
            return Err(AppError::Validation(format!(
                "edge plan has {} nodes, model has {}",
                plan.num_nodes(),
                self.dims.num_nodes
            )));
        }
        for group in plan.groups() {
            if group.relation >= self.dims.num_relations {
                return Err(AppError::UnknownRelation {
                    relation: group.relation,
                    num_relations: self.dims.num_relations,
                });
            }
        }
        Ok(())
    }

    /// 全图前向传播，输出 `[num_nodes, embedding_dim]`
    pub fn forward(&self, plan: &EdgePlan) -> Result<Tensor> {
        let mut x = self.embedding.as_tensor().clone();
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            x = layer.forward(&x, plan)?;
            if i < last {
                x = x.relu()?;
            }
        }
        Ok(x)
    }

    /// 前向传播并转为行向量，供检索服务使用
    pub fn embeddings(&self, plan: &EdgePlan) -> Result<Vec<Vec<f32>>> {
        Ok(self.forward(plan)?.to_vec2::<f32>()?)
    }

    pub fn dims(&self) -> ModelDims {
        self.dims
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn embedding_table(&self) -> &EmbeddingTable {
        &self.embedding
    }

    pub fn layers(&self) -> &[RelationalConv] {
        &self.layers
    }

    /// 按稳定名称排列的全部可学习参数
    pub(crate) fn named_parameters(&self) -> Vec<(String, &Var)> {
        let mut params = vec![("embedding.weight".to_string(), self.embedding.var())];
        for (i, layer) in self.layers.iter().enumerate() {
            params.extend(layer.named_parameters(&format!("convs.{}", i)));
        }
        params
    }

    /// 供优化器持有的参数句柄（与模型共享存储）
    pub fn parameters(&self) -> Vec<Var> {
        self.named_parameters()
            .into_iter()
            .map(|(_, var)| var.clone())
            .collect()
    }

    /// 参数的深拷贝
    pub fn export_parameters(&self) -> Result<HashMap<String, Tensor>> {
        self.named_parameters()
            .into_iter()
            .map(|(name, var)| -> Result<(String, Tensor)> { Ok((name, var.as_tensor().copy()?)) })
            .collect()
    }

    /// 写入参数；先校验全部名称和形状，任何不匹配都不修改模型
    pub fn import_parameters(&self, tensors: &HashMap<String, Tensor>) -> Result<()> {
        let params = self.named_parameters();

        for (name, var) in &params {
            let tensor = tensors
                .get(name)
                .ok_or_else(|| AppError::SnapshotMismatch(format!("missing tensor '{}'", name)))?;
            if tensor.dims() != var.dims() {
                return Err(AppError::SnapshotMismatch(format!(
                    "tensor '{}' has shape {:?}, expected {:?}",
                    name,
                    tensor.dims(),
                    var.dims()
                )));
            }
            if tensor.dtype() != var.dtype() {
                return Err(AppError::SnapshotMismatch(format!(
                    "tensor '{}' has dtype {:?}, expected {:?}",
                    name,
                    tensor.dtype(),
                    var.dtype()
                )));
            }
        }
        if tensors.len() != params.len() {
            return Err(AppError::SnapshotMismatch(format!(
                "snapshot has {} tensors, model has {}",
                tensors.len(),
                params.len()
            )));
        }

        for (name, var) in &params {
            let tensor = tensors[name].to_device(&self.device)?;
            var.set(&tensor)?;
        }
        Ok(())
    }
}
