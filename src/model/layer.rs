//! 关系图卷积层
//!
//! `h_v' = h_v W_self + b + Σ_r Σ_{u ∈ N_r(v)} (1/|N_r(v)|) h_u W_r`

use candle_core::{Device, Tensor, Var};
use rand::rngs::StdRng;

use crate::error::{AppError, Result};
use crate::model::embedding::xavier_uniform;
use crate::model::plan::EdgePlan;

pub struct RelationalConv {
    in_dim: usize,
    out_dim: usize,
    relation_weights: Vec<Var>,
    self_weight: Var,
    bias: Var,
}

impl RelationalConv {
    pub fn new(
        in_dim: usize,
        out_dim: usize,
        num_relations: usize,
        rng: &mut StdRng,
        device: &Device,
    ) -> Result<Self> {
        let relation_weights = (0..num_relations)
            .map(|_| xavier_uniform(rng, in_dim, out_dim, device))
            .collect::<Result<Vec<_>>>()?;
        let self_weight = xavier_uniform(rng, in_dim, out_dim, device)?;
        let bias = Var::zeros(out_dim, candle_core::DType::F32, device)?;

        Ok(Self {
            in_dim,
            out_dim,
            relation_weights,
            self_weight,
            bias,
        })
    }

    /// 自环变换 `x W_self + b`
    pub fn self_transform(&self, x: &Tensor) -> Result<Tensor> {
        Ok(x
            .matmul(self.self_weight.as_tensor())?
            .broadcast_add(self.bias.as_tensor())?)
    }

    /// `x` 形状 `[num_nodes, in_dim]`，输出 `[num_nodes, out_dim]`
    pub fn forward(&self, x: &Tensor, plan: &EdgePlan) -> Result<Tensor> {
        let mut out = self.self_transform(x)?;

        for group in plan.groups() {
            let weight =
                self.relation_weights
                    .get(group.relation)
                    .ok_or(AppError::UnknownRelation {
                        relation: group.relation,
                        num_relations: self.relation_weights.len(),
                    })?;
            let messages = x
                .index_select(&group.sources, 0)?
                .matmul(weight.as_tensor())?
                .broadcast_mul(&group.norm)?;
            out = out.index_add(&group.targets, &messages, 0)?;
        }

        Ok(out)
    }

    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    pub fn num_relations(&self) -> usize {
        self.relation_weights.len()
    }

    /// 以 `prefix` 命名的全部参数
    pub(crate) fn named_parameters(&self, prefix: &str) -> Vec<(String, &Var)> {
        let mut params = vec![
            (format!("{}.root", prefix), &self.self_weight),
            (format!("{}.bias", prefix), &self.bias),
        ];
        for (r, weight) in self.relation_weights.iter().enumerate() {
            params.push((format!("{}.relation.{}", prefix, r), weight));
        }
        params
    }
}
