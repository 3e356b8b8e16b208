//! Adam 优化器
//!
//! L2 权重衰减在更新矩估计之前并入梯度（`g + wd * θ`）。

use candle_core::{Tensor, Var};
use candle_core::backprop::GradStore;

use crate::error::Result;

/// Adam 优化器配置
#[derive(Debug, Clone)]
pub struct AdamConfig {
    /// 基础学习率
    pub learning_rate: f64,
    /// 一阶矩衰减率
    pub beta1: f64,
    /// 二阶矩衰减率
    pub beta2: f64,
    /// 数值稳定项
    pub epsilon: f64,
    /// L2 惩罚系数
    pub weight_decay: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            weight_decay: 5e-4,
        }
    }
}

/// 参数及其矩估计
///
/// 矩估计保存为 `Var` 并用 `set` 覆盖，始终是叶子张量。
struct TrackedParam {
    var: Var,
    m: Var,
    v: Var,
}

pub struct Adam {
    config: AdamConfig,
    params: Vec<TrackedParam>,
    step: usize,
}

impl Adam {
    pub fn new(vars: Vec<Var>, config: AdamConfig) -> Result<Self> {
        let params = vars
            .into_iter()
            .map(|var| -> Result<TrackedParam> {
                let m = Var::zeros(var.shape().clone(), var.dtype(), var.device())?;
                let v = Var::zeros(var.shape().clone(), var.dtype(), var.device())?;
                Ok(TrackedParam { var, m, v })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config,
            params,
            step: 0,
        })
    }

    /// 用已计算的梯度执行一步更新
    ///
    /// 没有梯度的参数保持不变。
    pub fn step(&mut self, grads: &GradStore) -> Result<()> {
        self.step += 1;
        let c = &self.config;
        let t = self.step as i32;
        let bc1 = 1.0 - c.beta1.powi(t);
        let bc2 = 1.0 - c.beta2.powi(t);

        for param in &self.params {
            let Some(grad) = grads.get(param.var.as_tensor()) else {
                continue;
            };
            let theta = param.var.as_tensor();

            let grad = if c.weight_decay != 0.0 {
                grad.add(&theta.affine(c.weight_decay, 0.0)?)?
            } else {
                grad.clone()
            };

            let m = param
                .m
                .as_tensor()
                .affine(c.beta1, 0.0)?
                .add(&grad.affine(1.0 - c.beta1, 0.0)?)?;
            let v = param
                .v
                .as_tensor()
                .affine(c.beta2, 0.0)?
                .add(&grad.sqr()?.affine(1.0 - c.beta2, 0.0)?)?;

            let m_hat = m.affine(1.0 / bc1, 0.0)?;
            let denom = v.affine(1.0 / bc2, 0.0)?.sqrt()?.affine(1.0, c.epsilon)?;
            let update = m_hat.div(&denom)?.affine(c.learning_rate, 0.0)?;
            let next: Tensor = theta.sub(&update)?;

            param.m.set(&m)?;
            param.v.set(&v)?;
            param.var.set(&next)?;
        }

        Ok(())
    }

    /// 已执行的更新步数
    pub fn global_step(&self) -> usize {
        self.step
    }

}
