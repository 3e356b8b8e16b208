//! 链接预测训练器
//!
//! 一轮即一次全图迭代：前向传播、正边与负采样对打分、BCE 损失、
//! 反向传播和一次 Adam 更新。训练轮数由调用方决定。

use candle_core::Tensor;
use std::sync::Arc;
use tracing::trace;

use crate::config::config::TrainingConfig;
use crate::error::{AppError, Result};
use crate::model::{EdgePlan, RgcnModel};
use crate::training::loss::{negative_loss, positive_loss, score_pairs};
use crate::training::optimizer::{Adam, AdamConfig};
use crate::training::sampler::NegativeSampler;

pub struct Trainer {
    plan: Arc<EdgePlan>,
    optimizer: Adam,
    sampler: NegativeSampler,
}

impl Trainer {
    pub fn new(model: &RgcnModel, plan: Arc<EdgePlan>, config: &TrainingConfig) -> Result<Self> {
        model.check_plan(&plan)?;

        let optimizer = Adam::new(
            model.parameters(),
            AdamConfig {
                learning_rate: config.learning_rate,
                weight_decay: config.weight_decay,
                ..Default::default()
            },
        )?;
        let sampler = NegativeSampler::new(
            model.dims().num_nodes,
            config.num_negative_samples.max(1),
            config.seed,
        );

        Ok(Self {
            plan,
            optimizer,
            sampler,
        })
    }

    /// 训练一轮并返回损失
    ///
    /// 损失非有限时不执行优化器更新，返回 [`AppError::NonFiniteLoss`]。
    pub fn train_epoch(&mut self, model: &RgcnModel) -> Result<f32> {
        let num_edges = self.plan.num_edges();
        if num_edges == 0 {
            return Err(AppError::UninitializedModel(
                "graph has no edges to train on".into(),
            ));
        }

        let embeddings = model.forward(&self.plan)?;

        let pos_scores = score_pairs(&embeddings, self.plan.sources(), self.plan.targets())?;

        let (neg_sources, neg_targets) = self.sampler.sample(num_edges);
        let count = neg_sources.len();
        let device = model.device();
        let neg_sources = Tensor::from_vec(neg_sources, count, device)?;
        let neg_targets = Tensor::from_vec(neg_targets, count, device)?;
        let neg_scores = score_pairs(&embeddings, &neg_sources, &neg_targets)?;

        let loss = positive_loss(&pos_scores)?.add(&negative_loss(&neg_scores)?)?;
        let value = loss.to_scalar::<f32>()?;
        if !value.is_finite() {
            return Err(AppError::NonFiniteLoss {
                epoch: self.optimizer.global_step() + 1,
                loss: value,
            });
        }

        let grads = loss.backward()?;
        self.optimizer.step(&grads)?;
        trace!(step = self.optimizer.global_step(), loss = value, "epoch step applied");

        Ok(value)
    }

    /// 已执行的优化步数
    pub fn steps(&self) -> usize {
        self.optimizer.global_step()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphData, GraphIndex};
    use crate::model::ModelDims;
    use candle_core::Device;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn toy() -> (RgcnModel, Arc<EdgePlan>) {
        let data = GraphData::from_triples(
            ["n0", "n1", "n2", "n3"],
            [
                ("n0", "n1", "FOLLOWS"),
                ("n1", "n2", "FOLLOWS"),
                ("n2", "n3", "MENTIONS"),
                ("n3", "n0", "MENTIONS"),
            ],
        );
        let index = GraphIndex::build(&data).unwrap();
        let dims = ModelDims {
            num_nodes: 4,
            num_relations: 2,
            embedding_dim: 8,
            hidden_dim: 16,
            num_layers: 2,
        };
        let model = RgcnModel::new(dims, &mut StdRng::seed_from_u64(3), &Device::Cpu).unwrap();
        let plan = EdgePlan::new(index.edges(), 4, 2, &Device::Cpu).unwrap();
        (model, Arc::new(plan))
    }

    fn config() -> TrainingConfig {
        TrainingConfig {
            seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_loss_trend_decreases_over_50_epochs() {
        let (model, plan) = toy();
        let mut trainer = Trainer::new(&model, plan, &config()).unwrap();

        let losses: Vec<f32> = (0..50)
            .map(|_| trainer.train_epoch(&model).unwrap())
            .collect();

        assert!(losses.iter().all(|l| l.is_finite() && *l >= 0.0));
        let head: f32 = losses[..10].iter().sum::<f32>() / 10.0;
        let tail: f32 = losses[40..].iter().sum::<f32>() / 10.0;
        assert!(tail < head, "head {} tail {}", head, tail);
        assert_eq!(trainer.steps(), 50);
    }

    #[test]
    fn test_epoch_updates_parameters() {
        let (model, plan) = toy();
        let before = model.embeddings(&plan).unwrap();
        let mut trainer = Trainer::new(&model, plan.clone(), &config()).unwrap();

        trainer.train_epoch(&model).unwrap();
        assert_ne!(model.embeddings(&plan).unwrap(), before);
    }

    #[test]
    fn test_same_seed_same_losses() {
        let run = || {
            let (model, plan) = toy();
            let mut trainer = Trainer::new(&model, plan, &config()).unwrap();
            (0..5)
                .map(|_| trainer.train_epoch(&model).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_no_edges_is_uninitialized() {
        let (model, _) = toy();
        let empty = Arc::new(EdgePlan::new(&[], 4, 2, &Device::Cpu).unwrap());
        let mut trainer = Trainer::new(&model, empty, &config()).unwrap();
        assert!(matches!(
            trainer.train_epoch(&model),
            Err(AppError::UninitializedModel(_))
        ));
    }
}
