//! 负采样
//!
//! 源节点和目标节点独立、均匀地从 `[0, num_nodes)` 抽取，
//! 不排除恰好是真实边或自环的样本。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct NegativeSampler {
    rng: StdRng,
    num_nodes: usize,
    multiplier: usize,
}

impl NegativeSampler {
    /// `seed` 为 None 时使用系统熵
    pub fn new(num_nodes: usize, multiplier: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            num_nodes,
            multiplier,
        }
    }

    /// 为 `num_edges` 条正边生成 `multiplier × num_edges` 对负样本
    pub fn sample(&mut self, num_edges: usize) -> (Vec<u32>, Vec<u32>) {
        let count = num_edges * self.multiplier;
        if self.num_nodes == 0 {
            return (Vec::new(), Vec::new());
        }
        let sources = (0..count)
            .map(|_| self.rng.gen_range(0..self.num_nodes) as u32)
            .collect();
        let targets = (0..count)
            .map(|_| self.rng.gen_range(0..self.num_nodes) as u32)
            .collect();
        (sources, targets)
    }
}
