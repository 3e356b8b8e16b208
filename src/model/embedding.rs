//! 可学习的逐节点嵌入表

use candle_core::{DType, Device, Tensor, Var};
use rand::Rng;
use rand::rngs::StdRng;

use crate::error::{AppError, Result};

/// Glorot/Xavier 均匀初始化，范围 ±sqrt(6 / (fan_in + fan_out))
pub(crate) fn xavier_uniform(
    rng: &mut StdRng,
    rows: usize,
    cols: usize,
    device: &Device,
) -> Result<Var> {
    let bound = (6.0 / (rows + cols) as f64).sqrt() as f32;
    let values: Vec<f32> = (0..rows * cols)
        .map(|_| rng.gen_range(-bound..=bound))
        .collect();
    let tensor = Tensor::from_vec(values, (rows, cols), device)?;
    Ok(Var::from_tensor(&tensor)?)
}

/// 形状为 `[num_nodes, embedding_dim]` 的嵌入表，卷积栈的第 0 层输入
pub struct EmbeddingTable {
    weight: Var,
    num_nodes: usize,
    dim: usize,
}

impl EmbeddingTable {
    pub fn new(num_nodes: usize, dim: usize, rng: &mut StdRng, device: &Device) -> Result<Self> {
        let weight = xavier_uniform(rng, num_nodes, dim, device)?;
        Ok(Self {
            weight,
            num_nodes,
            dim,
        })
    }

    /// 单个节点的嵌入向量
    pub fn get(&self, node: usize) -> Result<Vec<f32>> {
        if node >= self.num_nodes {
            return Err(AppError::UnknownNode {
                node,
                num_nodes: self.num_nodes,
            });
        }
        Ok(self.weight.as_tensor().get(node)?.to_vec1::<f32>()?)
    }

    /// 一组节点的嵌入，形状 `[nodes.len(), dim]`
    pub fn get_many(&self, nodes: &[usize]) -> Result<Tensor> {
        let mut ids = Vec::with_capacity(nodes.len());
        for &node in nodes {
            if node >= self.num_nodes {
                return Err(AppError::UnknownNode {
                    node,
                    num_nodes: self.num_nodes,
                });
            }
            ids.push(node as u32);
        }
        let ids = Tensor::from_vec(ids, nodes.len(), self.weight.device())?;
        Ok(self.weight.as_tensor().index_select(&ids, 0)?)
    }

    /// 整张嵌入表
    pub fn as_tensor(&self) -> &Tensor {
        self.weight.as_tensor()
    }

    pub(crate) fn var(&self) -> &Var {
        &self.weight
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn dtype(&self) -> DType {
        self.weight.dtype()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_table_shape_and_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let table = EmbeddingTable::new(10, 4, &mut rng, &Device::Cpu).unwrap();

        assert_eq!(table.as_tensor().dims(), &[10, 4]);
        assert_eq!(table.dtype(), DType::F32);

        let bound = (6.0f32 / 14.0).sqrt();
        for row in table.as_tensor().to_vec2::<f32>().unwrap() {
            assert!(row.iter().all(|v| v.abs() <= bound));
        }
    }

    #[test]
    fn test_get_matches_get_many() {
        let mut rng = StdRng::seed_from_u64(2);
        let table = EmbeddingTable::new(5, 3, &mut rng, &Device::Cpu).unwrap();

        let rows = table.get_many(&[4, 1]).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(rows[0], table.get(4).unwrap());
        assert_eq!(rows[1], table.get(1).unwrap());
    }

    #[test]
    fn test_out_of_range_node() {
        let mut rng = StdRng::seed_from_u64(3);
        let table = EmbeddingTable::new(2, 3, &mut rng, &Device::Cpu).unwrap();
        assert!(table.get(2).is_err());
        assert!(table.get_many(&[0, 7]).is_err());
    }

    #[test]
    fn test_seeded_init_is_reproducible() {
        let a = EmbeddingTable::new(3, 3, &mut StdRng::seed_from_u64(9), &Device::Cpu).unwrap();
        let b = EmbeddingTable::new(3, 3, &mut StdRng::seed_from_u64(9), &Device::Cpu).unwrap();
        assert_eq!(
            a.as_tensor().to_vec2::<f32>().unwrap(),
            b.as_tensor().to_vec2::<f32>().unwrap()
        );
    }
}
