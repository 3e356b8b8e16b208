//! 消息传递计划
//!
//! 把边表按关系分组，预先计算每条边的均值聚合权重 `1 / |N_r(v)|`，
//! 构建一次后在每次前向传播中复用。

use candle_core::{Device, Tensor};

use crate::error::{AppError, Result};
use crate::graph::Edge;

/// 同一关系下的全部边
pub struct RelationGroup {
    pub relation: usize,
    pub sources: Tensor,
    pub targets: Tensor,
    /// 形状 `[len, 1]`，每条边的归一化系数
    pub norm: Tensor,
}

pub struct EdgePlan {
    num_nodes: usize,
    num_relations: usize,
    groups: Vec<RelationGroup>,
    sources: Tensor,
    targets: Tensor,
    num_edges: usize,
}

impl EdgePlan {
    /// 构建计划；引用了 `num_relations` 之外关系的边会直接失败
    pub fn new(
        edges: &[Edge],
        num_nodes: usize,
        num_relations: usize,
        device: &Device,
    ) -> Result<Self> {
        let mut by_relation: Vec<Vec<&Edge>> = vec![Vec::new(); num_relations];
        for edge in edges {
            if edge.source >= num_nodes || edge.target >= num_nodes {
                return Err(AppError::UnknownNode {
                    node: edge.source.max(edge.target),
                    num_nodes,
                });
            }
            by_relation
                .get_mut(edge.relation)
                .ok_or(AppError::UnknownRelation {
                    relation: edge.relation,
                    num_relations,
                })?
                .push(edge);
        }

        let mut groups = Vec::new();
        let mut in_degree = vec![0u32; num_nodes];
        for (relation, group) in by_relation.iter().enumerate() {
            if group.is_empty() {
                continue;
            }

            in_degree.iter_mut().for_each(|d| *d = 0);
            for edge in group {
                in_degree[edge.target] += 1;
            }

            let len = group.len();
            let sources: Vec<u32> = group.iter().map(|e| e.source as u32).collect();
            let targets: Vec<u32> = group.iter().map(|e| e.target as u32).collect();
            let norm: Vec<f32> = group
                .iter()
                .map(|e| 1.0 / in_degree[e.target] as f32)
                .collect();

            groups.push(RelationGroup {
                relation,
                sources: Tensor::from_vec(sources, len, device)?,
                targets: Tensor::from_vec(targets, len, device)?,
                norm: Tensor::from_vec(norm, (len, 1), device)?,
            });
        }

        let num_edges = edges.len();
        let sources: Vec<u32> = edges.iter().map(|e| e.source as u32).collect();
        let targets: Vec<u32> = edges.iter().map(|e| e.target as u32).collect();

        Ok(Self {
            num_nodes,
            num_relations,
            groups,
            sources: Tensor::from_vec(sources, num_edges, device)?,
            targets: Tensor::from_vec(targets, num_edges, device)?,
            num_edges,
        })
    }

    pub fn groups(&self) -> &[RelationGroup] {
        &self.groups
    }

    /// 全部边的源节点，按输入边顺序
    pub fn sources(&self) -> &Tensor {
        &self.sources
    }

    /// 全部边的目标节点，按输入边顺序
    pub fn targets(&self) -> &Tensor {
        &self.targets
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_relations(&self) -> usize {
        self.num_relations
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(source: usize, target: usize, relation: usize) -> Edge {
        Edge {
            source,
            target,
            relation,
        }
    }

    #[test]
    fn test_groups_and_mean_norm() {
        let edges = [edge(0, 2, 0), edge(1, 2, 0), edge(0, 2, 1), edge(2, 0, 0)];
        let plan = EdgePlan::new(&edges, 3, 2, &Device::Cpu).unwrap();

        assert_eq!(plan.num_edges(), 4);
        assert_eq!(plan.groups().len(), 2);

        let r0 = &plan.groups()[0];
        assert_eq!(r0.relation, 0);
        assert_eq!(r0.targets.to_vec1::<u32>().unwrap(), vec![2, 2, 0]);
        let norm: Vec<f32> = r0.norm.flatten_all().unwrap().to_vec1().unwrap();
        assert_eq!(norm, vec![0.5, 0.5, 1.0]);

        let r1 = &plan.groups()[1];
        assert_eq!(r1.relation, 1);
        let norm: Vec<f32> = r1.norm.flatten_all().unwrap().to_vec1().unwrap();
        assert_eq!(norm, vec![1.0]);
    }

    #[test]
    fn test_relations_without_edges_are_skipped() {
        let plan = EdgePlan::new(&[edge(0, 1, 2)], 2, 3, &Device::Cpu).unwrap();
        assert_eq!(plan.groups().len(), 1);
        assert_eq!(plan.groups()[0].relation, 2);
    }

    #[test]
    fn test_unknown_relation_fails_fast() {
        let result = EdgePlan::new(&[edge(0, 1, 3)], 2, 2, &Device::Cpu);
        assert!(matches!(
            result,
            Err(AppError::UnknownRelation {
                relation: 3,
                num_relations: 2
            })
        ));
    }

    #[test]
    fn test_duplicate_edges_count_twice() {
        let plan = EdgePlan::new(&[edge(0, 1, 0), edge(0, 1, 0)], 2, 1, &Device::Cpu).unwrap();
        let norm: Vec<f32> = plan.groups()[0].norm.flatten_all().unwrap().to_vec1().unwrap();
        assert_eq!(norm, vec![0.5, 0.5]);
    }

    #[test]
    fn test_empty_edge_list() {
        let plan = EdgePlan::new(&[], 3, 1, &Device::Cpu).unwrap();
        assert!(plan.groups().is_empty());
        assert_eq!(plan.num_edges(), 0);
    }
}
