//! 图索引
//!
//! 实体 ID 与节点索引、关系名与关系索引之间的双射，构建后不可变。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::error::{AppError, Result};

/// 未提供标签时的默认实体标签
pub const DEFAULT_LABEL: &str = "Entity";

/// 图抽取层交付的原始图数据
///
/// `edges` 与 `edge_types` 平行；`labels` 可以为空，否则与 `entity_ids` 平行。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphData {
    pub entity_ids: Vec<String>,
    pub labels: Vec<String>,
    pub edges: Vec<(usize, usize)>,
    pub edge_types: Vec<usize>,
    pub rel_type_map: HashMap<String, usize>,
}

impl GraphData {
    /// 从命名三元组构建图数据
    ///
    /// 关系索引按首次出现顺序分配。端点不在实体集合中的边被跳过，
    /// 重复的实体 ID 只保留第一次出现。
    pub fn from_triples<'a>(
        entity_ids: impl IntoIterator<Item = &'a str>,
        triples: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    ) -> Self {
        let mut data = GraphData::default();
        let mut node_map: HashMap<&str, usize> = HashMap::new();

        for entity_id in entity_ids {
            if let Entry::Vacant(slot) = node_map.entry(entity_id) {
                slot.insert(data.entity_ids.len());
                data.entity_ids.push(entity_id.to_string());
            }
        }

        for (source, target, relation) in triples {
            let (Some(&s), Some(&t)) = (node_map.get(source), node_map.get(target)) else {
                continue;
            };
            let next = data.rel_type_map.len();
            let r = *data
                .rel_type_map
                .entry(relation.to_string())
                .or_insert(next);
            data.edges.push((s, t));
            data.edge_types.push(r);
        }

        data
    }

    /// 附加与实体平行的标签
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }
}

/// 有向类型边 (源节点, 目标节点, 关系)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub relation: usize,
}

/// 不可变图索引
#[derive(Debug, Clone)]
pub struct GraphIndex {
    node_to_entity: Vec<String>,
    entity_to_node: HashMap<String, usize>,
    labels: Vec<String>,
    relation_names: Vec<String>,
    relation_lookup: HashMap<String, usize>,
    edges: Vec<Edge>,
}

impl GraphIndex {
    /// 从抽取层数据构建索引
    pub fn build(data: &GraphData) -> Result<Self> {
        let num_nodes = data.entity_ids.len();
        if num_nodes == 0 {
            return Err(AppError::EmptyGraph);
        }

        let mut entity_to_node = HashMap::with_capacity(num_nodes);
        for (idx, entity_id) in data.entity_ids.iter().enumerate() {
            if entity_to_node.insert(entity_id.clone(), idx).is_some() {
                return Err(AppError::Validation(format!(
                    "duplicate entity id: {}",
                    entity_id
                )));
            }
        }

        let labels = if data.labels.is_empty() {
            vec![DEFAULT_LABEL.to_string(); num_nodes]
        } else if data.labels.len() == num_nodes {
            data.labels.clone()
        } else {
            return Err(AppError::Validation(format!(
                "{} labels for {} entities",
                data.labels.len(),
                num_nodes
            )));
        };

        let num_relations = data.rel_type_map.len();
        let mut slots: Vec<Option<String>> = vec![None; num_relations];
        for (name, &idx) in &data.rel_type_map {
            match slots.get_mut(idx) {
                Some(slot) if slot.is_none() => *slot = Some(name.clone()),
                _ => {
                    return Err(AppError::Validation(format!(
                        "relation '{}' has non-dense index {}",
                        name, idx
                    )));
                }
            }
        }
        let relation_names: Vec<String> = slots.into_iter().flatten().collect();
        let relation_lookup = relation_names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        if data.edges.len() != data.edge_types.len() {
            return Err(AppError::Validation(format!(
                "{} edges but {} edge types",
                data.edges.len(),
                data.edge_types.len()
            )));
        }

        let mut edges = Vec::with_capacity(data.edges.len());
        for (&(source, target), &relation) in data.edges.iter().zip(&data.edge_types) {
            for node in [source, target] {
                if node >= num_nodes {
                    return Err(AppError::UnknownNode { node, num_nodes });
                }
            }
            if relation >= num_relations {
                return Err(AppError::UnknownRelation {
                    relation,
                    num_relations,
                });
            }
            edges.push(Edge {
                source,
                target,
                relation,
            });
        }

        Ok(Self {
            node_to_entity: data.entity_ids.clone(),
            entity_to_node,
            labels,
            relation_names,
            relation_lookup,
            edges,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.node_to_entity.len()
    }

    pub fn num_relations(&self) -> usize {
        self.relation_names.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// 实体 ID 对应的节点索引；未知 ID 返回 None
    pub fn node_index(&self, entity_id: &str) -> Option<usize> {
        self.entity_to_node.get(entity_id).copied()
    }

    pub fn entity_id(&self, node: usize) -> Option<&str> {
        self.node_to_entity.get(node).map(String::as_str)
    }

    /// 按节点索引排列的全部实体 ID
    pub fn entity_ids(&self) -> &[String] {
        &self.node_to_entity
    }

    pub fn label(&self, node: usize) -> Option<&str> {
        self.labels.get(node).map(String::as_str)
    }

    pub fn relation_index(&self, name: &str) -> Option<usize> {
        self.relation_lookup.get(name).copied()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}
