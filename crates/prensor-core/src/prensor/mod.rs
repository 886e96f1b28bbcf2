//! Materialized prensors and their consolidated views.

mod ragged;
mod sparse;


pub use ragged::RaggedArray;
pub use sparse::SparseArray;

use crate::{
    calculate::{CalculateError, CalculateOptions},
    node::{NodeKind, NodeTensor, clamp_slot, counts_per_parent, positions_in_parent, row_splits},
    path::{Path, Step},
};
use std::{collections::BTreeMap, sync::Arc};

///
/// Prensor
///
/// A node tensor plus its named children. The root of a prensor need not
/// hold a [`NodeTensor::Root`]; any subtree is itself a prensor.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Prensor {
    node: Arc<NodeTensor>,
    children: BTreeMap<Step, Self>,
}

impl Prensor {
    #[must_use]
    pub fn new(node: impl Into<Arc<NodeTensor>>) -> Self {
        Self {
            node: node.into(),
            children: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn from_children(node: impl Into<Arc<NodeTensor>>, children: BTreeMap<Step, Self>) -> Self {
        Self {
            node: node.into(),
            children,
        }
    }

    /// Builder-style child insertion.
    #[must_use]
    pub fn with_child(mut self, step: Step, child: Self) -> Self {
        self.children.insert(step, child);
        self
    }

    ///
    /// from_descendant_nodes
    ///
    /// Assemble a tree from a map of relative paths to node tensors. The map
    /// must hold the empty path and the parent of every other path.
    ///
    pub fn from_descendant_nodes(
        nodes: &BTreeMap<Path, Arc<NodeTensor>>,
    ) -> Result<Self, CalculateError> {
        for path in nodes.keys().filter(|path| !path.is_empty()) {
            let parent = path.prefix(path.len() - 1);
            if !nodes.contains_key(&parent) {
                return Err(CalculateError::MissingSource {
                    context: format!("prensor node '{parent}'"),
                });
            }
        }

        Self::build_at(nodes, &Path::root())
    }

    fn build_at(
        nodes: &BTreeMap<Path, Arc<NodeTensor>>,
        at: &Path,
    ) -> Result<Self, CalculateError> {
        let node = nodes
            .get(at)
            .ok_or_else(|| CalculateError::MissingSource {
                context: format!("prensor node '{at}'"),
            })?;

        let mut children = BTreeMap::new();
        for path in nodes
            .range(at.clone()..)
            .map(|(path, _)| path)
            .take_while(|path| at.is_ancestor_of(path))
            .filter(|path| path.len() == at.len() + 1)
        {
            if let Some(step) = path.last() {
                children.insert(step.clone(), Self::build_at(nodes, path)?);
            }
        }

        Ok(Self::from_children(Arc::clone(node), children))
    }

    #[must_use]
    pub fn node(&self) -> &NodeTensor {
        &self.node
    }

    #[must_use]
    pub const fn node_arc(&self) -> &Arc<NodeTensor> {
        &self.node
    }

    #[must_use]
    pub const fn children(&self) -> &BTreeMap<Step, Self> {
        &self.children
    }

    #[must_use]
    pub fn get_child(&self, step: &Step) -> Option<&Self> {
        self.children.get(step)
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.node.kind() == NodeKind::Leaf
    }

    /// Number of elements at this level.
    #[must_use]
    pub fn size(&self) -> usize {
        self.node.size()
    }

    #[must_use]
    pub fn get_descendant(&self, path: &Path) -> Option<&Self> {
        path.steps()
            .iter()
            .try_fold(self, |current, step| current.get_child(step))
    }

    /// Every node of the tree keyed by its relative path, the root included.
    #[must_use]
    pub fn get_descendants(&self) -> BTreeMap<Path, &Self> {
        let mut out = BTreeMap::new();
        self.collect_descendants(&Path::root(), &mut out);

        out
    }

    fn collect_descendants<'a>(&'a self, at: &Path, out: &mut BTreeMap<Path, &'a Self>) {
        out.insert(at.clone(), self);
        for (step, child) in &self.children {
            child.collect_descendants(&at.child(step.clone()), out);
        }
    }

    /// Relative paths of every leaf.
    #[must_use]
    pub fn leaf_paths(&self) -> Vec<Path> {
        self.get_descendants()
            .into_iter()
            .filter(|(_, prensor)| prensor.is_leaf())
            .map(|(path, _)| path)
            .collect()
    }

    /// Check every level against the size of its parent.
    pub fn validate(&self) -> Result<(), CalculateError> {
        self.node.validate(None, "root")?;
        self.validate_children(&Path::root())
    }

    fn validate_children(&self, at: &Path) -> Result<(), CalculateError> {
        let size = self.size();
        for (step, child) in &self.children {
            let path = at.child(step.clone());
            child.node.validate(Some(size), &path.to_string())?;
            child.validate_children(&path)?;
        }

        Ok(())
    }

    // The nodes along `path`, excluding this one. The last must be a leaf.
    fn leaf_chain(&self, path: &Path) -> Result<Vec<&NodeTensor>, CalculateError> {
        let mut current = self;
        let mut chain = Vec::with_capacity(path.len());
        for step in path {
            current = current
                .get_child(step)
                .ok_or_else(|| CalculateError::MissingSource {
                    context: format!("prensor path '{path}'"),
                })?;
            chain.push(current.node());
        }

        match chain.last() {
            Some(last) if last.kind() == NodeKind::Leaf => Ok(chain),
            Some(last) => Err(CalculateError::kind(
                path.to_string(),
                NodeKind::Leaf,
                last.kind(),
            )),
            None => Err(CalculateError::kind(
                path.to_string(),
                NodeKind::Leaf,
                self.node.kind(),
            )),
        }
    }

    ///
    /// get_ragged_tensor
    ///
    /// Ragged view of the leaf at `path`. When checks are enabled every level
    /// is validated first; otherwise malformed parent indices are clamped.
    ///
    pub fn get_ragged_tensor(
        &self,
        path: &Path,
        options: &CalculateOptions,
    ) -> Result<RaggedArray, CalculateError> {
        let chain = self.leaf_chain(path)?;
        let context = path.to_string();

        let mut size = self.size();
        let mut splits = Vec::with_capacity(chain.len());
        for node in &chain {
            if options.checks_enabled() {
                node.validate(Some(size), &context)?;
            }
            let parent_index = node.parent_index_or_error(&context)?;
            splits.push(row_splits(parent_index, size));
            size = node.size();
        }

        let values = chain
            .last()
            .and_then(|node| node.values())
            .cloned()
            .ok_or_else(|| CalculateError::MissingSource {
                context: context.clone(),
            })?;

        Ok(RaggedArray::new(splits, values))
    }

    /// Ragged views of every leaf.
    pub fn get_ragged_tensors(
        &self,
        options: &CalculateOptions,
    ) -> Result<BTreeMap<Path, RaggedArray>, CalculateError> {
        self.leaf_paths()
            .into_iter()
            .map(|path| {
                let ragged = self.get_ragged_tensor(&path, options)?;
                Ok((path, ragged))
            })
            .collect()
    }

    ///
    /// get_sparse_tensor
    ///
    /// Coordinate view of the leaf at `path`. Each repeated level adds a
    /// dimension as wide as its longest run.
    ///
    pub fn get_sparse_tensor(
        &self,
        path: &Path,
        options: &CalculateOptions,
    ) -> Result<SparseArray, CalculateError> {
        let chain = self.leaf_chain(path)?;
        let context = path.to_string();

        let mut size = self.size();
        let mut indices: Vec<Vec<i64>> = (0..size as i64).map(|row| vec![row]).collect();
        let mut dense_shape = vec![size as i64];

        for node in &chain {
            if options.checks_enabled() {
                node.validate(Some(size), &context)?;
            }
            let parent_index = node.parent_index_or_error(&context)?;
            let positions = positions_in_parent(parent_index, size);

            let next: Vec<Vec<i64>> = parent_index
                .iter()
                .zip(&positions)
                .map(|(&parent, &position)| {
                    let mut index = clamp_slot(parent, indices.len())
                        .map_or_else(|| vec![0; dense_shape.len()], |slot| indices[slot].clone());
                    if node.is_repeated() {
                        index.push(position);
                    }
                    index
                })
                .collect();

            if node.is_repeated() {
                let widest = counts_per_parent(parent_index, size)
                    .into_iter()
                    .max()
                    .unwrap_or(0);
                dense_shape.push(widest);
            }

            indices = next;
            size = node.size();
        }

        let values = chain
            .last()
            .and_then(|node| node.values())
            .cloned()
            .ok_or_else(|| CalculateError::MissingSource {
                context: context.clone(),
            })?;

        Ok(SparseArray::new(indices, values, dense_shape))
    }

    /// Sparse views of every leaf.
    pub fn get_sparse_tensors(
        &self,
        options: &CalculateOptions,
    ) -> Result<BTreeMap<Path, SparseArray>, CalculateError> {
        self.leaf_paths()
            .into_iter()
            .map(|path| {
                let sparse = self.get_sparse_tensor(&path, options)?;
                Ok((path, sparse))
            })
            .collect()
    }
}
