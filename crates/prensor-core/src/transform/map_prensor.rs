//! Map a whole subtree to a new leaf through ragged or sparse views.
//!
//! ```text
//! session*                        session*
//!   event*                          event*
//!     val_a int32        =>           val_a int32
//!     val_b int32                     val_b int32
//!                                     val_sum int32
//! ```
//!
//! The subtree at `root_path` is projected onto the requested relative
//! paths and evaluated; its leaves are converted to [`RaggedArray`]s or
//! [`SparseArray`]s, handed to the operation, and the result becomes the
//! leaf `root_path.new_name`.

use crate::{
    calculate::{CalculateError, CalculateOptions},
    expr::{Expr, ExprMeta, ExprNode, ExprRef, ExpressionError, same_node},
    node::NodeTensor,
    path::{Path, Step},
    prensor::{Prensor, RaggedArray, SparseArray},
    transform::{add_paths, project},
    value::{PrimitiveType, Values},
};
use std::{collections::BTreeMap, fmt, sync::Arc};

/// Function over the ragged views of the requested paths, in request order.
pub type RaggedOp = Arc<dyn Fn(&[RaggedArray]) -> RaggedArray + Send + Sync>;

/// Function over the sparse views of the requested paths, in request order.
pub type SparseOp = Arc<dyn Fn(&[SparseArray]) -> SparseArray + Send + Sync>;

///
/// LeafSpec
///
/// Declared shape of the leaf an operation produces.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LeafSpec {
    pub is_repeated: bool,
    pub value_type: PrimitiveType,
}

///
/// PrensorOp
///

#[derive(Clone)]
enum PrensorOp {
    Ragged(RaggedOp),
    Sparse(SparseOp),
}

pub fn map_ragged_tensor(
    root: &ExprRef,
    root_path: &Path,
    paths: &[Path],
    op: RaggedOp,
    spec: LeafSpec,
    new_name: Step,
) -> Result<ExprRef, ExpressionError> {
    map_prensor_impl(root, root_path, paths, PrensorOp::Ragged(op), spec, new_name)
}

pub fn map_sparse_tensor(
    root: &ExprRef,
    root_path: &Path,
    paths: &[Path],
    op: SparseOp,
    spec: LeafSpec,
    new_name: Step,
) -> Result<ExprRef, ExpressionError> {
    map_prensor_impl(root, root_path, paths, PrensorOp::Sparse(op), spec, new_name)
}

fn map_prensor_impl(
    root: &ExprRef,
    root_path: &Path,
    paths: &[Path],
    op: PrensorOp,
    spec: LeafSpec,
    new_name: Step,
) -> Result<ExprRef, ExpressionError> {
    let subtree = root.get_descendant_or_error(root_path)?;
    for path in paths {
        let leaf = subtree.get_descendant_or_error(path)?;
        if path.is_empty() || !leaf.is_leaf() {
            return Err(ExpressionError::NotALeaf {
                path: root_path.concat(path),
            });
        }
    }

    let projected = project(&subtree, paths);
    let (source_paths, sources): (Vec<Path>, Vec<ExprRef>) =
        projected.get_known_descendants().into_iter().unzip();

    let mapped = Expr::new(
        ExprMeta::leaf(spec.is_repeated, spec.value_type),
        MapPrensor {
            source_paths,
            sources,
            requested: paths.to_vec(),
            op,
            spec,
        },
    );

    add_paths(root, BTreeMap::from([(root_path.child(new_name), mapped)]))
}

///
/// MapPrensor
///
/// Sources are the known descendants of the projected subtree, sorted by
/// path.
///

struct MapPrensor {
    source_paths: Vec<Path>,
    sources: Vec<ExprRef>,
    requested: Vec<Path>,
    op: PrensorOp,
    spec: LeafSpec,
}

impl MapPrensor {
    fn check_type(&self, values: &Values) -> Result<(), CalculateError> {
        if values.primitive_type() == self.spec.value_type {
            Ok(())
        } else {
            Err(CalculateError::TypeMismatch {
                context: self.name().to_string(),
                expected: self.spec.value_type.to_string(),
                actual: values.primitive_type().to_string(),
            })
        }
    }

    fn ragged_leaf(
        &self,
        tree: &Prensor,
        op: &RaggedOp,
        options: &CalculateOptions,
    ) -> Result<NodeTensor, CalculateError> {
        let inputs = self
            .requested
            .iter()
            .map(|path| tree.get_ragged_tensor(path, options))
            .collect::<Result<Vec<_>, _>>()?;
        let result = op(&inputs);

        if result.nrows() != tree.size() {
            return Err(CalculateError::shape(
                self.name(),
                format!("returned {} rows for a batch of {}", result.nrows(), tree.size()),
            ));
        }
        if result.ragged_rank() != 1 {
            return Err(CalculateError::shape(
                self.name(),
                format!("returned ragged rank {}, expected 1", result.ragged_rank()),
            ));
        }

        let rowids = result.value_rowids();
        if !self.spec.is_repeated
            && options.checks_enabled()
            && rowids.windows(2).any(|pair| pair[1] <= pair[0])
        {
            return Err(CalculateError::shape(
                self.name(),
                "optional result has more than one value in a row",
            ));
        }
        self.check_type(result.values())?;

        Ok(NodeTensor::leaf(rowids, result.values().clone(), self.spec.is_repeated))
    }

    fn sparse_leaf(
        &self,
        tree: &Prensor,
        op: &SparseOp,
        options: &CalculateOptions,
    ) -> Result<NodeTensor, CalculateError> {
        let inputs = self
            .requested
            .iter()
            .map(|path| tree.get_sparse_tensor(path, options))
            .collect::<Result<Vec<_>, _>>()?;
        let result = op(&inputs);

        if result.nrows() != tree.size() as i64 {
            return Err(CalculateError::shape(
                self.name(),
                format!("returned {} rows for a batch of {}", result.nrows(), tree.size()),
            ));
        }

        let expected_rank = if self.spec.is_repeated { 2 } else { 1 };
        if options.checks_enabled() && result.rank() != expected_rank {
            return Err(CalculateError::shape(
                self.name(),
                format!("returned rank {}, expected {expected_rank}", result.rank()),
            ));
        }

        let parent_index = if self.spec.is_repeated {
            result
                .indices
                .iter()
                .map(|index| index.first().copied().unwrap_or(0))
                .collect()
        } else {
            result.indices.iter().flatten().copied().collect()
        };
        self.check_type(&result.values)?;

        Ok(NodeTensor::leaf(parent_index, result.values, self.spec.is_repeated))
    }
}

impl fmt::Debug for MapPrensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapPrensor")
            .field("requested", &self.requested)
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl ExprNode for MapPrensor {
    fn name(&self) -> &'static str {
        match self.op {
            PrensorOp::Ragged(_) => "map_ragged",
            PrensorOp::Sparse(_) => "map_sparse",
        }
    }

    fn source_expressions(&self) -> Vec<ExprRef> {
        self.sources.clone()
    }

    fn calculate(
        &self,
        sources: &[Arc<NodeTensor>],
        _destinations: &[ExprRef],
        options: &CalculateOptions,
    ) -> Result<Arc<NodeTensor>, CalculateError> {
        if sources.len() != self.source_paths.len() {
            return Err(CalculateError::arity(
                self.name(),
                self.source_paths.len(),
                sources.len(),
            ));
        }

        let nodes: BTreeMap<Path, Arc<NodeTensor>> = self
            .source_paths
            .iter()
            .cloned()
            .zip(sources.iter().cloned())
            .collect();
        let tree = Prensor::from_descendant_nodes(&nodes)?;

        let leaf = match &self.op {
            PrensorOp::Ragged(op) => self.ragged_leaf(&tree, op, options)?,
            PrensorOp::Sparse(op) => self.sparse_leaf(&tree, op, options)?,
        };

        Ok(Arc::new(leaf))
    }

    fn calculation_equal(&self, other: &dyn ExprNode) -> bool {
        same_node(self, other)
    }
}
