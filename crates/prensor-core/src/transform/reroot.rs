//! Make a descendant the new record level.
//!
//! After `reroot(root, doc)` every `doc` element is a root row; the root
//! remembers, through `input_row_index`, which original row each new row
//! came from.

use crate::{
    calculate::{CalculateError, CalculateOptions},
    expr::{Expr, ExprMeta, ExprNode, ExprRef, ExpressionError, downcast_node, expect_sources},
    node::{NodeKind, NodeTensor, RootNodeTensor, clamp_slot},
    path::{Path, Step},
    transform::add_paths,
    value::PrimitiveType,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

/// A new root whose rows are the elements at `path`.
pub fn reroot(root: &ExprRef, path: &Path) -> Result<ExprRef, ExpressionError> {
    if path.is_empty() {
        return Ok(Arc::clone(root));
    }

    let chain = (0..=path.len())
        .map(|depth| root.get_descendant_or_error(&path.prefix(depth)))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(%path, "rerooting");

    Ok(Expr::new(ExprMeta::internal(true), Reroot { chain }))
}

/// Add a non-repeated `int64` root field holding, for every row, the index
/// of the input row it came from.
pub fn create_proto_index(root: &ExprRef, name: Step) -> Result<ExprRef, ExpressionError> {
    let index = Expr::new(
        ExprMeta::leaf(false, PrimitiveType::Int64),
        InputRowIndex {
            root: Arc::clone(root),
        },
    );

    add_paths(root, BTreeMap::from([(Path::from(name), index)]))
}

///
/// Reroot
///
/// `chain` holds the original root followed by every level down to the new
/// root.
///

#[derive(Debug)]
struct Reroot {
    chain: Vec<ExprRef>,
}

impl Reroot {
    fn target(&self) -> Option<&ExprRef> {
        self.chain.last()
    }
}

impl ExprNode for Reroot {
    fn name(&self) -> &'static str {
        "reroot"
    }

    fn source_expressions(&self) -> Vec<ExprRef> {
        self.chain.clone()
    }

    fn calculate(
        &self,
        sources: &[Arc<NodeTensor>],
        _destinations: &[ExprRef],
        _options: &CalculateOptions,
    ) -> Result<Arc<NodeTensor>, CalculateError> {
        if sources.len() != self.chain.len() {
            return Err(CalculateError::arity(self.name(), self.chain.len(), sources.len()));
        }

        let Some((first, levels)) = sources.split_first() else {
            return Err(CalculateError::arity(self.name(), 1, 0));
        };
        let Some(old_root) = first.as_root() else {
            return Err(CalculateError::kind(self.name(), NodeKind::Root, first.kind()));
        };

        let mut rows = old_root.input_row_index.clone();
        for level in levels {
            let parent_index = level.parent_index_or_error(self.name())?;
            rows = parent_index
                .iter()
                .map(|&i| clamp_slot(i, rows.len()).map_or(0, |slot| rows[slot]))
                .collect();
        }

        Ok(Arc::new(RootNodeTensor::with_input_rows(rows).into()))
    }

    fn calculation_equal(&self, other: &dyn ExprNode) -> bool {
        downcast_node::<Self>(other).is_some()
    }

    fn resolve_child(&self, step: &Step) -> Option<ExprRef> {
        self.target()?.get_child(step)
    }

    fn known_field_names(&self) -> BTreeSet<Step> {
        self.target()
            .map(|target| target.known_field_names())
            .unwrap_or_default()
    }
}

///
/// InputRowIndex
///

#[derive(Debug)]
struct InputRowIndex {
    root: ExprRef,
}

impl ExprNode for InputRowIndex {
    fn name(&self) -> &'static str {
        "input_row_index"
    }

    fn source_expressions(&self) -> Vec<ExprRef> {
        vec![Arc::clone(&self.root)]
    }

    fn calculate(
        &self,
        sources: &[Arc<NodeTensor>],
        _destinations: &[ExprRef],
        _options: &CalculateOptions,
    ) -> Result<Arc<NodeTensor>, CalculateError> {
        let [root] = expect_sources::<1>(sources, self.name())?;
        let Some(root) = root.as_root() else {
            return Err(CalculateError::kind(self.name(), NodeKind::Root, root.kind()));
        };

        Ok(Arc::new(NodeTensor::leaf(
            (0..root.size as i64).collect(),
            root.input_row_index.clone(),
            false,
        )))
    }

    fn calculation_equal(&self, other: &dyn ExprNode) -> bool {
        downcast_node::<Self>(other).is_some()
    }
}
