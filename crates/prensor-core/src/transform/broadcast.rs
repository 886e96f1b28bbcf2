//! Broadcast a leaf onto every element of a sibling.
//!
//! ```text
//! session*                 session*
//!   event*           =>      event*
//!   label int64                nlabel int64
//!                            label int64
//! ```
//!
//! Each element of the sibling receives a copy of every value of the field
//! that shares its parent.

use crate::{
    calculate::{CalculateError, CalculateOptions},
    expr::{Expr, ExprMeta, ExprNode, ExprRef, ExpressionError, downcast_node, expect_sources},
    node::{NodeKind, NodeTensor},
    path::{AnonymousIdAllocator, Path, Step},
    transform::add_paths,
};
use std::{collections::BTreeMap, sync::Arc};

/// Broadcast the leaf at `path` onto `parent(path).child(sibling)`, as the
/// new leaf `new_name` under the sibling.
pub fn broadcast(
    root: &ExprRef,
    path: &Path,
    sibling: &Step,
    new_name: Step,
) -> Result<ExprRef, ExpressionError> {
    broadcast_impl(root, path, sibling, new_name).map(|(root, _)| root)
}

pub fn broadcast_anonymous(
    root: &ExprRef,
    path: &Path,
    sibling: &Step,
    ids: &AnonymousIdAllocator,
) -> Result<(ExprRef, Path), ExpressionError> {
    broadcast_impl(root, path, sibling, ids.next_step())
}

fn broadcast_impl(
    root: &ExprRef,
    path: &Path,
    sibling: &Step,
    new_name: Step,
) -> Result<(ExprRef, Path), ExpressionError> {
    let sibling_path = path.parent()?.child(sibling.clone());
    let new_path = sibling_path.child(new_name);

    let field = root.get_descendant_or_error(path)?;
    let sibling_expr = root.get_descendant_or_error(&sibling_path)?;

    let Some(value_type) = field.value_type() else {
        return Err(ExpressionError::InvalidBroadcast {
            path: path.clone(),
            reason: "only leaves can be broadcast".to_string(),
        });
    };
    if sibling_expr.is_leaf() {
        return Err(ExpressionError::InvalidBroadcast {
            path: path.clone(),
            reason: format!("sibling '{sibling}' is a leaf"),
        });
    }

    let is_repeated = field.is_repeated();
    let broadcast = Expr::new(
        ExprMeta::leaf(is_repeated, value_type),
        Broadcast {
            field,
            sibling: sibling_expr,
            is_repeated,
        },
    );
    let root = add_paths(root, BTreeMap::from([(new_path.clone(), broadcast)]))?;

    Ok((root, new_path))
}

///
/// Broadcast
///

#[derive(Debug)]
struct Broadcast {
    field: ExprRef,
    sibling: ExprRef,
    is_repeated: bool,
}

impl ExprNode for Broadcast {
    fn name(&self) -> &'static str {
        "broadcast"
    }

    fn source_expressions(&self) -> Vec<ExprRef> {
        vec![Arc::clone(&self.field), Arc::clone(&self.sibling)]
    }

    fn calculate(
        &self,
        sources: &[Arc<NodeTensor>],
        _destinations: &[ExprRef],
        _options: &CalculateOptions,
    ) -> Result<Arc<NodeTensor>, CalculateError> {
        let [field, sibling] = expect_sources::<2>(sources, self.name())?;
        let field = field.leaf_or_error(self.name())?;
        let NodeTensor::Child(sibling) = sibling.as_ref() else {
            return Err(CalculateError::kind(self.name(), NodeKind::Child, sibling.kind()));
        };

        let mut by_parent: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (position, &parent) in field.parent_index.iter().enumerate() {
            by_parent.entry(parent).or_default().push(position);
        }

        let mut parent_index = Vec::new();
        let mut positions = Vec::new();
        for (element, parent) in sibling.parent_index.iter().enumerate() {
            for &position in by_parent.get(parent).into_iter().flatten() {
                parent_index.push(element as i64);
                positions.push(position);
            }
        }

        Ok(Arc::new(NodeTensor::leaf(
            parent_index,
            field.values.gather(&positions),
            self.is_repeated,
        )))
    }

    fn calculation_equal(&self, other: &dyn ExprNode) -> bool {
        downcast_node::<Self>(other).is_some()
    }
}
