//! Element filtering shared by slice and the mask filters.
//!
//! A filter is expressed with *selection* leaves: an `int64` leaf whose
//! values are the kept element positions of the original level and whose
//! parent index is the (possibly renumbered) parent of each kept element.
//! A [`Filtered`] node gathers its origin through a selection; its children
//! are filtered through a selection derived from the parent's, so whole
//! subtrees follow the filter.

use crate::{
    calculate::{CalculateError, CalculateOptions},
    expr::{Expr, ExprMeta, ExprNode, ExprRef, ExpressionError, downcast_node, expect_sources},
    node::{NodeKind, NodeTensor},
    path::{Path, Step},
    transform::add_paths,
    value::{PrimitiveType, Values},
};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};

/// Selection leaf built from the kept positions of a level.
fn selection_tensor(parent_index: Vec<i64>, kept: Vec<i64>, is_repeated: bool) -> Arc<NodeTensor> {
    Arc::new(NodeTensor::leaf(parent_index, Values::Int64(kept), is_repeated))
}

fn selection_parts<'a>(
    selection: &'a NodeTensor,
    context: &str,
) -> Result<(&'a [i64], &'a [i64]), CalculateError> {
    let leaf = selection.leaf_or_error(context)?;
    let kept = leaf.values.as_i64().ok_or_else(|| CalculateError::TypeMismatch {
        context: context.to_string(),
        expected: PrimitiveType::Int64.to_string(),
        actual: leaf.values.primitive_type().to_string(),
    })?;

    Ok((&leaf.parent_index, kept))
}

/// Wrap `origin` so that it is filtered through `selection`.
pub(crate) fn filtered(origin: &ExprRef, selection: ExprRef) -> ExprRef {
    Expr::new(
        ExprMeta {
            is_repeated: origin.is_repeated(),
            value_type: origin.value_type(),
            schema_feature: None,
        },
        Filtered {
            origin: Arc::clone(origin),
            selection,
        },
    )
}

pub(crate) fn selection_expr(is_repeated: bool, node: impl ExprNode) -> ExprRef {
    Expr::new(ExprMeta::leaf(is_repeated, PrimitiveType::Int64), node)
}

///
/// filter_by_sibling
///
/// Keep the elements at `path` whose aligned element of the `bool` sibling
/// `mask` is true; the result is added as `parent(path).new_name`. The mask
/// must have exactly one value per element of the field.
///
pub fn filter_by_sibling(
    root: &ExprRef,
    path: &Path,
    mask: &Step,
    new_name: Step,
) -> Result<ExprRef, ExpressionError> {
    let parent_path = path.parent()?;
    let mask_path = parent_path.child(mask.clone());

    let field = root.get_descendant_or_error(path)?;
    let mask_expr = root.get_descendant_or_error(&mask_path)?;
    if !mask_expr.is_leaf() {
        return Err(ExpressionError::NotALeaf { path: mask_path });
    }

    let selection = selection_expr(
        field.is_repeated(),
        MaskSelection {
            field: Arc::clone(&field),
            mask: mask_expr,
        },
    );

    add_paths(
        root,
        BTreeMap::from([(parent_path.child(new_name), filtered(&field, selection))]),
    )
}

///
/// Filtered
///

#[derive(Debug)]
pub(crate) struct Filtered {
    origin: ExprRef,
    selection: ExprRef,
}

impl ExprNode for Filtered {
    fn name(&self) -> &'static str {
        "filtered"
    }

    fn source_expressions(&self) -> Vec<ExprRef> {
        vec![Arc::clone(&self.origin), Arc::clone(&self.selection)]
    }

    fn calculate(
        &self,
        sources: &[Arc<NodeTensor>],
        _destinations: &[ExprRef],
        _options: &CalculateOptions,
    ) -> Result<Arc<NodeTensor>, CalculateError> {
        let [origin, selection] = expect_sources::<2>(sources, self.name())?;
        let (parent_index, kept) = selection_parts(selection, self.name())?;

        let node = match origin.as_ref() {
            NodeTensor::Leaf(leaf) => {
                NodeTensor::leaf(parent_index.to_vec(), leaf.values.gather_i64(kept), leaf.is_repeated)
            }
            NodeTensor::Child(child) => NodeTensor::child(parent_index.to_vec(), child.is_repeated),
            NodeTensor::Root(_) => {
                return Err(CalculateError::kind(self.name(), NodeKind::Child, NodeKind::Root));
            }
        };

        Ok(Arc::new(node))
    }

    fn calculation_equal(&self, other: &dyn ExprNode) -> bool {
        downcast_node::<Self>(other).is_some()
    }

    fn resolve_child(&self, step: &Step) -> Option<ExprRef> {
        let child = self.origin.get_child(step)?;
        let selection = selection_expr(
            child.is_repeated(),
            ChildSelection {
                origin: Arc::clone(&child),
                parent_selection: Arc::clone(&self.selection),
            },
        );

        Some(filtered(&child, selection))
    }

    fn known_field_names(&self) -> BTreeSet<Step> {
        self.origin.known_field_names()
    }
}

///
/// ChildSelection
///
/// Keeps the elements whose parent survived the parent's selection, and
/// renumbers their parents to the parent's new positions.
///

#[derive(Debug)]
struct ChildSelection {
    origin: ExprRef,
    parent_selection: ExprRef,
}

impl ExprNode for ChildSelection {
    fn name(&self) -> &'static str {
        "child_selection"
    }

    fn source_expressions(&self) -> Vec<ExprRef> {
        vec![Arc::clone(&self.origin), Arc::clone(&self.parent_selection)]
    }

    fn calculate(
        &self,
        sources: &[Arc<NodeTensor>],
        _destinations: &[ExprRef],
        _options: &CalculateOptions,
    ) -> Result<Arc<NodeTensor>, CalculateError> {
        let [origin, parent_selection] = expect_sources::<2>(sources, self.name())?;
        let (_, kept_parents) = selection_parts(parent_selection, self.name())?;

        let renumbered: HashMap<i64, i64> = kept_parents
            .iter()
            .enumerate()
            .map(|(new, &old)| (old, new as i64))
            .collect();

        let mut parent_index = Vec::new();
        let mut kept = Vec::new();
        for (position, old_parent) in origin
            .parent_index_or_error(self.name())?
            .iter()
            .enumerate()
        {
            if let Some(&new_parent) = renumbered.get(old_parent) {
                parent_index.push(new_parent);
                kept.push(position as i64);
            }
        }

        Ok(selection_tensor(parent_index, kept, origin.is_repeated()))
    }

    fn calculation_equal(&self, other: &dyn ExprNode) -> bool {
        downcast_node::<Self>(other).is_some()
    }
}

///
/// MaskSelection
///

#[derive(Debug)]
struct MaskSelection {
    field: ExprRef,
    mask: ExprRef,
}

impl ExprNode for MaskSelection {
    fn name(&self) -> &'static str {
        "mask_selection"
    }

    fn source_expressions(&self) -> Vec<ExprRef> {
        vec![Arc::clone(&self.field), Arc::clone(&self.mask)]
    }

    fn calculate(
        &self,
        sources: &[Arc<NodeTensor>],
        _destinations: &[ExprRef],
        _options: &CalculateOptions,
    ) -> Result<Arc<NodeTensor>, CalculateError> {
        let [field, mask] = expect_sources::<2>(sources, self.name())?;
        let parent_index = field.parent_index_or_error(self.name())?;
        let mask = mask.leaf_or_error(self.name())?;
        let Some(flags) = mask.values.as_bool() else {
            return Err(CalculateError::TypeMismatch {
                context: self.name().to_string(),
                expected: PrimitiveType::Bool.to_string(),
                actual: mask.values.primitive_type().to_string(),
            });
        };
        if flags.len() != parent_index.len() {
            return Err(CalculateError::shape(
                self.name(),
                format!(
                    "mask has {} values for {} elements",
                    flags.len(),
                    parent_index.len()
                ),
            ));
        }

        let (parent_index, kept): (Vec<i64>, Vec<i64>) = parent_index
            .iter()
            .zip(flags)
            .enumerate()
            .filter(|(_, (_, keep))| **keep)
            .map(|(position, (&parent, _))| (parent, position as i64))
            .unzip();

        Ok(selection_tensor(parent_index, kept, field.is_repeated()))
    }

    fn calculation_equal(&self, other: &dyn ExprNode) -> bool {
        downcast_node::<Self>(other).is_some()
    }
}
