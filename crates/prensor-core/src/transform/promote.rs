//! Promote a leaf to be a child of its grandparent.
//!
//! ```text
//! session*              session*
//!   event*        =>      event*
//!     val* int64            val* int64
//!                         nval* int64
//! ```
//!
//! The promoted leaf keeps every value; each value's parent becomes the
//! grandparent of the original value.

use crate::{
    calculate::{CalculateError, CalculateOptions},
    expr::{Expr, ExprMeta, ExprNode, ExprRef, ExpressionError, downcast_node, expect_sources},
    node::{NodeKind, NodeTensor, clamp_slot},
    path::{AnonymousIdAllocator, Path, Step},
    transform::add_paths,
};
use prensor_schema::{
    node::{Feature, FeaturePresence, ValueCount},
    types::min_lifecycle_stage,
};
use std::{collections::BTreeMap, sync::Arc};

/// Promote the leaf at `path` to `grandparent(path).child(new_name)`.
pub fn promote(root: &ExprRef, path: &Path, new_name: Step) -> Result<ExprRef, ExpressionError> {
    promote_impl(root, path, new_name).map(|(root, _)| root)
}

/// Promote under a generated anonymous name, returning the new path too.
pub fn promote_anonymous(
    root: &ExprRef,
    path: &Path,
    ids: &AnonymousIdAllocator,
) -> Result<(ExprRef, Path), ExpressionError> {
    promote_impl(root, path, ids.next_step())
}

fn promote_impl(
    root: &ExprRef,
    path: &Path,
    new_name: Step,
) -> Result<(ExprRef, Path), ExpressionError> {
    if path.len() < 2 {
        return Err(ExpressionError::InvalidPromotion {
            path: path.clone(),
            reason: "cannot promote beyond the root".to_string(),
        });
    }

    let parent_path = path.parent()?;
    let new_path = parent_path.parent()?.child(new_name);

    let field = root.get_descendant_or_error(path)?;
    let parent = root.get_descendant_or_error(&parent_path)?;
    let promoted = promote_expr(path, field, parent)?;

    let root = add_paths(root, BTreeMap::from([(new_path.clone(), promoted)]))?;

    Ok((root, new_path))
}

fn promote_expr(path: &Path, field: ExprRef, parent: ExprRef) -> Result<ExprRef, ExpressionError> {
    let Some(value_type) = field.value_type() else {
        return Err(ExpressionError::InvalidPromotion {
            path: path.clone(),
            reason: "only leaves can be promoted".to_string(),
        });
    };
    if parent.is_leaf() {
        return Err(ExpressionError::InvalidPromotion {
            path: path.clone(),
            reason: "the parent is a leaf".to_string(),
        });
    }

    let is_repeated = field.is_repeated() || parent.is_repeated();
    let feature = promote_schema_feature(field.schema_feature(), parent.schema_feature());
    let meta = ExprMeta::leaf(is_repeated, value_type).with_schema_feature(feature);

    Ok(Expr::new(
        meta,
        Promote {
            field,
            parent,
            is_repeated,
        },
    ))
}

///
/// promote_schema_feature
///
/// Fuse the metadata of a leaf and its parent into the metadata of the
/// promoted leaf. Count and presence bounds survive only when the parent is
/// dense with a positive count, scaled by that count.
///
#[must_use]
pub fn promote_schema_feature(original: Option<&Feature>, parent: Option<&Feature>) -> Option<Feature> {
    let (original, parent) = (original?, parent?);

    let mut result = Feature {
        feature_type: original.feature_type,
        lifecycle_stage: min_lifecycle_stage(original.lifecycle_stage, parent.lifecycle_stage),
        distribution_constraints: original.distribution_constraints,
        domain_info: original.domain_info.clone(),
        ..Feature::default()
    };

    let parent_size = parent
        .value_count
        .and_then(|count| count.min)
        .filter(|&size| size > 0 && parent.is_dense());

    if let Some(size) = parent_size {
        if let Some(count) = original.value_count {
            result.value_count = Some(ValueCount {
                min: count.min.map(|min| min.saturating_mul(size)),
                max: count.max.map(|max| max.saturating_mul(size)),
            });
        }

        if let Some(presence) = original.presence {
            result.presence = Some(FeaturePresence {
                min_fraction: presence.min_fraction.map(|fraction| {
                    if (fraction - 1.0).abs() < f64::EPSILON {
                        1.0
                    } else {
                        fraction / size as f64
                    }
                }),
                min_count: presence.min_count.map(|count| count / size),
            });
        }
    }

    Some(result)
}

///
/// Promote
///

#[derive(Debug)]
struct Promote {
    field: ExprRef,
    parent: ExprRef,
    is_repeated: bool,
}

impl ExprNode for Promote {
    fn name(&self) -> &'static str {
        "promote"
    }

    fn source_expressions(&self) -> Vec<ExprRef> {
        vec![Arc::clone(&self.field), Arc::clone(&self.parent)]
    }

    fn calculate(
        &self,
        sources: &[Arc<NodeTensor>],
        _destinations: &[ExprRef],
        _options: &CalculateOptions,
    ) -> Result<Arc<NodeTensor>, CalculateError> {
        let [field, parent] = expect_sources::<2>(sources, self.name())?;
        let field = field.leaf_or_error(self.name())?;
        let NodeTensor::Child(parent) = parent.as_ref() else {
            return Err(CalculateError::kind(self.name(), NodeKind::Child, parent.kind()));
        };

        let grandparent_index = &parent.parent_index;
        let parent_index = field
            .parent_index
            .iter()
            .map(|&i| clamp_slot(i, grandparent_index.len()).map_or(0, |slot| grandparent_index[slot]))
            .collect();

        Ok(Arc::new(NodeTensor::leaf(
            parent_index,
            field.values.clone(),
            self.is_repeated,
        )))
    }

    fn calculation_equal(&self, other: &dyn ExprNode) -> bool {
        downcast_node::<Self>(other).is_some()
    }
}
