//! Index of every element within its parent.
//!
//! For `friends` with parent index `[0, 1, 1, 2, 3]` the positional index is
//! `[0, 0, 1, 0, 0]` and the index from the end is `[-1, -2, -1, -1, -1]`.
//! The new `int64` field is a sibling with the same parent index and
//! repeatedness as the original.

use crate::{
    calculate::{CalculateError, CalculateOptions},
    expr::{Expr, ExprMeta, ExprNode, ExprRef, ExpressionError, downcast_node, expect_sources},
    node::{NodeTensor, clamp_slot, counts_per_parent, positions_in_parent},
    path::{AnonymousIdAllocator, Path, Step},
    transform::add_paths,
    value::PrimitiveType,
};
use std::{collections::BTreeMap, sync::Arc};

pub fn get_positional_index(
    root: &ExprRef,
    path: &Path,
    new_name: Step,
) -> Result<ExprRef, ExpressionError> {
    index_impl(root, path, new_name, false).map(|(root, _)| root)
}

pub fn get_positional_index_anonymous(
    root: &ExprRef,
    path: &Path,
    ids: &AnonymousIdAllocator,
) -> Result<(ExprRef, Path), ExpressionError> {
    index_impl(root, path, ids.next_step(), false)
}

pub fn get_index_from_end(
    root: &ExprRef,
    path: &Path,
    new_name: Step,
) -> Result<ExprRef, ExpressionError> {
    index_impl(root, path, new_name, true).map(|(root, _)| root)
}

pub fn get_index_from_end_anonymous(
    root: &ExprRef,
    path: &Path,
    ids: &AnonymousIdAllocator,
) -> Result<(ExprRef, Path), ExpressionError> {
    index_impl(root, path, ids.next_step(), true)
}

fn index_impl(
    root: &ExprRef,
    path: &Path,
    new_name: Step,
    from_end: bool,
) -> Result<(ExprRef, Path), ExpressionError> {
    let parent_path = path.parent()?;
    let new_path = parent_path.child(new_name);

    let field = root.get_descendant_or_error(path)?;
    let parent = root.get_descendant_or_error(&parent_path)?;
    let is_repeated = field.is_repeated();

    let index = Expr::new(
        ExprMeta::leaf(is_repeated, PrimitiveType::Int64),
        Index {
            field,
            parent,
            from_end,
            is_repeated,
        },
    );
    let root = add_paths(root, BTreeMap::from([(new_path.clone(), index)]))?;

    Ok((root, new_path))
}

///
/// Index
///

#[derive(Debug)]
struct Index {
    field: ExprRef,
    parent: ExprRef,
    from_end: bool,
    is_repeated: bool,
}

impl ExprNode for Index {
    fn name(&self) -> &'static str {
        if self.from_end {
            "index_from_end"
        } else {
            "positional_index"
        }
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
        let parent_index = field.parent_index_or_error(self.name())?;
        let parent_size = parent.size();

        let mut positions = positions_in_parent(parent_index, parent_size);
        if self.from_end {
            let counts = counts_per_parent(parent_index, parent_size);
            for (position, &parent) in positions.iter_mut().zip(parent_index) {
                let run = clamp_slot(parent, parent_size).map_or(0, |slot| counts[slot]);
                *position -= run;
            }
        }

        Ok(Arc::new(NodeTensor::leaf(
            parent_index.to_vec(),
            positions,
            self.is_repeated,
        )))
    }

    fn calculation_equal(&self, other: &dyn ExprNode) -> bool {
        downcast_node::<Self>(other).is_some_and(|other| other.from_end == self.from_end)
    }
}
