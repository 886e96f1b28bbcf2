//! Keep a window of every parent's elements.
//!
//! Positions are counted from the start of each parent's run; negative
//! bounds count from its end (`-1` is the last element). An element at
//! position `p` in a run of length `n` is kept when it satisfies both
//! bounds:
//!
//! ```text
//! begin >= 0: p >= begin        begin < 0: p - n >= begin
//! end   >= 0: p <  end          end   < 0: p - n <  end
//! ```
//!
//! Slicing an internal field filters its whole subtree.

use crate::{
    calculate::{CalculateError, CalculateOptions},
    expr::{ExprNode, ExprRef, ExpressionError, downcast_node, expect_sources},
    node::{NodeTensor, clamp_slot, counts_per_parent, positions_in_parent},
    path::{Path, Step},
    transform::{
        add_paths,
        filter::{filtered, selection_expr},
    },
    value::Values,
};
use std::{collections::BTreeMap, sync::Arc};

/// Add `parent(path).new_name` holding the `[begin, end)` window of every
/// parent's elements at `path`.
pub fn slice_expression(
    root: &ExprRef,
    path: &Path,
    new_name: Step,
    begin: Option<i64>,
    end: Option<i64>,
) -> Result<ExprRef, ExpressionError> {
    let parent_path = path.parent()?;
    let field = root.get_descendant_or_error(path)?;
    let parent = root.get_descendant_or_error(&parent_path)?;

    let selection = selection_expr(
        field.is_repeated(),
        SliceSelection {
            field: Arc::clone(&field),
            parent,
            begin,
            end,
        },
    );

    add_paths(
        root,
        BTreeMap::from([(parent_path.child(new_name), filtered(&field, selection))]),
    )
}

/// Keep at most the first `limit` elements of every parent.
pub fn truncate(
    root: &ExprRef,
    path: &Path,
    limit: i64,
    new_name: Step,
) -> Result<ExprRef, ExpressionError> {
    slice_expression(root, path, new_name, None, Some(limit))
}

///
/// SliceSelection
///

#[derive(Debug)]
struct SliceSelection {
    field: ExprRef,
    parent: ExprRef,
    begin: Option<i64>,
    end: Option<i64>,
}

impl SliceSelection {
    fn keeps(&self, position: i64, run: i64) -> bool {
        let from_end = position - run;
        let after_begin = self.begin.is_none_or(|begin| {
            if begin >= 0 {
                position >= begin
            } else {
                from_end >= begin
            }
        });
        let before_end = self.end.is_none_or(|end| {
            if end >= 0 {
                position < end
            } else {
                from_end < end
            }
        });

        after_begin && before_end
    }
}

impl ExprNode for SliceSelection {
    fn name(&self) -> &'static str {
        "slice"
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

        let positions = positions_in_parent(parent_index, parent_size);
        let counts = counts_per_parent(parent_index, parent_size);

        let mut kept_parents = Vec::new();
        let mut kept = Vec::new();
        for (element, (&parent, &position)) in parent_index.iter().zip(&positions).enumerate() {
            let run = clamp_slot(parent, parent_size).map_or(0, |slot| counts[slot]);
            if self.keeps(position, run) {
                kept_parents.push(parent);
                kept.push(element as i64);
            }
        }

        Ok(Arc::new(NodeTensor::leaf(
            kept_parents,
            Values::Int64(kept),
            field.is_repeated(),
        )))
    }

    fn calculation_equal(&self, other: &dyn ExprNode) -> bool {
        downcast_node::<Self>(other)
            .is_some_and(|other| other.begin == self.begin && other.end == self.end)
    }
}
