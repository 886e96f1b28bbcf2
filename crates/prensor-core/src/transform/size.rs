//! Per-parent counts and presence of a field.
//!
//! `size(root, doc.bar, n)` adds `doc.n`, a non-repeated `int64` holding the
//! number of `bar` values of every `doc`; `has` adds a `bool` that is true
//! when that number is positive. Parents without values get `0` / `false`.

use crate::{
    calculate::{CalculateError, CalculateOptions},
    expr::{Expr, ExprMeta, ExprNode, ExprRef, ExpressionError, downcast_node, expect_sources},
    node::{NodeTensor, counts_per_parent},
    path::{AnonymousIdAllocator, Path, Step},
    transform::add_paths,
    value::{PrimitiveType, Values},
};
use std::{collections::BTreeMap, sync::Arc};

///
/// SizeKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SizeKind {
    Count,
    Has,
}

impl SizeKind {
    const fn primitive_type(self) -> PrimitiveType {
        match self {
            Self::Count => PrimitiveType::Int64,
            Self::Has => PrimitiveType::Bool,
        }
    }
}

/// Add `parent(path).new_name` counting the values at `path` per parent.
pub fn size(root: &ExprRef, path: &Path, new_name: Step) -> Result<ExprRef, ExpressionError> {
    size_impl(root, path, new_name, SizeKind::Count).map(|(root, _)| root)
}

pub fn size_anonymous(
    root: &ExprRef,
    path: &Path,
    ids: &AnonymousIdAllocator,
) -> Result<(ExprRef, Path), ExpressionError> {
    size_impl(root, path, ids.next_step(), SizeKind::Count)
}

/// Add `parent(path).new_name`, true where the parent has a value at `path`.
pub fn has(root: &ExprRef, path: &Path, new_name: Step) -> Result<ExprRef, ExpressionError> {
    size_impl(root, path, new_name, SizeKind::Has).map(|(root, _)| root)
}

pub fn has_anonymous(
    root: &ExprRef,
    path: &Path,
    ids: &AnonymousIdAllocator,
) -> Result<(ExprRef, Path), ExpressionError> {
    size_impl(root, path, ids.next_step(), SizeKind::Has)
}

fn size_impl(
    root: &ExprRef,
    path: &Path,
    new_name: Step,
    kind: SizeKind,
) -> Result<(ExprRef, Path), ExpressionError> {
    let parent_path = path.parent()?;
    let new_path = parent_path.child(new_name);

    let field = root.get_descendant_or_error(path)?;
    let parent = root.get_descendant_or_error(&parent_path)?;

    let size = Expr::new(
        ExprMeta::leaf(false, kind.primitive_type()),
        Size {
            field,
            parent,
            kind,
        },
    );
    let root = add_paths(root, BTreeMap::from([(new_path.clone(), size)]))?;

    Ok((root, new_path))
}

///
/// Size
///

#[derive(Debug)]
struct Size {
    field: ExprRef,
    parent: ExprRef,
    kind: SizeKind,
}

impl ExprNode for Size {
    fn name(&self) -> &'static str {
        match self.kind {
            SizeKind::Count => "size",
            SizeKind::Has => "has",
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
        let parent_size = parent.size();
        let counts = counts_per_parent(field.parent_index_or_error(self.name())?, parent_size);

        let values = match self.kind {
            SizeKind::Count => Values::Int64(counts),
            SizeKind::Has => Values::Bool(counts.into_iter().map(|count| count > 0).collect()),
        };

        Ok(Arc::new(NodeTensor::leaf(
            (0..parent_size as i64).collect(),
            values,
            false,
        )))
    }

    fn calculation_equal(&self, other: &dyn ExprNode) -> bool {
        downcast_node::<Self>(other).is_some_and(|other| other.kind == self.kind)
    }
}
