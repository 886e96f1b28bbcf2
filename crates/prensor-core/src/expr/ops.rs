use crate::{
    expr::{Expr, ExprRef, ExpressionError},
    path::{Path, Step},
    transform::{self, LeafSpec, RaggedOp, SparseOp, ValuesOp},
    value::PrimitiveType,
};
use prensor_schema::node::Schema;
use std::{collections::BTreeMap, sync::Arc};

///
/// Builder operations
///
/// Method forms of the transform library. Each returns a new root and
/// leaves `self` untouched.
///

impl Expr {
    #[must_use]
    pub fn project(self: &Arc<Self>, paths: &[Path]) -> ExprRef {
        transform::project(self, paths)
    }

    pub fn promote(
        self: &Arc<Self>,
        path: &Path,
        new_name: Step,
    ) -> Result<ExprRef, ExpressionError> {
        transform::promote(self, path, new_name)
    }

    pub fn broadcast(
        self: &Arc<Self>,
        path: &Path,
        sibling: &Step,
        new_name: Step,
    ) -> Result<ExprRef, ExpressionError> {
        transform::broadcast(self, path, sibling, new_name)
    }

    pub fn promote_and_broadcast(
        self: &Arc<Self>,
        path_dictionary: &BTreeMap<Step, Path>,
        dest_parent: &Path,
    ) -> Result<ExprRef, ExpressionError> {
        transform::promote_and_broadcast(self, path_dictionary, dest_parent)
    }

    pub fn reroot(self: &Arc<Self>, path: &Path) -> Result<ExprRef, ExpressionError> {
        transform::reroot(self, path)
    }

    pub fn create_proto_index(self: &Arc<Self>, name: Step) -> Result<ExprRef, ExpressionError> {
        transform::create_proto_index(self, name)
    }

    pub fn create_size_field(
        self: &Arc<Self>,
        path: &Path,
        new_name: Step,
    ) -> Result<ExprRef, ExpressionError> {
        transform::size(self, path, new_name)
    }

    pub fn create_has_field(
        self: &Arc<Self>,
        path: &Path,
        new_name: Step,
    ) -> Result<ExprRef, ExpressionError> {
        transform::has(self, path, new_name)
    }

    pub fn slice(
        self: &Arc<Self>,
        path: &Path,
        new_name: Step,
        begin: Option<i64>,
        end: Option<i64>,
    ) -> Result<ExprRef, ExpressionError> {
        transform::slice_expression(self, path, new_name, begin, end)
    }

    pub fn truncate(
        self: &Arc<Self>,
        path: &Path,
        limit: i64,
        new_name: Step,
    ) -> Result<ExprRef, ExpressionError> {
        transform::truncate(self, path, limit, new_name)
    }

    pub fn map_field_values(
        self: &Arc<Self>,
        path: &Path,
        op: ValuesOp,
        output_type: PrimitiveType,
        new_name: Step,
    ) -> Result<ExprRef, ExpressionError> {
        transform::map_values(self, path, op, output_type, new_name)
    }

    pub fn map_sparse_tensors(
        self: &Arc<Self>,
        root_path: &Path,
        paths: &[Path],
        op: SparseOp,
        spec: LeafSpec,
        new_name: Step,
    ) -> Result<ExprRef, ExpressionError> {
        transform::map_sparse_tensor(self, root_path, paths, op, spec, new_name)
    }

    pub fn map_ragged_tensors(
        self: &Arc<Self>,
        root_path: &Path,
        paths: &[Path],
        op: RaggedOp,
        spec: LeafSpec,
        new_name: Step,
    ) -> Result<ExprRef, ExpressionError> {
        transform::map_ragged_tensor(self, root_path, paths, op, spec, new_name)
    }

    pub fn apply_schema(self: &Arc<Self>, schema: &Schema) -> Result<ExprRef, ExpressionError> {
        transform::apply_schema(self, schema)
    }

    #[must_use]
    pub fn limit_depth(self: &Arc<Self>, depth: usize) -> ExprRef {
        transform::limit_depth(self, depth)
    }

    /// Apply an arbitrary transform, for chaining.
    pub fn apply<F, T>(self: &Arc<Self>, f: F) -> T
    where
        F: FnOnce(&ExprRef) -> T,
    {
        f(self)
    }
}
