use crate::{
    calculate::{CalculateError, CalculateOptions},
    expr::{Expr, ExprMeta, ExprNode, ExprRef, ExpressionError, expect_sources, same_node},
    node::NodeTensor,
    path::{AnonymousIdAllocator, Path, Step},
    transform::add_paths,
    value::{PrimitiveType, Values},
};
use std::{collections::BTreeMap, fmt, sync::Arc};

/// Element-wise function over a leaf's values.
///
/// Must return one value per input value, of the declared output type.
pub type ValuesOp = Arc<dyn Fn(&Values) -> Values + Send + Sync>;

/// Add `parent(path).new_name`, a leaf holding `op` applied to the values at
/// `path` with the same parent index.
pub fn map_values(
    root: &ExprRef,
    path: &Path,
    op: ValuesOp,
    output_type: PrimitiveType,
    new_name: Step,
) -> Result<ExprRef, ExpressionError> {
    map_values_impl(root, path, op, output_type, new_name).map(|(root, _)| root)
}

pub fn map_values_anonymous(
    root: &ExprRef,
    path: &Path,
    op: ValuesOp,
    output_type: PrimitiveType,
    ids: &AnonymousIdAllocator,
) -> Result<(ExprRef, Path), ExpressionError> {
    map_values_impl(root, path, op, output_type, ids.next_step())
}

fn map_values_impl(
    root: &ExprRef,
    path: &Path,
    op: ValuesOp,
    output_type: PrimitiveType,
    new_name: Step,
) -> Result<(ExprRef, Path), ExpressionError> {
    let new_path = path.parent()?.child(new_name);
    let field = root.get_descendant_or_error(path)?;
    if !field.is_leaf() {
        return Err(ExpressionError::NotALeaf { path: path.clone() });
    }

    let is_repeated = field.is_repeated();
    let mapped = Expr::new(
        ExprMeta::leaf(is_repeated, output_type),
        MapValues {
            field,
            op,
            output_type,
        },
    );
    let root = add_paths(root, BTreeMap::from([(new_path.clone(), mapped)]))?;

    Ok((root, new_path))
}

///
/// MapValues
///

struct MapValues {
    field: ExprRef,
    op: ValuesOp,
    output_type: PrimitiveType,
}

impl fmt::Debug for MapValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapValues")
            .field("field", &self.field)
            .field("output_type", &self.output_type)
            .finish_non_exhaustive()
    }
}

impl ExprNode for MapValues {
    fn name(&self) -> &'static str {
        "map_values"
    }

    fn source_expressions(&self) -> Vec<ExprRef> {
        vec![Arc::clone(&self.field)]
    }

    fn calculate(
        &self,
        sources: &[Arc<NodeTensor>],
        _destinations: &[ExprRef],
        _options: &CalculateOptions,
    ) -> Result<Arc<NodeTensor>, CalculateError> {
        let [field] = expect_sources::<1>(sources, self.name())?;
        let field = field.leaf_or_error(self.name())?;

        let values = (self.op)(&field.values);
        if values.primitive_type() != self.output_type {
            return Err(CalculateError::TypeMismatch {
                context: self.name().to_string(),
                expected: self.output_type.to_string(),
                actual: values.primitive_type().to_string(),
            });
        }
        if values.len() != field.values.len() {
            return Err(CalculateError::shape(
                self.name(),
                format!("mapped {} values into {}", field.values.len(), values.len()),
            ));
        }

        Ok(Arc::new(NodeTensor::leaf(
            field.parent_index.clone(),
            values,
            field.is_repeated,
        )))
    }

    // Two closures are never known to agree.
    fn calculation_equal(&self, other: &dyn ExprNode) -> bool {
        same_node(self, other)
    }
}
