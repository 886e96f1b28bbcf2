use crate::{
    calculate::{CalculateError, CalculateOptions},
    expr::ExprRef,
    node::NodeTensor,
};
use std::sync::Arc;

/// Reference evaluator: recurse into every source and calculate, with no
/// sharing, elision or declaration checks. Shared sources are recomputed
/// once per use.
pub fn calculate_value_slowly(
    expr: &ExprRef,
    destinations: &[ExprRef],
    options: &CalculateOptions,
) -> Result<Arc<NodeTensor>, CalculateError> {
    let inputs = expr
        .source_expressions()
        .iter()
        .map(|source| calculate_value_slowly(source, std::slice::from_ref(expr), options))
        .collect::<Result<Vec<_>, _>>()?;

    expr.calculate(&inputs, destinations, options)
}
