use crate::{
    calculate::{CalculateError, CalculateOptions},
    expr::ExprRef,
    node::NodeTensor,
    path::Step,
};
use std::{any::Any, collections::BTreeSet, fmt, sync::Arc};

///
/// ExprNode
///
/// The calculation behind one expression.
///
/// `calculate` must be a pure function of the source tensors: the evaluator
/// shares results between expressions with equal sources, and skips
/// `calculate` entirely for identity nodes.
///

pub trait ExprNode: Any + fmt::Debug + Send + Sync {
    /// Short label used in logs and error context.
    fn name(&self) -> &'static str;

    /// Expressions whose tensors are passed to `calculate`, in order.
    fn source_expressions(&self) -> Vec<ExprRef>;

    fn calculate(
        &self,
        sources: &[Arc<NodeTensor>],
        destinations: &[ExprRef],
        options: &CalculateOptions,
    ) -> Result<Arc<NodeTensor>, CalculateError>;

    /// True when the output is exactly the single source's tensor.
    fn calculation_is_identity(&self) -> bool {
        false
    }

    /// True when, given the same sources, `other` produces the same output.
    ///
    /// Must be reflexive; need not be transitive.
    fn calculation_equal(&self, other: &dyn ExprNode) -> bool;

    /// Build the child at `step`. Normally called once per step per
    /// expression, but concurrent first lookups may both call it, so it
    /// must be idempotent; [`Expr::get_child`] keeps the first result.
    ///
    /// [`Expr::get_child`]: crate::expr::Expr::get_child
    fn resolve_child(&self, _step: &Step) -> Option<ExprRef> {
        None
    }

    /// The declared children. Other children may still resolve.
    fn known_field_names(&self) -> BTreeSet<Step> {
        BTreeSet::new()
    }
}

/// View a node as a concrete type.
#[must_use]
pub fn downcast_node<T: ExprNode>(node: &dyn ExprNode) -> Option<&T> {
    let any: &dyn Any = node;
    any.downcast_ref::<T>()
}

/// True when both nodes are the same object.
#[must_use]
pub fn same_node(a: &dyn ExprNode, b: &dyn ExprNode) -> bool {
    std::ptr::addr_eq(std::ptr::from_ref(a), std::ptr::from_ref(b))
}

/// Borrow exactly `N` sources or fail with `SourceArity`.
pub(crate) fn expect_sources<'a, const N: usize>(
    sources: &'a [Arc<NodeTensor>],
    context: &str,
) -> Result<&'a [Arc<NodeTensor>; N], CalculateError> {
    sources
        .try_into()
        .map_err(|_| CalculateError::arity(context, N, sources.len()))
}

/// The single source of an identity node.
pub(crate) fn identity_output(
    sources: &[Arc<NodeTensor>],
    context: &str,
) -> Result<Arc<NodeTensor>, CalculateError> {
    let [source] = expect_sources::<1>(sources, context)?;

    Ok(Arc::clone(source))
}
