use crate::{
    calculate::{CalculateError, CalculateOptions},
    expr::{Expr, ExprMeta, ExprNode, ExprRef, downcast_node, identity_output},
    node::NodeTensor,
    path::Step,
};
use std::{collections::BTreeSet, sync::Arc};

/// Hide everything more than `depth` steps below `expr`.
///
/// At depth zero the result has no known fields and no children.
#[must_use]
pub fn limit_depth(expr: &ExprRef, depth: usize) -> ExprRef {
    Expr::new(
        ExprMeta::of(expr),
        DepthLimit {
            origin: Arc::clone(expr),
            depth,
        },
    )
}

///
/// DepthLimit
///

#[derive(Debug)]
struct DepthLimit {
    origin: ExprRef,
    depth: usize,
}

impl ExprNode for DepthLimit {
    fn name(&self) -> &'static str {
        "depth_limit"
    }

    fn source_expressions(&self) -> Vec<ExprRef> {
        vec![Arc::clone(&self.origin)]
    }

    fn calculate(
        &self,
        sources: &[Arc<NodeTensor>],
        _destinations: &[ExprRef],
        _options: &CalculateOptions,
    ) -> Result<Arc<NodeTensor>, CalculateError> {
        identity_output(sources, self.name())
    }

    fn calculation_is_identity(&self) -> bool {
        true
    }

    fn calculation_equal(&self, other: &dyn ExprNode) -> bool {
        downcast_node::<Self>(other).is_some()
    }

    fn resolve_child(&self, step: &Step) -> Option<ExprRef> {
        let remaining = self.depth.checked_sub(1)?;

        self.origin
            .get_child(step)
            .map(|child| limit_depth(&child, remaining))
    }

    fn known_field_names(&self) -> BTreeSet<Step> {
        if self.depth == 0 {
            BTreeSet::new()
        } else {
            self.origin.known_field_names()
        }
    }
}
