use crate::{
    calculate::{CalculateError, CalculateOptions},
    expr::{Expr, ExprMeta, ExprNode, ExprRef, same_node},
    node::NodeTensor,
    path::Step,
    prensor::Prensor,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

///
/// create_expression_from_prensor
///
/// Wrap a materialized prensor as source-less expressions. The root is a
/// repeated internal node; every other level takes its shape from its
/// tensor.
///
#[must_use]
pub fn create_expression_from_prensor(prensor: &Prensor) -> ExprRef {
    from_prensor(prensor, ExprMeta::internal(true))
}

fn from_prensor(prensor: &Prensor, meta: ExprMeta) -> ExprRef {
    let children = prensor
        .children()
        .iter()
        .map(|(step, child)| (step.clone(), from_prensor(child, tensor_meta(child.node()))))
        .collect();

    Expr::new(
        meta,
        PrensorSource {
            node: Arc::clone(prensor.node_arc()),
            children,
        },
    )
}

fn tensor_meta(node: &NodeTensor) -> ExprMeta {
    match node.primitive_type() {
        Some(value_type) => ExprMeta::leaf(node.is_repeated(), value_type),
        None => ExprMeta::internal(node.is_repeated()),
    }
}

///
/// PrensorSource
///

#[derive(Debug)]
struct PrensorSource {
    node: Arc<NodeTensor>,
    children: BTreeMap<Step, ExprRef>,
}

impl ExprNode for PrensorSource {
    fn name(&self) -> &'static str {
        "prensor_source"
    }

    fn source_expressions(&self) -> Vec<ExprRef> {
        Vec::new()
    }

    fn calculate(
        &self,
        sources: &[Arc<NodeTensor>],
        _destinations: &[ExprRef],
        _options: &CalculateOptions,
    ) -> Result<Arc<NodeTensor>, CalculateError> {
        if !sources.is_empty() {
            return Err(CalculateError::arity(self.name(), 0, sources.len()));
        }

        Ok(Arc::clone(&self.node))
    }

    fn calculation_equal(&self, other: &dyn ExprNode) -> bool {
        same_node(self, other)
    }

    fn resolve_child(&self, step: &Step) -> Option<ExprRef> {
        self.children.get(step).cloned()
    }

    fn known_field_names(&self) -> BTreeSet<Step> {
        self.children.keys().cloned().collect()
    }
}
