use crate::{
    calculate::{CalculateError, CalculateOptions},
    expr::{Expr, ExprMeta, ExprNode, ExprRef, downcast_node, same_node},
    node::NodeTensor,
    path::Step,
    value::{PrimitiveType, Values},
};
use std::{
    collections::BTreeSet,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

///
/// MockNode
///
/// A configurable expression node. `calculate` returns `output` after
/// checking that it was handed exactly the outputs of its mock sources.
///

#[derive(Debug)]
pub struct MockNode {
    pub output: Arc<NodeTensor>,
    pub sources: Vec<ExprRef>,
    pub identity: bool,
}

impl MockNode {
    pub fn new(output: NodeTensor) -> Self {
        Self {
            output: Arc::new(output),
            sources: Vec::new(),
            identity: false,
        }
    }

    pub fn with_sources(mut self, sources: Vec<ExprRef>) -> Self {
        self.sources = sources;
        self
    }
}

impl ExprNode for MockNode {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn source_expressions(&self) -> Vec<ExprRef> {
        self.sources.clone()
    }

    fn calculate(
        &self,
        sources: &[Arc<NodeTensor>],
        _destinations: &[ExprRef],
        _options: &CalculateOptions,
    ) -> Result<Arc<NodeTensor>, CalculateError> {
        if sources.len() != self.sources.len() {
            return Err(CalculateError::arity(self.name(), self.sources.len(), sources.len()));
        }

        for (tensor, expr) in sources.iter().zip(&self.sources) {
            if let Some(mock) = downcast_node::<Self>(expr.node())
                && !mock.identity
                && !Arc::ptr_eq(tensor, &mock.output)
            {
                return Err(CalculateError::shape(self.name(), "unexpected source tensor"));
            }
        }

        if self.identity
            && let Some(source) = sources.first()
        {
            return Ok(Arc::clone(source));
        }

        Ok(Arc::clone(&self.output))
    }

    fn calculation_is_identity(&self) -> bool {
        self.identity
    }

    fn calculation_equal(&self, other: &dyn ExprNode) -> bool {
        downcast_node::<Self>(other).is_some_and(|other| self.identity && other.identity)
            || same_node(self, other)
    }
}

///
/// CountingNode
///
/// An internal mock that builds a fresh leaf for `field` on every
/// `resolve_child` call and counts each call, whether the step resolves or not.
///

#[derive(Debug)]
pub struct CountingNode {
    pub field: Step,
    pub resolutions: Arc<AtomicUsize>,
}

impl CountingNode {
    pub fn new(field: Step) -> Self {
        Self {
            field,
            resolutions: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl ExprNode for CountingNode {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn source_expressions(&self) -> Vec<ExprRef> {
        Vec::new()
    }

    fn calculate(
        &self,
        _sources: &[Arc<NodeTensor>],
        _destinations: &[ExprRef],
        _options: &CalculateOptions,
    ) -> Result<Arc<NodeTensor>, CalculateError> {
        Ok(Arc::new(NodeTensor::root(1)))
    }

    fn calculation_equal(&self, other: &dyn ExprNode) -> bool {
        same_node(self, other)
    }

    fn resolve_child(&self, step: &Step) -> Option<ExprRef> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);

        (step == &self.field).then(|| mock_leaf(vec![0], vec![1_i64], false))
    }

    fn known_field_names(&self) -> BTreeSet<Step> {
        BTreeSet::from([self.field.clone()])
    }
}

/// Root over a [`CountingNode`] for `field`, plus its resolution counter.
pub fn mock_counting_root(field: Step) -> (ExprRef, Arc<AtomicUsize>) {
    let node = CountingNode::new(field);
    let resolutions = Arc::clone(&node.resolutions);

    (Expr::new(ExprMeta::internal(true), node), resolutions)
}

/// Source-less mock leaf.
pub fn mock_leaf(parent_index: Vec<i64>, values: impl Into<Values>, is_repeated: bool) -> ExprRef {
    let tensor = NodeTensor::leaf(parent_index, values, is_repeated);
    let value_type = tensor.primitive_type().unwrap_or(PrimitiveType::Int64);

    Expr::new(ExprMeta::leaf(is_repeated, value_type), MockNode::new(tensor))
}

/// Mock leaf that declares `declared` but produces a different type.
pub fn mock_mistyped_leaf(declared: PrimitiveType) -> ExprRef {
    let tensor = NodeTensor::leaf(vec![0], vec![true], false);

    Expr::new(ExprMeta::leaf(false, declared), MockNode::new(tensor))
}

/// Identity mock over `source`.
pub fn mock_identity(source: &ExprRef) -> ExprRef {
    let mut node = MockNode::new(NodeTensor::root(0)).with_sources(vec![Arc::clone(source)]);
    node.identity = true;

    Expr::new(ExprMeta::of(source), node)
}

/// Mock over `sources` whose declared shape matches `output`.
pub fn mock_over(output: NodeTensor, sources: Vec<ExprRef>) -> ExprRef {
    let meta = match output.primitive_type() {
        Some(value_type) => ExprMeta::leaf(output.is_repeated(), value_type),
        None => ExprMeta::internal(output.is_repeated()),
    };

    Expr::new(meta, MockNode::new(output).with_sources(sources))
}
