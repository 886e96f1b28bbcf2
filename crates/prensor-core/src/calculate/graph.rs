use crate::{
    calculate::{CalculateError, CalculateOptions},
    expr::{Expr, ExprRef},
    node::NodeTensor,
    obs::sink::{self, EvaluationSpan, MetricsEvent},
    value::PrimitiveType,
};
use std::{collections::HashMap, sync::Arc};

///
/// ExpressionGraph
///
/// Every expression reachable from a set of requests, deduplicated by
/// `Arc` identity and stored in topological order (sources first).
///

pub(crate) struct ExpressionGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<*const Expr, usize>,
}

struct GraphNode {
    expr: ExprRef,
    sources: Vec<usize>,
    destinations: Vec<usize>,
}

impl ExpressionGraph {
    ///
    /// build
    ///
    /// Iterative post-order walk over `source_expressions`; deep chains of
    /// transforms never recurse.
    ///
    pub(crate) fn build<'a>(
        requests: impl IntoIterator<Item = &'a ExprRef>,
    ) -> Result<Self, CalculateError> {
        let mut graph = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
        };
        let mut stack: Vec<(ExprRef, bool)> = requests
            .into_iter()
            .map(|expr| (Arc::clone(expr), false))
            .collect();
        stack.reverse();

        while let Some((expr, expanded)) = stack.pop() {
            if graph.index.contains_key(&Arc::as_ptr(&expr)) {
                continue;
            }

            if expanded {
                graph.insert(expr)?;
            } else {
                let sources = expr.source_expressions();
                stack.push((expr, true));
                for source in sources.into_iter().rev() {
                    if !graph.index.contains_key(&Arc::as_ptr(&source)) {
                        stack.push((source, false));
                    }
                }
            }
        }

        Ok(graph)
    }

    fn insert(&mut self, expr: ExprRef) -> Result<(), CalculateError> {
        let id = self.nodes.len();
        let sources = expr
            .source_expressions()
            .iter()
            .map(|source| self.id_of(source))
            .collect::<Result<Vec<_>, _>>()?;

        for &source in &sources {
            self.nodes[source].destinations.push(id);
        }
        self.index.insert(Arc::as_ptr(&expr), id);
        self.nodes.push(GraphNode {
            expr,
            sources,
            destinations: Vec::new(),
        });

        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn id_of(&self, expr: &ExprRef) -> Result<usize, CalculateError> {
        self.index
            .get(&Arc::as_ptr(expr))
            .copied()
            .ok_or_else(|| CalculateError::MissingSource {
                context: expr.name().to_string(),
            })
    }

    ///
    /// evaluate
    ///
    /// Calculate every distinct node once. Identity nodes reuse their
    /// source's tensor; a node whose canonical sources match an already
    /// calculated, `calculation_equal` node reuses that node's tensor.
    ///
    pub(crate) fn evaluate(
        &self,
        options: &CalculateOptions,
        span: &mut EvaluationSpan,
    ) -> Result<Evaluated, CalculateError> {
        let mut canonical: Vec<usize> = Vec::with_capacity(self.nodes.len());
        let mut tensors: Vec<Option<Arc<NodeTensor>>> = vec![None; self.nodes.len()];
        let mut calculated_by_sources: HashMap<Vec<usize>, Vec<usize>> = HashMap::new();

        for (id, node) in self.nodes.iter().enumerate() {
            let sources: Vec<usize> = node.sources.iter().map(|&source| canonical[source]).collect();

            if let [source] = sources.as_slice()
                && node.expr.calculation_is_identity()
            {
                let tensor = tensor_at(&tensors, *source, &node.expr)?;
                check_declared(&node.expr, tensor)?;
                sink::record(MetricsEvent::IdentityElided);
                canonical.push(*source);
                continue;
            }

            if let Some(hit) = calculated_by_sources.get(&sources).and_then(|candidates| {
                candidates
                    .iter()
                    .copied()
                    .find(|&candidate| self.nodes[candidate].expr.calculation_equal(&node.expr))
            }) {
                tracing::trace!(expr = node.expr.name(), id, merged_into = hit, "merged subexpression");
                sink::record(MetricsEvent::SubexpressionMerged {
                    name: node.expr.name(),
                });
                canonical.push(hit);
                continue;
            }

            let inputs = sources
                .iter()
                .map(|&source| tensor_at(&tensors, source, &node.expr).map(Arc::clone))
                .collect::<Result<Vec<_>, _>>()?;
            let destinations: Vec<ExprRef> = node
                .destinations
                .iter()
                .map(|&destination| Arc::clone(&self.nodes[destination].expr))
                .collect();

            let tensor = node.expr.calculate(&inputs, &destinations, options)?;
            check_declared(&node.expr, &tensor)?;
            tracing::trace!(expr = node.expr.name(), id, size = tensor.size(), "calculated node");
            span.node_calculated(node.expr.name());

            tensors[id] = Some(tensor);
            canonical.push(id);
            calculated_by_sources.entry(sources).or_default().push(id);
        }

        Ok(Evaluated { canonical, tensors })
    }
}

///
/// Evaluated
///

pub(crate) struct Evaluated {
    canonical: Vec<usize>,
    tensors: Vec<Option<Arc<NodeTensor>>>,
}

impl Evaluated {
    pub(crate) fn tensor(&self, id: usize, expr: &Expr) -> Result<Arc<NodeTensor>, CalculateError> {
        let canonical = self
            .canonical
            .get(id)
            .copied()
            .ok_or_else(|| missing(expr))?;

        tensor_at(&self.tensors, canonical, expr).map(Arc::clone)
    }
}

fn tensor_at<'a>(
    tensors: &'a [Option<Arc<NodeTensor>>],
    id: usize,
    expr: &Expr,
) -> Result<&'a Arc<NodeTensor>, CalculateError> {
    tensors
        .get(id)
        .and_then(Option::as_ref)
        .ok_or_else(|| missing(expr))
}

fn missing(expr: &Expr) -> CalculateError {
    CalculateError::MissingSource {
        context: expr.name().to_string(),
    }
}

fn declaration(is_repeated: bool, value_type: Option<PrimitiveType>) -> String {
    let cardinality = if is_repeated { "repeated" } else { "optional" };
    match value_type {
        Some(value_type) => format!("{cardinality} {value_type}"),
        None => format!("{cardinality} struct"),
    }
}

/// Check a produced tensor against its expression's declared shape.
pub(crate) fn check_declared(expr: &Expr, tensor: &NodeTensor) -> Result<(), CalculateError> {
    let declared = (expr.is_repeated(), expr.value_type());
    let actual = match tensor {
        NodeTensor::Root(_) | NodeTensor::Child(_) => (tensor.is_repeated(), None),
        NodeTensor::Leaf(leaf) => (leaf.is_repeated, Some(leaf.values.primitive_type())),
    };

    if declared == actual {
        Ok(())
    } else {
        Err(CalculateError::TypeMismatch {
            context: expr.name().to_string(),
            expected: declaration(declared.0, declared.1),
            actual: declaration(actual.0, actual.1),
        })
    }
}
