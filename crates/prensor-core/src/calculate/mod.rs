//! The evaluation driver.
//!
//! Expressions are evaluated as one graph: every expression reachable from
//! the requests is calculated at most once, identity nodes are elided and
//! equal calculations over equal sources are shared.

mod error;
mod graph;
mod options;
mod slow;


pub use error::CalculateError;
pub use options::CalculateOptions;
pub use slow::calculate_value_slowly;

use crate::{
    calculate::graph::ExpressionGraph,
    expr::ExprRef,
    node::NodeTensor,
    obs::sink::EvaluationSpan,
    path::Path,
    prensor::Prensor,
};
use std::{collections::BTreeMap, sync::Arc};

///
/// calculate_prensors
///
/// Materialize every known descendant of each root and assemble one
/// [`Prensor`] per root. With checks enabled every assembled prensor is
/// validated level by level.
///
pub fn calculate_prensors(
    roots: &[ExprRef],
    options: &CalculateOptions,
) -> Result<Vec<Prensor>, CalculateError> {
    let descendants: Vec<BTreeMap<Path, ExprRef>> =
        roots.iter().map(|root| root.get_known_descendants()).collect();

    let mut span = EvaluationSpan::new(roots.len());
    let graph = ExpressionGraph::build(descendants.iter().flat_map(|nodes| nodes.values()))?;
    let evaluated = graph.evaluate(options, &mut span)?;

    let mut prensors = Vec::with_capacity(roots.len());
    for nodes in &descendants {
        let tensors = nodes
            .iter()
            .map(|(path, expr)| {
                let tensor = evaluated.tensor(graph.id_of(expr)?, expr)?;
                Ok((path.clone(), tensor))
            })
            .collect::<Result<BTreeMap<Path, Arc<NodeTensor>>, CalculateError>>()?;

        let prensor = Prensor::from_descendant_nodes(&tensors)?;
        if options.checks_enabled() {
            prensor.validate()?;
        }
        prensors.push(prensor);
    }

    span.set_prensors(prensors.len());
    tracing::debug!(
        roots = roots.len(),
        graph_nodes = graph.len(),
        "calculated prensors"
    );

    Ok(prensors)
}

/// Calculate the tensor of each expression, sharing work between them.
pub fn calculate_node_tensors(
    exprs: &[ExprRef],
    options: &CalculateOptions,
) -> Result<Vec<Arc<NodeTensor>>, CalculateError> {
    let mut span = EvaluationSpan::new(exprs.len());
    let graph = ExpressionGraph::build(exprs)?;
    let evaluated = graph.evaluate(options, &mut span)?;

    tracing::debug!(
        exprs = exprs.len(),
        graph_nodes = graph.len(),
        "calculated node tensors"
    );

    exprs
        .iter()
        .map(|expr| evaluated.tensor(graph.id_of(expr)?, expr))
        .collect()
}

/// Calculate a single prensor.
pub fn calculate_prensor(
    root: &ExprRef,
    options: &CalculateOptions,
) -> Result<Prensor, CalculateError> {
    calculate_prensors(std::slice::from_ref(root), options)?
        .pop()
        .ok_or_else(|| CalculateError::MissingSource {
            context: root.name().to_string(),
        })
}
