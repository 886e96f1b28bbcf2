use crate::{
    calculate::{CalculateError, CalculateOptions},
    expr::{Expr, ExprMeta, ExprNode, ExprRef, ExpressionError, downcast_node, identity_output},
    node::NodeTensor,
    path::{Path, Step},
};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

///
/// add_paths
///
/// Graft new expressions at new paths. Every parent must already exist and
/// no new path may already be present.
///
pub fn add_paths(
    root: &ExprRef,
    additions: BTreeMap<Path, ExprRef>,
) -> Result<ExprRef, ExpressionError> {
    for path in additions.keys() {
        let parent = path.parent()?;
        root.get_descendant_or_error(&parent)?;

        if root.get_descendant(path).is_some() {
            return Err(ExpressionError::PathAlreadyExists { path: path.clone() });
        }
    }

    tracing::debug!(paths = additions.len(), "grafting new paths");

    Ok(graft(root, additions))
}

fn graft(origin: &ExprRef, additions: BTreeMap<Path, ExprRef>) -> ExprRef {
    Expr::new(
        ExprMeta::of(origin),
        AddPaths {
            origin: Arc::clone(origin),
            additions,
        },
    )
}

///
/// AddPaths
///
/// Identity wrapper exposing extra descendants at relative paths.
///

#[derive(Debug)]
struct AddPaths {
    origin: ExprRef,
    additions: BTreeMap<Path, ExprRef>,
}

impl ExprNode for AddPaths {
    fn name(&self) -> &'static str {
        "add_paths"
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
        if let Some(added) = self.additions.get(&Path::from(step.clone())) {
            return Some(Arc::clone(added));
        }

        let origin_child = self.origin.get_child(step)?;
        let nested: BTreeMap<Path, ExprRef> = self
            .additions
            .iter()
            .filter(|(path, _)| path.len() > 1 && path.first() == Some(step))
            .map(|(path, expr)| (path.suffix(1), Arc::clone(expr)))
            .collect();

        if nested.is_empty() {
            Some(origin_child)
        } else {
            Some(graft(&origin_child, nested))
        }
    }

    fn known_field_names(&self) -> BTreeSet<Step> {
        let mut names = self.origin.known_field_names();
        names.extend(self.additions.keys().filter_map(|path| path.first().cloned()));

        names
    }
}
