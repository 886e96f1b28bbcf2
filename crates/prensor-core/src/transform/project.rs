use crate::{
    calculate::{CalculateError, CalculateOptions},
    expr::{Expr, ExprMeta, ExprNode, ExprRef, downcast_node, identity_output},
    node::NodeTensor,
    path::{Path, Step},
};
use std::{collections::BTreeSet, sync::Arc};

/// Restrict the known subtree to the given relative paths and their
/// ancestors. Paths that do not resolve are dropped silently.
#[must_use]
pub fn project(root: &ExprRef, paths: &[Path]) -> ExprRef {
    Expr::new(
        ExprMeta::of(root),
        Project {
            origin: Arc::clone(root),
            paths: paths.to_vec(),
        },
    )
}

///
/// Project
///

#[derive(Debug)]
struct Project {
    origin: ExprRef,
    paths: Vec<Path>,
}

impl ExprNode for Project {
    fn name(&self) -> &'static str {
        "project"
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
        if !self.known_field_names().contains(step) {
            return None;
        }

        let suffixes: Vec<Path> = self
            .paths
            .iter()
            .filter(|path| path.first() == Some(step) && path.len() > 1)
            .map(|path| path.suffix(1))
            .collect();

        self.origin
            .get_child(step)
            .map(|child| project(&child, &suffixes))
    }

    fn known_field_names(&self) -> BTreeSet<Step> {
        self.paths.iter().filter_map(Path::first).cloned().collect()
    }
}
