//! Attach schema metadata to an expression tree.
//!
//! Children are matched to features by name. A matched child carries the
//! feature (stripped of its name and nested features) and is matched
//! recursively against the nested features; everything else passes through
//! untouched.

use crate::{
    calculate::{CalculateError, CalculateOptions},
    expr::{Expr, ExprMeta, ExprNode, ExprRef, ExpressionError, downcast_node, identity_output},
    node::NodeTensor,
    path::Step,
};
use prensor_schema::node::{Feature, Schema};
use std::{collections::BTreeSet, sync::Arc};

/// Normalize `schema` and attach its features to the tree under `root`.
pub fn apply_schema(root: &ExprRef, schema: &Schema) -> Result<ExprRef, ExpressionError> {
    let normalized = schema.normalized()?;
    tracing::debug!(features = normalized.features.len(), "applying schema");

    Ok(with_features(root, ExprMeta::of(root), normalized.features))
}

fn with_features(origin: &ExprRef, meta: ExprMeta, features: Vec<Feature>) -> ExprRef {
    Expr::new(
        meta,
        ApplySchema {
            origin: Arc::clone(origin),
            features,
        },
    )
}

///
/// ApplySchema
///

#[derive(Debug)]
struct ApplySchema {
    origin: ExprRef,
    features: Vec<Feature>,
}

impl ApplySchema {
    fn feature_for(&self, step: &Step) -> Option<&Feature> {
        let name = step.text()?;

        self.features
            .iter()
            .find(|feature| feature.name.as_deref() == Some(name.as_str()))
    }
}

impl ExprNode for ApplySchema {
    fn name(&self) -> &'static str {
        "apply_schema"
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
        let child = self.origin.get_child(step)?;

        match self.feature_for(step) {
            Some(feature) => {
                let meta = ExprMeta::of(&child).with_schema_feature(Some(feature.cleaned()));
                Some(with_features(&child, meta, feature.struct_features().to_vec()))
            }
            None => Some(child),
        }
    }

    fn known_field_names(&self) -> BTreeSet<Step> {
        let mut names = self.origin.known_field_names();
        for feature in &self.features {
            let Some(step) = feature.name.as_deref().and_then(|name| Step::parse(name).ok()) else {
                continue;
            };
            if self.origin.get_child(&step).is_some() {
                names.insert(step);
            }
        }

        names
    }
}
