//! Expressions: lazily defined, path-addressed nodes of a calculation DAG.
//!
//! An [`Expr`] pairs the declared shape of one field (repeatedness, element
//! type, schema metadata) with an [`ExprNode`] that knows how to compute it.
//! Children are resolved on first lookup and memoized per instance, so the
//! same step always yields the identical `Arc`.

mod error;
mod node;
mod ops;
mod schema;


pub use error::ExpressionError;
pub use node::{ExprNode, downcast_node, same_node};

pub(crate) use node::{expect_sources, identity_output};

use crate::{
    calculate::{CalculateError, CalculateOptions},
    node::NodeTensor,
    path::{Path, Step},
    value::PrimitiveType,
};
use prensor_schema::node::Feature;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

/// Schema-string depth used in error messages and `Display`.
pub const SCHEMA_STRING_LIMIT: usize = 20;

pub type ExprRef = Arc<Expr>;

///
/// ExprMeta
///
/// The declared shape of an expression. `value_type` is `None` exactly for
/// internal (non-leaf) nodes.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExprMeta {
    pub is_repeated: bool,
    pub value_type: Option<PrimitiveType>,
    pub schema_feature: Option<Feature>,
}

impl ExprMeta {
    #[must_use]
    pub const fn internal(is_repeated: bool) -> Self {
        Self {
            is_repeated,
            value_type: None,
            schema_feature: None,
        }
    }

    #[must_use]
    pub const fn leaf(is_repeated: bool, value_type: PrimitiveType) -> Self {
        Self {
            is_repeated,
            value_type: Some(value_type),
            schema_feature: None,
        }
    }

    /// The shape of an existing expression.
    #[must_use]
    pub fn of(expr: &Expr) -> Self {
        Self {
            is_repeated: expr.is_repeated,
            value_type: expr.value_type,
            schema_feature: expr.schema_feature.clone(),
        }
    }

    #[must_use]
    pub fn with_schema_feature(mut self, schema_feature: Option<Feature>) -> Self {
        self.schema_feature = schema_feature;
        self
    }
}

///
/// Expr
///

pub struct Expr {
    is_repeated: bool,
    value_type: Option<PrimitiveType>,
    schema_feature: Option<Feature>,

    // `None` values memoize a failed lookup.
    children: RwLock<BTreeMap<Step, Option<ExprRef>>>,
    node: Box<dyn ExprNode>,
}

impl Expr {
    #[must_use]
    pub fn new(meta: ExprMeta, node: impl ExprNode) -> ExprRef {
        Arc::new(Self {
            is_repeated: meta.is_repeated,
            value_type: meta.value_type,
            schema_feature: meta.schema_feature,
            children: RwLock::new(BTreeMap::new()),
            node: Box::new(node),
        })
    }

    #[must_use]
    pub const fn is_repeated(&self) -> bool {
        self.is_repeated
    }

    #[must_use]
    pub const fn value_type(&self) -> Option<PrimitiveType> {
        self.value_type
    }

    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.value_type.is_some()
    }

    #[must_use]
    pub const fn schema_feature(&self) -> Option<&Feature> {
        self.schema_feature.as_ref()
    }

    #[must_use]
    pub fn node(&self) -> &dyn ExprNode {
        self.node.as_ref()
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.node.name()
    }

    #[must_use]
    pub fn source_expressions(&self) -> Vec<ExprRef> {
        self.node.source_expressions()
    }

    pub fn calculate(
        &self,
        sources: &[Arc<NodeTensor>],
        destinations: &[ExprRef],
        options: &CalculateOptions,
    ) -> Result<Arc<NodeTensor>, CalculateError> {
        self.node.calculate(sources, destinations, options)
    }

    #[must_use]
    pub fn calculation_is_identity(&self) -> bool {
        self.node.calculation_is_identity()
    }

    /// Both expressions declare the same shape and compute the same output
    /// from the same sources.
    #[must_use]
    pub fn calculation_equal(&self, other: &Self) -> bool {
        self.is_repeated == other.is_repeated
            && self.value_type == other.value_type
            && self.node.calculation_equal(other.node())
    }

    #[must_use]
    pub fn known_field_names(&self) -> BTreeSet<Step> {
        self.node.known_field_names()
    }

    ///
    /// get_child
    ///
    /// Memoized child lookup. The first call resolves the child and stores
    /// the result, absent or not; concurrent first calls may both resolve,
    /// but the first stored value wins and is what every caller gets.
    ///
    #[must_use]
    pub fn get_child(&self, step: &Step) -> Option<ExprRef> {
        if let Some(cached) = self
            .children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(step)
        {
            return cached.clone();
        }

        let resolved = self.node.resolve_child(step);

        self.children
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(step.clone())
            .or_insert(resolved)
            .clone()
    }

    pub fn get_child_or_error(&self, step: &Step) -> Result<ExprRef, ExpressionError> {
        self.get_child(step)
            .ok_or_else(|| ExpressionError::MissingField { step: step.clone() })
    }

    /// The expression at `path`; the empty path is this expression.
    #[must_use]
    pub fn get_descendant(self: &Arc<Self>, path: &Path) -> Option<ExprRef> {
        path.steps()
            .iter()
            .try_fold(Arc::clone(self), |current, step| current.get_child(step))
    }

    pub fn get_descendant_or_error(self: &Arc<Self>, path: &Path) -> Result<ExprRef, ExpressionError> {
        self.get_descendant(path)
            .ok_or_else(|| ExpressionError::MissingPath {
                path: path.clone(),
                schema: self.schema_string(Some(SCHEMA_STRING_LIMIT)),
            })
    }

    /// Children for every known field name that resolves.
    #[must_use]
    pub fn get_known_children(&self) -> BTreeMap<Step, ExprRef> {
        let mut out = BTreeMap::new();
        for step in self.known_field_names() {
            match self.get_child(&step) {
                Some(child) => {
                    out.insert(step, child);
                }
                None => {
                    tracing::warn!(
                        expr = self.name(),
                        field = %step,
                        "known field does not resolve to a child"
                    );
                }
            }
        }

        out
    }

    /// Every known descendant keyed by its relative path, this expression
    /// included under the empty path.
    #[must_use]
    pub fn get_known_descendants(self: &Arc<Self>) -> BTreeMap<Path, ExprRef> {
        let mut out = BTreeMap::new();
        let mut pending = vec![(Path::root(), Arc::clone(self))];

        while let Some((path, expr)) = pending.pop() {
            for (step, child) in expr.get_known_children() {
                pending.push((path.child(step), child));
            }
            out.insert(path, expr);
        }

        out
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expr")
            .field("node", &self.node.name())
            .field("is_repeated", &self.is_repeated)
            .field("value_type", &self.value_type)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.schema_string(Some(SCHEMA_STRING_LIMIT)))
    }
}
