//! Core runtime for prensor: paths, node tensors, expression graphs, the
//! transform library and the evaluation driver.
//!
//! A *prensor* is a tree of parent-indexed ragged arrays. Expressions
//! describe how each level of a derived prensor is computed from the levels
//! of its sources; nothing is computed until a driver in [`calculate`] is
//! asked for tensors.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod calculate;
pub mod error;
pub mod expr;
pub mod node;
pub mod obs;
pub mod path;
pub mod prensor;
pub mod transform;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

pub use error::Error;

///
/// Prelude
///
/// Domain vocabulary only; errors and drivers stay one level down.
///

pub mod prelude {
    pub use crate::{
        expr::{Expr, ExprMeta, ExprNode, ExprRef},
        node::{NodeKind, NodeTensor},
        path::{AnonymousIdAllocator, Path, Step},
        prensor::{Prensor, RaggedArray, SparseArray},
        value::{PrimitiveType, Values},
    };
}
