//! ## Crate layout
//! - `core`: paths, node tensors, prensors, expressions, transforms, the
//!   evaluation driver and observability.
//! - `schema`: structural feature metadata attached to expressions.
//!
//! The `prelude` module carries the vocabulary needed to build an
//! expression from a prensor, transform it and calculate the result.

pub use prensor_core as core;
pub use prensor_schema as schema;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use crate::core::Error;

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::{
        calculate::{CalculateOptions, calculate_prensor, calculate_prensors},
        prelude::*,
        transform::create_expression_from_prensor,
    };
    pub use crate::schema::node::{Feature, Schema};
}
