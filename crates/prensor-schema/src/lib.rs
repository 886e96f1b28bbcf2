//! Structural feature metadata for prensor trees.
//!
//! A [`Schema`](node::Schema) describes, per field, the physical type,
//! value-count and presence bounds, value domain and lifecycle stage, with
//! nested features for internal fields. Expressions read and fuse this
//! metadata; they never interpret it beyond the shape defined here.

pub mod node;
pub mod types;

use thiserror::Error as ThisError;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        node::*,
        types::{FeatureType, LifecycleStage, min_lifecycle_stage},
    };
    pub use serde::{Deserialize, Serialize};
}

///
/// Error
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum Error {
    #[error("did not find domain '{domain}' in schema")]
    UnknownDomain { domain: String },
}
