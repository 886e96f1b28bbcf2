use crate::path::{Path, PathError, Step};
use prensor_schema::Error as SchemaError;
use thiserror::Error as ThisError;

///
/// ExpressionError
///
/// Raised while building or navigating an expression graph.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum ExpressionError {
    #[error("cannot broadcast '{path}': {reason}")]
    InvalidBroadcast { path: Path, reason: String },

    #[error("cannot promote '{path}': {reason}")]
    InvalidPromotion { path: Path, reason: String },

    #[error("field not found: '{step}'")]
    MissingField { step: Step },

    #[error("missing path: '{path}' in\n{schema}")]
    MissingPath { path: Path, schema: String },

    #[error("expected a leaf at '{path}'")]
    NotALeaf { path: Path },

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("path already exists: '{path}'")]
    PathAlreadyExists { path: Path },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
