use crate::{calculate::CalculateError, expr::ExpressionError, path::PathError};
use prensor_schema::Error as SchemaError;
use thiserror::Error as ThisError;

///
/// Error
///
/// Any failure the crate can report, for callers that do not care which
/// layer it came from.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum Error {
    #[error(transparent)]
    Calculate(#[from] CalculateError),

    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
