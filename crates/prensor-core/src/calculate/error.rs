use crate::node::NodeKind;
use thiserror::Error as ThisError;

///
/// CalculateError
///
/// Raised while evaluating an expression graph. Every variant names the
/// expression or operation it came from in `context`.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum CalculateError {
    #[error("{context}: no calculated value for a source")]
    MissingSource { context: String },

    #[error("{context}: {message}")]
    ShapeInvariant { context: String, message: String },

    #[error("{context}: expected {expected} sources, got {actual}")]
    SourceArity {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("{context}: declared {expected}, calculated {actual}")]
    TypeMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    #[error("{context}: expected a {expected} node, got a {actual} node")]
    UnexpectedNodeKind {
        context: String,
        expected: NodeKind,
        actual: NodeKind,
    },
}

impl CalculateError {
    pub(crate) fn shape(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ShapeInvariant {
            context: context.into(),
            message: message.into(),
        }
    }

    pub(crate) fn arity(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::SourceArity {
            context: context.into(),
            expected,
            actual,
        }
    }

    pub(crate) fn kind(context: impl Into<String>, expected: NodeKind, actual: NodeKind) -> Self {
        Self::UnexpectedNodeKind {
            context: context.into(),
            expected,
            actual,
        }
    }
}
