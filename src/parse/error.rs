use thiserror::Error;

/// A logic spec that does not match `Unit.SubPredicate[=value]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error: {message}")]
pub struct ParseError {
    pub(crate) message: String,
}
