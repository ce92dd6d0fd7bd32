use thiserror::Error;

use crate::parse::ParseError;

/// Errors raised by a [`LogicUnit`](crate::LogicUnit) while evaluating a sub-predicate.
#[derive(Debug, Error)]
pub enum LogicError {
    #[error("unknown sub-predicate '{predicate}' for logic unit '{unit}'")]
    UnknownSubPredicate { unit: String, predicate: String },

    #[error("logic unit '{unit}' expects a record of type {expected}")]
    IncompatibleDataType { unit: String, expected: &'static str },

    #[error("invalid comparison value '{value}' for '{predicate}': {reason}")]
    InvalidCheckValue {
        predicate: String,
        value: String,
        reason: String,
    },
}

/// A criterion's result was requested before it was evaluated in the current pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("criterion '{criterion}' has not been evaluated")]
pub struct NotEvaluated {
    pub criterion: String,
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("invalid parameter '{name}' = '{value}': {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("action failed: {0}")]
    ExecutionFailed(String),

    #[error("no actions to execute")]
    NoActions,

    #[error("applicability not determined")]
    ApplicabilityUndetermined,

    /// Wraps the failure of one action with its sequence number.
    #[error("action #{sequence} - {source}")]
    Sequence {
        sequence: u32,
        #[source]
        source: Box<ActionError>,
    },
}

impl ActionError {
    /// The sequence number of the failing action, if this error came from
    /// [`Rule::execute_actions`](crate::Rule::execute_actions).
    #[must_use]
    pub fn sequence(&self) -> Option<u32> {
        match self {
            ActionError::Sequence { sequence, .. } => Some(*sequence),
            _ => None,
        }
    }
}

/// Problems found while rebuilding the rule graph. All of them except
/// [`LoadError::Source`] are recovered by dropping the offending row or rule.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unknown logic unit type '{0}'")]
    UnknownLogicUnitType(String),

    #[error("logic unit registered as '{registered}' reports kind '{reported}'")]
    LogicUnitKindMismatch { registered: String, reported: String },

    #[error("unknown action type '{0}'")]
    UnknownActionType(String),

    #[error("malformed logic spec: {0}")]
    MalformedLogicSpec(#[from] ParseError),

    #[error(transparent)]
    Source(#[from] crate::source::SourceError),
}
