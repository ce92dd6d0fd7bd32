use thiserror::Error;

use crate::parse::ParseError;
use crate::source::SourceError;
use crate::{ActionError, LoadError, LogicError, NotEvaluated};

/// Unified error type covering every failure the engine can report.
///
/// Most of these never escape [`Engine::run`](crate::Engine::run), which logs
/// and recovers per item. They surface from the lower-level APIs
/// ([`Criterion::evaluate`](crate::Criterion::evaluate),
/// [`Rule::execute_actions`](crate::Rule::execute_actions), the registries) and
/// from [`Engine::reload`](crate::Engine::reload) when storage fails.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Logic(#[from] LogicError),

    #[error(transparent)]
    NotEvaluated(#[from] NotEvaluated),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Source(#[from] SourceError),
}
