mod criterion;
mod error;
mod graph;
mod report;
mod rule;
mod status;

pub use criterion::{Criterion, CriterionId, CriterionKey};
pub use error::{ActionError, LoadError, LogicError, NotEvaluated};
pub use graph::RuleGraph;
pub use report::{LoadReport, PassReport};
pub use rule::Rule;
pub use status::EngineStatus;
