//! A rule engine that rebuilds a deduplicated rule graph from flattened
//! storage rows and runs the actions of every rule whose criteria all hold
//! for a data record.
//!
//! ```
//! use std::sync::Arc;
//! use criteria_engine::{ActionRow, CriterionRow, Engine, Gender, InMemorySource, PatientData};
//!
//! let source = InMemorySource::new(
//!     vec![CriterionRow::new(1, "Women", "IsFemale", "Patient.IsFemale")],
//!     vec![ActionRow::new(1, 1, "Notify", "SendEmail", "Send Email to", "ward@clinic.org")],
//! );
//! let engine = Engine::builder(Arc::new(source)).build().unwrap();
//!
//! let patient = PatientData::parse(Gender::Female, "1994-03-23").unwrap();
//! let report = engine.run(&patient);
//! assert_eq!(report.applicable(), &[1]);
//! ```

mod actions;
mod engine;
mod error;
mod load;
mod logic;
pub mod parse;
mod source;
mod types;

pub use actions::{Action, ActionRegistry, LogMailer, MailError, Mailer, Parameter, SendEmail};
pub use engine::{Engine, EngineBuilder};
pub use error::Error;
/// Message types handed to a [`Mailer`].
pub use lettre;
pub use load::GraphBuilder;
pub use logic::{
    observation_logic, patient_logic, patient_logic_as_of, Gender, LogicRegistry, LogicUnit,
    ObservationData, ObservationLogic, PatientData, PatientLogic, PredicateTable,
};
pub use parse::{parse_logic_spec, LogicSpec, ParseError};
pub use source::{ActionRow, CriterionRow, InMemorySource, RuleId, RuleSource, SourceError};
pub use types::{
    ActionError, Criterion, CriterionId, CriterionKey, EngineStatus, LoadError, LoadReport,
    LogicError, NotEvaluated, PassReport, Rule, RuleGraph,
};
