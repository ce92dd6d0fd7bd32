//! The storage collaborator: flattened join rows the rule graph is rebuilt from.

use thiserror::Error;

/// Numeric rule identifier as stored.
pub type RuleId = i64;

/// One row per rule × criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CriterionRow {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub criterion_name: String,
    /// `Unit.SubPredicate[=value]`; `None` when the join found no logic.
    pub logic_spec: Option<String>,
}

impl CriterionRow {
    pub fn new(
        rule_id: RuleId,
        rule_name: impl Into<String>,
        criterion_name: impl Into<String>,
        logic_spec: impl Into<String>,
    ) -> Self {
        Self {
            rule_id,
            rule_name: rule_name.into(),
            criterion_name: criterion_name.into(),
            logic_spec: Some(logic_spec.into()),
        }
    }
}

/// One row per rule × action × parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionRow {
    pub rule_id: RuleId,
    pub sequence: u32,
    pub action_name: String,
    pub function: String,
    pub parameter_name: String,
    pub parameter_value: String,
}

impl ActionRow {
    pub fn new(
        rule_id: RuleId,
        sequence: u32,
        action_name: impl Into<String>,
        function: impl Into<String>,
        parameter_name: impl Into<String>,
        parameter_value: impl Into<String>,
    ) -> Self {
        Self {
            rule_id,
            sequence,
            action_name: action_name.into(),
            function: function.into(),
            parameter_name: parameter_name.into(),
            parameter_value: parameter_value.into(),
        }
    }
}

/// The storage collaborator failed to produce rows.
#[derive(Debug, Error)]
#[error("rule source unavailable: {0}")]
pub struct SourceError(pub String);

/// Supplies the two flattened queries the loader consumes.
pub trait RuleSource: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SourceError`] if the rows cannot be read.
    fn criterion_rows(&self) -> Result<Vec<CriterionRow>, SourceError>;

    /// # Errors
    ///
    /// Returns [`SourceError`] if the rows cannot be read.
    fn action_rows(&self) -> Result<Vec<ActionRow>, SourceError>;
}

/// A [`RuleSource`] over rows held in memory. Rows can be swapped between
/// loads to simulate edits in storage.
#[derive(Debug, Default)]
pub struct InMemorySource {
    rows: parking_lot::RwLock<(Vec<CriterionRow>, Vec<ActionRow>)>,
}

impl InMemorySource {
    #[must_use]
    pub fn new(criteria: Vec<CriterionRow>, actions: Vec<ActionRow>) -> Self {
        Self {
            rows: parking_lot::RwLock::new((criteria, actions)),
        }
    }

    /// Replace every row; takes effect on the next load.
    pub fn replace(&self, criteria: Vec<CriterionRow>, actions: Vec<ActionRow>) {
        *self.rows.write() = (criteria, actions);
    }
}

impl RuleSource for InMemorySource {
    fn criterion_rows(&self) -> Result<Vec<CriterionRow>, SourceError> {
        Ok(self.rows.read().0.clone())
    }

    fn action_rows(&self) -> Result<Vec<ActionRow>, SourceError> {
        Ok(self.rows.read().1.clone())
    }
}
