use std::fmt;
use std::time::Duration;

use crate::source::RuleId;

/// Outcome of one [`Engine::run`](crate::Engine::run) pass.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct PassReport {
    pub(crate) evaluated: Vec<String>,
    pub(crate) incompatible: Vec<String>,
    pub(crate) failed: Vec<String>,
    pub(crate) applicable: Vec<RuleId>,
    pub(crate) skipped: Vec<RuleId>,
    pub(crate) action_failures: Vec<(RuleId, String)>,
    pub(crate) duration: Duration,
}

impl PassReport {
    /// Names of criteria that produced a result.
    #[must_use]
    pub fn evaluated(&self) -> &[String] {
        &self.evaluated
    }

    /// Names of criteria whose logic unit does not accept the record's type.
    #[must_use]
    pub fn incompatible(&self) -> &[String] {
        &self.incompatible
    }

    /// Names of criteria that failed for any other reason.
    #[must_use]
    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    /// Rules found applicable, in evaluation order. Their actions were run.
    #[must_use]
    pub fn applicable(&self) -> &[RuleId] {
        &self.applicable
    }

    /// Rules skipped because one of their criteria was not evaluated.
    #[must_use]
    pub fn skipped(&self) -> &[RuleId] {
        &self.skipped
    }

    /// Applicable rules whose action sequence stopped on a failure, with the
    /// failure message.
    #[must_use]
    pub fn action_failures(&self) -> &[(RuleId, String)] {
        &self.action_failures
    }

    /// Wall-clock duration of the pass.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "criteria: {} evaluated, {} incompatible, {} failed",
            self.evaluated.len(),
            self.incompatible.len(),
            self.failed.len()
        )?;
        write!(
            f,
            "; rules: {} applicable, {} skipped, {} with failed actions",
            self.applicable.len(),
            self.skipped.len(),
            self.action_failures.len()
        )?;
        write!(f, "; duration: {:?}", self.duration)
    }
}

/// Outcome of building a rule graph from storage rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct LoadReport {
    pub(crate) rules: usize,
    pub(crate) criteria: usize,
    pub(crate) skipped_criterion_rows: usize,
    pub(crate) skipped_action_rows: usize,
    pub(crate) removed_rules: Vec<RuleId>,
    pub(crate) pruned_criteria: Vec<String>,
}

impl LoadReport {
    /// Valid rules in the new graph.
    #[must_use]
    pub fn rules(&self) -> usize {
        self.rules
    }

    /// Distinct criteria in the new graph.
    #[must_use]
    pub fn criteria(&self) -> usize {
        self.criteria
    }

    /// Criterion rows dropped for a malformed spec or unknown logic unit.
    #[must_use]
    pub fn skipped_criterion_rows(&self) -> usize {
        self.skipped_criterion_rows
    }

    /// Action rows that could not be applied.
    #[must_use]
    pub fn skipped_action_rows(&self) -> usize {
        self.skipped_action_rows
    }

    /// Candidate rules removed during validation, ascending.
    #[must_use]
    pub fn removed_rules(&self) -> &[RuleId] {
        &self.removed_rules
    }

    /// Criteria dropped because no surviving rule referenced them.
    #[must_use]
    pub fn pruned_criteria(&self) -> &[String] {
        &self.pruned_criteria
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rules, {} criteria; removed {} rules, pruned {} criteria, skipped {} criterion rows and {} action rows",
            self.rules,
            self.criteria,
            self.removed_rules.len(),
            self.pruned_criteria.len(),
            self.skipped_criterion_rows,
            self.skipped_action_rows,
        )
    }
}
