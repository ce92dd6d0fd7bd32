use std::collections::BTreeMap;
use std::fmt;

use super::criterion::{Criterion, CriterionId};
use super::rule::Rule;
use crate::source::RuleId;

/// The validated, deduplicated set of rules and the criteria they reference.
///
/// Every criterion is referenced by at least one rule and every action belongs
/// to exactly one rule. A graph is built wholesale by the loader and replaced
/// wholesale on reload; it is never patched in place.
#[derive(Debug, Default)]
pub struct RuleGraph {
    pub(crate) criteria: Vec<Criterion>,
    pub(crate) rules: BTreeMap<RuleId, Rule>,
    pub(crate) generation: u64,
}

impl RuleGraph {
    /// A graph with no rules, the state before the first load.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The shared criterion pool.
    #[must_use]
    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    #[must_use]
    pub fn criterion(&self, id: CriterionId) -> Option<&Criterion> {
        self.criteria.get(id.0)
    }

    /// Look up a criterion's id by name.
    #[must_use]
    pub fn criterion_id(&self, name: &str) -> Option<CriterionId> {
        self.criteria
            .iter()
            .position(|c| c.name() == name)
            .map(CriterionId)
    }

    /// Rules in ascending id order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    #[must_use]
    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(&id)
    }

    /// The criteria of `rule`, in conjunction order.
    pub fn criteria_of<'a>(&'a self, rule: &'a Rule) -> impl Iterator<Item = &'a Criterion> + 'a {
        rule.criteria().iter().filter_map(|id| self.criterion(*id))
    }

    /// Ids of the rules referencing `criterion`.
    #[must_use]
    pub fn rules_referencing(&self, criterion: CriterionId) -> Vec<RuleId> {
        self.rules
            .values()
            .filter(|r| r.criteria().contains(&criterion))
            .map(Rule::id)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Incremented by every load; `0` for an empty graph that was never loaded.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Forget all memoized criterion results and rule determinations.
    pub(crate) fn reset(&mut self) {
        for criterion in &mut self.criteria {
            criterion.reset();
        }
        for rule in self.rules.values_mut() {
            rule.reset();
        }
    }
}

impl fmt::Display for RuleGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleGraph({} rules, {} criteria, generation {})",
            self.rules.len(),
            self.criteria.len(),
            self.generation,
        )
    }
}
