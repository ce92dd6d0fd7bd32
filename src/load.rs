//! Rebuilds a [`RuleGraph`] from the two flattened storage queries.
//!
//! The build is optimistic first: every row is applied to a candidate rule and
//! criteria are shared as soon as they are seen. Validity is only known once
//! all rows for a rule are in, so invalid rules are removed afterwards and any
//! criterion left without a referencing rule is pruned.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::actions::{Action, ActionRegistry};
use crate::logic::{LogicRegistry, LogicUnit};
use crate::parse::parse_logic_spec;
use crate::source::{ActionRow, CriterionRow, RuleId, RuleSource};
use crate::{Criterion, CriterionId, CriterionKey, LoadError, LoadReport, Rule, RuleGraph};

/// Builds rule graphs from storage rows using the given registries.
///
/// # Example
///
/// ```
/// use criteria_engine::{ActionRegistry, ActionRow, CriterionRow, GraphBuilder, LogicRegistry};
///
/// let logic = LogicRegistry::with_defaults();
/// let actions = ActionRegistry::with_defaults();
/// let (graph, report) = GraphBuilder::new(&logic, &actions).build(
///     &[CriterionRow::new(1, "Older", "Over22", "Patient.AgeGreaterThan=22")],
///     &[ActionRow::new(1, 1, "Notify", "SendEmail", "Send Email to", "ward@clinic.org")],
/// );
/// assert_eq!(graph.len(), 1);
/// assert_eq!(report.rules(), 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder<'a> {
    logic: &'a LogicRegistry,
    actions: &'a ActionRegistry,
    generation: u64,
}

impl<'a> GraphBuilder<'a> {
    #[must_use]
    pub fn new(logic: &'a LogicRegistry, actions: &'a ActionRegistry) -> Self {
        Self {
            logic,
            actions,
            generation: 1,
        }
    }

    /// Generation number stamped on the built graph.
    #[must_use]
    pub fn generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Fetch both queries from `source` and build.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Source`] if the source cannot produce its rows.
    /// Problems inside the rows never fail the load.
    pub fn load(&self, source: &dyn RuleSource) -> Result<(RuleGraph, LoadReport), LoadError> {
        let criterion_rows = source.criterion_rows()?;
        let action_rows = source.action_rows()?;
        Ok(self.build(&criterion_rows, &action_rows))
    }

    /// Build a graph from already fetched rows.
    pub fn build(
        &self,
        criterion_rows: &[CriterionRow],
        action_rows: &[ActionRow],
    ) -> (RuleGraph, LoadReport) {
        let mut state = BuildState::default();
        for row in criterion_rows {
            state.apply_criterion_row(row, self.logic);
        }
        for row in action_rows {
            state.apply_action_row(row, self.actions);
        }
        state.attach_actions();
        state.validate();
        state.prune();
        state.finish(self.generation)
    }
}

#[derive(Default)]
struct BuildState {
    rules: BTreeMap<RuleId, Rule>,
    pool: Vec<Criterion>,
    by_key: HashMap<CriterionKey, CriterionId>,
    referenced_by: HashMap<CriterionId, BTreeSet<RuleId>>,
    units: HashMap<String, Arc<dyn LogicUnit>>,
    pending: BTreeMap<(RuleId, u32), Box<dyn Action>>,
    invalid: BTreeSet<RuleId>,
    report: LoadReport,
}

impl BuildState {
    fn apply_criterion_row(&mut self, row: &CriterionRow, registry: &LogicRegistry) {
        let rule = self
            .rules
            .entry(row.rule_id)
            .or_insert_with(|| Rule::new(row.rule_id, row.rule_name.clone()));

        let criterion = match candidate(row, registry, &mut self.units) {
            Ok(criterion) => criterion,
            Err(err) => {
                warn!(
                    rule_id = row.rule_id,
                    criterion = %row.criterion_name,
                    error = %err,
                    "skipping criterion row"
                );
                self.report.skipped_criterion_rows += 1;
                return;
            }
        };

        let key = criterion.key();
        let id = match self.by_key.get(&key) {
            Some(&id) => {
                debug!(rule_id = row.rule_id, criterion = %key.name, "sharing criterion");
                id
            }
            None => {
                let id = CriterionId(self.pool.len());
                self.pool.push(criterion);
                self.by_key.insert(key, id);
                id
            }
        };
        rule.add_criterion(id);
        self.referenced_by.entry(id).or_default().insert(row.rule_id);
    }

    fn apply_action_row(&mut self, row: &ActionRow, registry: &ActionRegistry) {
        if !self.rules.contains_key(&row.rule_id) {
            debug!(
                rule_id = row.rule_id,
                sequence = row.sequence,
                "skipping action row for rule without criteria"
            );
            self.report.skipped_action_rows += 1;
            return;
        }

        let key = (row.rule_id, row.sequence);
        if !self.pending.contains_key(&key) {
            match registry.create(&row.function) {
                Ok(action) => {
                    self.pending.insert(key, action);
                }
                Err(err) => {
                    self.reject(row, &err);
                    return;
                }
            }
        }
        if let Some(action) = self.pending.get_mut(&key) {
            if let Err(err) = action.add_parameter(&row.parameter_name, &row.parameter_value) {
                self.reject(row, &err);
            }
        }
    }

    fn reject(&mut self, row: &ActionRow, err: &dyn std::error::Error) {
        warn!(
            rule_id = row.rule_id,
            sequence = row.sequence,
            action = %row.action_name,
            error = %err,
            "invalid action, rule will be dropped"
        );
        self.report.skipped_action_rows += 1;
        self.invalid.insert(row.rule_id);
    }

    fn attach_actions(&mut self) {
        for ((rule_id, sequence), action) in std::mem::take(&mut self.pending) {
            if let Some(rule) = self.rules.get_mut(&rule_id) {
                rule.add_action(sequence, action);
            }
        }
    }

    fn validate(&mut self) {
        let doomed: Vec<(RuleId, &'static str)> = self
            .rules
            .values()
            .filter_map(|rule| {
                let reason = if rule.criteria().is_empty() {
                    "no criteria"
                } else if rule.action_count() == 0 {
                    "no actions"
                } else if self.invalid.contains(&rule.id()) {
                    "invalid action"
                } else {
                    return None;
                };
                Some((rule.id(), reason))
            })
            .collect();

        for (rule_id, reason) in doomed {
            let Some(rule) = self.rules.remove(&rule_id) else {
                continue;
            };
            warn!(rule_id, rule = %rule.name(), reason, "removing rule");
            for id in rule.criteria() {
                if let Some(rules) = self.referenced_by.get_mut(id) {
                    rules.remove(&rule_id);
                }
            }
            self.report.removed_rules.push(rule_id);
        }
    }

    fn prune(&mut self) {
        let pool = std::mem::take(&mut self.pool);
        let mut remap = HashMap::new();
        for (old, criterion) in pool.into_iter().enumerate() {
            let referenced = self
                .referenced_by
                .get(&CriterionId(old))
                .is_some_and(|rules| !rules.is_empty());
            if referenced {
                remap.insert(CriterionId(old), CriterionId(self.pool.len()));
                self.pool.push(criterion);
            } else {
                debug!(criterion = %criterion.name(), "pruning unreferenced criterion");
                self.report.pruned_criteria.push(criterion.name().to_owned());
            }
        }
        for rule in self.rules.values_mut() {
            rule.remap_criteria(|id| remap.get(&id).copied().unwrap_or(id));
        }
    }

    fn finish(mut self, generation: u64) -> (RuleGraph, LoadReport) {
        self.report.rules = self.rules.len();
        self.report.criteria = self.pool.len();
        info!(
            generation,
            rules = self.report.rules,
            criteria = self.report.criteria,
            removed = self.report.removed_rules.len(),
            "rule graph built"
        );
        let graph = RuleGraph {
            criteria: self.pool,
            rules: self.rules,
            generation,
        };
        (graph, self.report)
    }
}

/// Parse the row's spec and bind it to a logic unit. Units are created once
/// per kind per build.
fn candidate(
    row: &CriterionRow,
    registry: &LogicRegistry,
    units: &mut HashMap<String, Arc<dyn LogicUnit>>,
) -> Result<Criterion, LoadError> {
    let spec = parse_logic_spec(row.logic_spec.as_deref().unwrap_or_default())?;
    let unit = match units.get(&spec.unit) {
        Some(unit) => Arc::clone(unit),
        None => {
            let unit = registry.create(&spec.unit)?;
            units.insert(spec.unit.clone(), Arc::clone(&unit));
            unit
        }
    };
    Ok(Criterion::new(
        row.criterion_name.clone(),
        unit,
        spec.predicate,
        spec.check_value,
    ))
}
