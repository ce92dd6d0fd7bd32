use std::collections::BTreeMap;
use std::fmt;

use super::criterion::{Criterion, CriterionId};
use super::error::{ActionError, NotEvaluated};
use crate::actions::Action;
use crate::source::RuleId;

/// A conjunction of criteria plus the actions to run, in sequence order, when
/// every criterion holds.
///
/// Criteria are referenced by [`CriterionId`] into the owning graph's criterion
/// pool, so several rules can share one memoized criterion.
pub struct Rule {
    id: RuleId,
    name: String,
    criteria: Vec<CriterionId>,
    actions: BTreeMap<u32, Box<dyn Action>>,
    determined: bool,
}

impl Rule {
    pub fn new(id: RuleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            criteria: Vec::new(),
            actions: BTreeMap::new(),
            determined: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> RuleId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Criterion ids in conjunction (insertion) order.
    #[must_use]
    pub fn criteria(&self) -> &[CriterionId] {
        &self.criteria
    }

    /// Action sequence numbers, ascending.
    pub fn sequences(&self) -> impl Iterator<Item = u32> + '_ {
        self.actions.keys().copied()
    }

    #[must_use]
    pub fn action(&self, sequence: u32) -> Option<&dyn Action> {
        self.actions.get(&sequence).map(|a| &**a)
    }

    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Whether [`applicable`](Self::applicable) has succeeded since the last reset.
    #[must_use]
    pub fn is_determined(&self) -> bool {
        self.determined
    }

    /// Append a criterion. Returns `false` if the rule already references it.
    pub(crate) fn add_criterion(&mut self, id: CriterionId) -> bool {
        if self.criteria.contains(&id) {
            return false;
        }
        self.criteria.push(id);
        true
    }

    pub(crate) fn remap_criteria(&mut self, remap: impl Fn(CriterionId) -> CriterionId) {
        for id in &mut self.criteria {
            *id = remap(*id);
        }
    }

    /// Attach `action` at `sequence`. The first action attached at a sequence
    /// number wins; returns `false` (dropping `action`) if the slot is taken.
    pub fn add_action(&mut self, sequence: u32, action: Box<dyn Action>) -> bool {
        if self.actions.contains_key(&sequence) {
            return false;
        }
        self.actions.insert(sequence, action);
        true
    }

    /// The logical AND of this rule's criteria, read from their cached results
    /// left to right. Stops at the first `false`. A rule with no criteria is
    /// never applicable.
    ///
    /// # Errors
    ///
    /// Returns [`NotEvaluated`] naming the first unevaluated criterion reached
    /// before any `false` one.
    pub fn applicable(&mut self, pool: &[Criterion]) -> Result<bool, NotEvaluated> {
        let mut applicable = !self.criteria.is_empty();
        for id in &self.criteria {
            if !pool[id.0].result()? {
                applicable = false;
                break;
            }
        }
        self.determined = true;
        Ok(applicable)
    }

    /// Run every action in ascending sequence order. The first failure stops
    /// the sequence.
    ///
    /// # Errors
    ///
    /// [`ActionError::NoActions`] if the rule has no actions,
    /// [`ActionError::ApplicabilityUndetermined`] if [`applicable`](Self::applicable)
    /// has not succeeded, otherwise [`ActionError::Sequence`] wrapping the first
    /// failing action's error.
    pub fn execute_actions(&mut self) -> Result<(), ActionError> {
        if self.actions.is_empty() {
            return Err(ActionError::NoActions);
        }
        if !self.determined {
            return Err(ActionError::ApplicabilityUndetermined);
        }
        for (&sequence, action) in &mut self.actions {
            action.execute().map_err(|source| ActionError::Sequence {
                sequence,
                source: Box::new(source),
            })?;
        }
        Ok(())
    }

    pub(crate) fn reset(&mut self) {
        self.determined = false;
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("criteria", &self.criteria)
            .field("actions", &self.actions)
            .field("determined", &self.determined)
            .finish()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule [id={}, name={}]", self.id, self.name)
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::actions::Parameter;
    use crate::logic::LogicUnit;
    use crate::LogicError;

    #[derive(Debug)]
    struct Fixed;

    impl LogicUnit for Fixed {
        fn kind(&self) -> &str {
            "Fixed"
        }

        fn evaluate(&self, _: &str, value: &str, _: &dyn Any) -> Result<bool, LogicError> {
            Ok(value == "true")
        }
    }

    #[derive(Debug)]
    struct Scripted {
        label: &'static str,
        fail: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Action for Scripted {
        fn add_parameter(&mut self, _: &str, _: &str) -> Result<(), ActionError> {
            Ok(())
        }

        fn parameters(&self) -> &[Parameter] {
            &[]
        }

        fn execute(&mut self) -> Result<(), ActionError> {
            self.log.lock().push(self.label);
            if self.fail {
                Err(ActionError::ExecutionFailed(format!("{} broke", self.label)))
            } else {
                Ok(())
            }
        }
    }

    fn pool(values: &[&str]) -> Vec<Criterion> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Criterion::new(format!("c{i}"), Arc::new(Fixed), "Is", *v))
            .collect()
    }

    fn evaluate_all(pool: &mut [Criterion]) {
        for c in pool.iter_mut() {
            c.evaluate(&()).unwrap();
        }
    }

    fn rule_over(ids: &[usize]) -> Rule {
        let mut rule = Rule::new(1, "r");
        for &i in ids {
            rule.add_criterion(CriterionId(i));
        }
        rule
    }

    fn scripted(label: &'static str, fail: bool, log: &Arc<Mutex<Vec<&'static str>>>) -> Box<dyn Action> {
        Box::new(Scripted {
            label,
            fail,
            log: Arc::clone(log),
        })
    }

    #[test]
    fn applicable_is_conjunction() {
        let mut pool = pool(&["true", "true", "false"]);
        evaluate_all(&mut pool);
        assert!(rule_over(&[0, 1]).applicable(&pool).unwrap());
        assert!(!rule_over(&[0, 2]).applicable(&pool).unwrap());
        assert!(!rule_over(&[2, 0]).applicable(&pool).unwrap());
    }

    #[test]
    fn applicable_short_circuits_before_unevaluated() {
        let mut pool = pool(&["false", "true"]);
        pool[0].evaluate(&()).unwrap();
        // c1 never evaluated, but c0 is false first
        let mut rule = rule_over(&[0, 1]);
        assert_eq!(rule.applicable(&pool), Ok(false));
        assert!(rule.is_determined());
    }

    #[test]
    fn applicable_names_first_unevaluated() {
        let mut pool = pool(&["true", "true", "true"]);
        pool[0].evaluate(&()).unwrap();
        let mut rule = rule_over(&[0, 1, 2]);
        let err = rule.applicable(&pool).unwrap_err();
        assert_eq!(err.criterion, "c1");
        assert!(!rule.is_determined());
    }

    #[test]
    fn empty_rule_is_not_applicable() {
        let mut rule = rule_over(&[]);
        assert!(!rule.applicable(&[]).unwrap());
        assert!(matches!(rule.execute_actions(), Err(ActionError::NoActions)));
    }

    #[test]
    fn determined_even_when_false() {
        let mut pool = pool(&["false"]);
        evaluate_all(&mut pool);
        let mut rule = rule_over(&[0]);
        assert!(!rule.applicable(&pool).unwrap());
        assert!(rule.is_determined());
    }

    #[test]
    fn criteria_are_a_set() {
        let mut rule = Rule::new(1, "r");
        assert!(rule.add_criterion(CriterionId(3)));
        assert!(!rule.add_criterion(CriterionId(3)));
        assert!(rule.add_criterion(CriterionId(1)));
        assert_eq!(rule.criteria(), &[CriterionId(3), CriterionId(1)]);
    }

    #[test]
    fn execute_without_actions() {
        let mut rule = rule_over(&[]);
        assert!(matches!(rule.execute_actions(), Err(ActionError::NoActions)));
    }

    #[test]
    fn execute_before_applicability() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut rule = rule_over(&[0]);
        rule.add_action(1, scripted("a1", false, &log));
        assert!(matches!(
            rule.execute_actions(),
            Err(ActionError::ApplicabilityUndetermined)
        ));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn actions_run_in_sequence_order_and_stop_at_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pool = pool(&["true"]);
        evaluate_all(&mut pool);
        let mut rule = rule_over(&[0]);
        rule.add_action(3, scripted("a3", false, &log));
        rule.add_action(1, scripted("a1", false, &log));
        rule.add_action(2, scripted("a2", true, &log));
        rule.applicable(&pool).unwrap();

        let err = rule.execute_actions().unwrap_err();
        assert_eq!(err.sequence(), Some(2));
        assert!(err.to_string().contains("#2"));
        assert_eq!(*log.lock(), vec!["a1", "a2"]);
    }

    #[test]
    fn first_action_at_sequence_wins() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut rule = rule_over(&[]);
        assert!(rule.add_action(1, scripted("first", false, &log)));
        assert!(!rule.add_action(1, scripted("second", false, &log)));
        assert_eq!(rule.action_count(), 1);
        assert_eq!(rule.sequences().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn reset_clears_determination() {
        let mut pool = pool(&["true"]);
        evaluate_all(&mut pool);
        let mut rule = rule_over(&[0]);
        rule.applicable(&pool).unwrap();
        rule.reset();
        assert!(!rule.is_determined());
    }

    #[test]
    fn display() {
        assert_eq!(Rule::new(4, "Notify").to_string(), "Rule [id=4, name=Notify]");
    }
}
