use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::error::{LogicError, NotEvaluated};
use crate::logic::LogicUnit;

/// Position of a criterion inside its [`RuleGraph`](super::RuleGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CriterionId(pub(crate) usize);

impl CriterionId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Structural identity of a criterion: two criteria with equal keys are the same
/// criterion and share one instance in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CriterionKey {
    pub name: String,
    pub unit: String,
    pub predicate: String,
    pub check_value: String,
}

/// A named boolean test: one logic unit, one sub-predicate, one comparison value.
///
/// The result is memoized; [`evaluate`](Self::evaluate) runs the predicate at
/// most once until the engine resets the criterion for the next pass.
pub struct Criterion {
    name: String,
    logic: Arc<dyn LogicUnit>,
    predicate: String,
    check_value: String,
    result: Option<bool>,
}

impl Criterion {
    pub fn new(
        name: impl Into<String>,
        logic: Arc<dyn LogicUnit>,
        predicate: impl Into<String>,
        check_value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            logic,
            predicate: predicate.into(),
            check_value: check_value.into(),
            result: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of the logic unit, e.g. `"Patient"`.
    #[must_use]
    pub fn unit(&self) -> &str {
        self.logic.kind()
    }

    #[must_use]
    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    #[must_use]
    pub fn check_value(&self) -> &str {
        &self.check_value
    }

    #[must_use]
    pub fn key(&self) -> CriterionKey {
        CriterionKey {
            name: self.name.clone(),
            unit: self.unit().to_owned(),
            predicate: self.predicate.clone(),
            check_value: self.check_value.clone(),
        }
    }

    /// Evaluate against `record` and cache the result. A no-op returning the
    /// cached result if already evaluated.
    ///
    /// # Errors
    ///
    /// Propagates the [`LogicError`] from the logic unit; the criterion stays
    /// unevaluated.
    pub fn evaluate(&mut self, record: &dyn Any) -> Result<bool, LogicError> {
        if let Some(result) = self.result {
            return Ok(result);
        }
        let result = self
            .logic
            .evaluate(&self.predicate, &self.check_value, record)?;
        self.result = Some(result);
        Ok(result)
    }

    /// The cached result.
    ///
    /// # Errors
    ///
    /// Returns [`NotEvaluated`] if [`evaluate`](Self::evaluate) has not succeeded
    /// since the last reset.
    pub fn result(&self) -> Result<bool, NotEvaluated> {
        self.result.ok_or_else(|| NotEvaluated {
            criterion: self.name.clone(),
        })
    }

    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        self.result.is_some()
    }

    pub(crate) fn reset(&mut self) {
        self.result = None;
    }

    fn key_parts(&self) -> (&str, &str, &str, &str) {
        (&self.name, self.unit(), &self.predicate, &self.check_value)
    }
}

impl PartialEq for Criterion {
    fn eq(&self, other: &Self) -> bool {
        self.key_parts() == other.key_parts()
    }
}

impl Eq for Criterion {}

impl Hash for Criterion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key_parts().hash(state);
    }
}

impl fmt::Debug for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Criterion")
            .field("name", &self.name)
            .field("unit", &self.unit())
            .field("predicate", &self.predicate)
            .field("check_value", &self.check_value)
            .field("result", &self.result)
            .finish()
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}.{}", self.name, self.unit(), self.predicate)?;
        if !self.check_value.is_empty() {
            write!(f, "={}", self.check_value)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::logic::{patient_logic, Gender, ObservationData, PatientData};

    #[derive(Debug, Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl LogicUnit for Counting {
        fn kind(&self) -> &str {
            "Counting"
        }

        fn evaluate(&self, _: &str, value: &str, _: &dyn Any) -> Result<bool, LogicError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(value == "yes")
        }
    }

    fn patient() -> PatientData {
        PatientData::parse(Gender::Female, "1994-03-23").unwrap()
    }

    #[test]
    fn evaluate_is_memoized() {
        let logic = Arc::new(Counting::default());
        let mut criterion = Criterion::new("c", logic.clone(), "Any", "yes");
        assert!(criterion.evaluate(&()).unwrap());
        assert!(criterion.evaluate(&()).unwrap());
        assert_eq!(logic.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reset_allows_reevaluation() {
        let logic = Arc::new(Counting::default());
        let mut criterion = Criterion::new("c", logic.clone(), "Any", "no");
        criterion.evaluate(&()).unwrap();
        criterion.reset();
        assert!(criterion.result().is_err());
        criterion.evaluate(&()).unwrap();
        assert_eq!(logic.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn result_before_evaluate() {
        let criterion = Criterion::new("IsFemale", Arc::new(patient_logic()), "IsFemale", "");
        assert_eq!(
            criterion.result(),
            Err(NotEvaluated {
                criterion: "IsFemale".into()
            })
        );
    }

    #[test]
    fn incompatible_record_leaves_criterion_unevaluated() {
        let mut criterion = Criterion::new("IsFemale", Arc::new(patient_logic()), "IsFemale", "");
        let err = criterion.evaluate(&ObservationData::default()).unwrap_err();
        assert!(matches!(err, LogicError::IncompatibleDataType { .. }));
        assert!(!criterion.is_evaluated());
        assert!(criterion.evaluate(&patient()).unwrap());
        assert_eq!(criterion.result(), Ok(true));
    }

    #[test]
    fn structural_equality_ignores_instance() {
        let a = Criterion::new("Adult", Arc::new(patient_logic()), "AgeGreaterThan", "17");
        let b = Criterion::new("Adult", Arc::new(patient_logic()), "AgeGreaterThan", "17");
        let c = Criterion::new("Adult", Arc::new(patient_logic()), "AgeGreaterThan", "18");
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
        assert_ne!(a, c);
    }

    #[test]
    fn display() {
        let c = Criterion::new("Adult", Arc::new(patient_logic()), "AgeGreaterThan", "17");
        assert_eq!(c.to_string(), "Adult (Patient.AgeGreaterThan=17)");
        let f = Criterion::new("IsFemale", Arc::new(patient_logic()), "IsFemale", "");
        assert_eq!(f.to_string(), "IsFemale (Patient.IsFemale)");
    }
}
