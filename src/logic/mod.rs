//! Logic units: named families of boolean sub-predicates bound to one record type.
//!
//! A unit is stateless between calls. The record under evaluation is passed as
//! `&dyn Any` and downcast to the unit's record type, so new record types plug
//! in by registering a new unit, without touching the engine.

mod observation;
mod patient;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{LoadError, LogicError};

pub use observation::{observation_logic, ObservationData, ObservationLogic};
pub use patient::{patient_logic, patient_logic_as_of, Gender, PatientData, PatientLogic};

/// A family of named boolean sub-predicates over one record type.
pub trait LogicUnit: fmt::Debug + Send + Sync {
    /// The identifier this unit is registered under, e.g. `"Patient"`.
    fn kind(&self) -> &str;

    /// Evaluate `predicate` with `check_value` against `record`.
    ///
    /// # Errors
    ///
    /// [`LogicError::UnknownSubPredicate`] if `predicate` is not registered
    /// (checked first), [`LogicError::IncompatibleDataType`] if `record` is not
    /// of this unit's record type, [`LogicError::InvalidCheckValue`] if the
    /// sub-predicate cannot interpret `check_value`.
    fn evaluate(
        &self,
        predicate: &str,
        check_value: &str,
        record: &dyn Any,
    ) -> Result<bool, LogicError>;
}

type Predicate<T> = Box<dyn Fn(&T, &str) -> Result<bool, LogicError> + Send + Sync>;

/// A [`LogicUnit`] backed by a table of sub-predicate closures over `T`.
///
/// Sub-predicates are registered once at construction with [`with`](Self::with).
pub struct PredicateTable<T> {
    kind: String,
    predicates: HashMap<&'static str, Predicate<T>>,
}

impl<T: Any> PredicateTable<T> {
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            predicates: HashMap::new(),
        }
    }

    /// Register a sub-predicate under `name`.
    #[must_use]
    pub fn with(
        mut self,
        name: &'static str,
        predicate: impl Fn(&T, &str) -> Result<bool, LogicError> + Send + Sync + 'static,
    ) -> Self {
        self.predicates.insert(name, Box::new(predicate));
        self
    }

    /// Names of the registered sub-predicates, sorted.
    #[must_use]
    pub fn predicate_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.predicates.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl<T: Any> LogicUnit for PredicateTable<T> {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn evaluate(
        &self,
        predicate: &str,
        check_value: &str,
        record: &dyn Any,
    ) -> Result<bool, LogicError> {
        let Some(f) = self.predicates.get(predicate) else {
            return Err(LogicError::UnknownSubPredicate {
                unit: self.kind.clone(),
                predicate: predicate.to_owned(),
            });
        };
        let Some(record) = record.downcast_ref::<T>() else {
            return Err(LogicError::IncompatibleDataType {
                unit: self.kind.clone(),
                expected: short_type_name::<T>(),
            });
        };
        f(record, check_value)
    }
}

impl<T: Any> fmt::Debug for PredicateTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateTable")
            .field("kind", &self.kind)
            .field("record", &short_type_name::<T>())
            .field("predicates", &self.predicate_names())
            .finish()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

pub(crate) fn invalid_check_value(
    predicate: &str,
    value: &str,
    reason: impl fmt::Display,
) -> LogicError {
    LogicError::InvalidCheckValue {
        predicate: predicate.to_owned(),
        value: value.to_owned(),
        reason: reason.to_string(),
    }
}

type LogicConstructor = Arc<dyn Fn() -> Arc<dyn LogicUnit> + Send + Sync>;

/// Maps logic unit identifiers to constructors.
///
/// # Example
///
/// ```
/// use criteria_engine::LogicRegistry;
///
/// let registry = LogicRegistry::with_defaults();
/// assert!(registry.create("Patient").is_ok());
/// assert!(registry.create("Medication").is_err());
/// ```
#[derive(Clone, Default)]
pub struct LogicRegistry {
    constructors: HashMap<String, LogicConstructor>,
}

impl LogicRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in `Patient` and `Observation` units.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .register(patient::KIND, || Arc::new(patient_logic()))
            .register(observation::KIND, || Arc::new(observation_logic()))
    }

    /// Register (or replace) the constructor for `kind`.
    #[must_use]
    pub fn register(
        mut self,
        kind: impl Into<String>,
        constructor: impl Fn() -> Arc<dyn LogicUnit> + Send + Sync + 'static,
    ) -> Self {
        self.constructors.insert(kind.into(), Arc::new(constructor));
        self
    }

    /// Construct the unit registered under `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::UnknownLogicUnitType`] for unregistered identifiers
    /// and [`LoadError::LogicUnitKindMismatch`] if the constructed unit's
    /// [`kind`](LogicUnit::kind) differs from `kind`.
    pub fn create(&self, kind: &str) -> Result<Arc<dyn LogicUnit>, LoadError> {
        let ctor = self
            .constructors
            .get(kind)
            .ok_or_else(|| LoadError::UnknownLogicUnitType(kind.to_owned()))?;
        let unit = ctor();
        if unit.kind() != kind {
            return Err(LoadError::LogicUnitKindMismatch {
                registered: kind.to_owned(),
                reported: unit.kind().to_owned(),
            });
        }
        Ok(unit)
    }

    /// Registered identifiers, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl fmt::Debug for LogicRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
