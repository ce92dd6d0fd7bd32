use super::{invalid_check_value, PredicateTable};

pub(super) const KIND: &str = "Observation";

/// Clinical measurements evaluated by the `Observation` logic unit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObservationData {
    /// Body weight.
    pub weight: f64,
    /// Blood glucose in mg/dL.
    pub glucose: f64,
}

impl ObservationData {
    #[must_use]
    pub fn new(weight: f64, glucose: f64) -> Self {
        Self { weight, glucose }
    }
}

pub type ObservationLogic = PredicateTable<ObservationData>;

/// The `Observation` unit.
///
/// | Sub-predicate           | Comparison value | True when              |
/// |-------------------------|------------------|------------------------|
/// | `BodyWeightGreaterThan` | number           | weight > value         |
/// | `BloodGlucoseLessThan`  | number (mg/dL)   | glucose < value        |
#[must_use]
pub fn observation_logic() -> ObservationLogic {
    PredicateTable::new(KIND)
        .with("BodyWeightGreaterThan", |obs: &ObservationData, value| {
            Ok(obs.weight > parse_number("BodyWeightGreaterThan", value)?)
        })
        .with("BloodGlucoseLessThan", |obs: &ObservationData, value| {
            Ok(obs.glucose < parse_number("BloodGlucoseLessThan", value)?)
        })
}

fn parse_number(predicate: &str, value: &str) -> Result<f64, crate::LogicError> {
    let n: f64 = value
        .parse()
        .map_err(|e| invalid_check_value(predicate, value, e))?;
    if n.is_finite() {
        Ok(n)
    } else {
        Err(invalid_check_value(predicate, value, "not a finite number"))
    }
}
