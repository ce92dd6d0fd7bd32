use std::fmt;

use chrono::{NaiveDate, Utc};

use super::{invalid_check_value, PredicateTable};

pub(super) const KIND: &str = "Patient";

/// Birth sex of a patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Gender {
    Male,
    Female,
}

/// Demographic record evaluated by the `Patient` logic unit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PatientData {
    pub gender: Gender,
    pub birth_date: NaiveDate,
}

impl PatientData {
    #[must_use]
    pub fn new(gender: Gender, birth_date: NaiveDate) -> Self {
        Self { gender, birth_date }
    }

    /// Build a record from a `YYYY-MM-DD` birth date.
    ///
    /// # Errors
    ///
    /// Returns [`chrono::ParseError`] if the date is malformed.
    pub fn parse(gender: Gender, birth_date: &str) -> Result<Self, chrono::ParseError> {
        let birth_date = NaiveDate::parse_from_str(birth_date, "%Y-%m-%d")?;
        Ok(Self { gender, birth_date })
    }

    /// Whole years elapsed between the birth date and `today`; zero for
    /// birth dates in the future.
    #[must_use]
    pub fn age_on(&self, today: NaiveDate) -> i64 {
        today.years_since(self.birth_date).map_or(0, i64::from)
    }
}

impl fmt::Display for PatientData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PatientData({:?}, born {})", self.gender, self.birth_date)
    }
}

pub type PatientLogic = PredicateTable<PatientData>;

/// The `Patient` unit, computing ages against the current UTC date.
///
/// | Sub-predicate    | Comparison value | True when                         |
/// |------------------|------------------|-----------------------------------|
/// | `IsFemale`       | ignored          | gender is [`Gender::Female`]      |
/// | `AgeGreaterThan` | integer years    | age in whole years exceeds value  |
#[must_use]
pub fn patient_logic() -> PatientLogic {
    build(|| Utc::now().date_naive())
}

/// The `Patient` unit with ages computed as of a fixed date.
#[must_use]
pub fn patient_logic_as_of(today: NaiveDate) -> PatientLogic {
    build(move || today)
}

fn build(today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> PatientLogic {
    PredicateTable::new(KIND)
        .with("IsFemale", |patient: &PatientData, _| {
            Ok(patient.gender == Gender::Female)
        })
        .with("AgeGreaterThan", move |patient: &PatientData, value| {
            let limit: i64 = value
                .parse()
                .map_err(|e| invalid_check_value("AgeGreaterThan", value, e))?;
            Ok(patient.age_on(today()) > limit)
        })
}
