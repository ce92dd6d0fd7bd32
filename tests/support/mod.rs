#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use criteria_engine::{
    patient_logic_as_of, Action, ActionError, ActionRegistry, ActionRow, LogicRegistry, Parameter,
};
use parking_lot::Mutex;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// Default units, with `Patient` ages computed as of [`today`].
pub fn logic() -> LogicRegistry {
    LogicRegistry::with_defaults().register("Patient", || Arc::new(patient_logic_as_of(today())))
}

/// Shared log of executed `Record` actions.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
    created: Arc<AtomicUsize>,
}

impl Journal {
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Number of `Record` actions constructed so far.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Default actions plus `Record`, which appends its `label` to this journal.
    pub fn registry(&self) -> ActionRegistry {
        let journal = self.clone();
        ActionRegistry::with_defaults().register("Record", move || {
            journal.created.fetch_add(1, Ordering::SeqCst);
            Box::new(Recorder {
                journal: journal.clone(),
                label: String::new(),
                fail: false,
                parameters: Vec::new(),
            })
        })
    }
}

#[derive(Debug)]
struct Recorder {
    journal: Journal,
    label: String,
    fail: bool,
    parameters: Vec<Parameter>,
}

impl Action for Recorder {
    fn add_parameter(&mut self, name: &str, value: &str) -> Result<(), ActionError> {
        match name {
            "label" => self.label = value.to_owned(),
            "fail" => self.fail = value == "true",
            _ => {
                return Err(ActionError::InvalidParameter {
                    name: name.to_owned(),
                    value: value.to_owned(),
                    reason: "unknown parameter".into(),
                })
            }
        }
        self.parameters.push(Parameter::new(name, value));
        Ok(())
    }

    fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    fn execute(&mut self) -> Result<(), ActionError> {
        if self.fail {
            return Err(ActionError::ExecutionFailed(format!("{} refused", self.label)));
        }
        self.journal.entries.lock().push(self.label.clone());
        Ok(())
    }
}

pub fn record(rule_id: i64, sequence: u32, label: &str) -> ActionRow {
    ActionRow::new(rule_id, sequence, label, "Record", "label", label)
}

/// Rows for a `Record` action that fails when executed.
pub fn failing(rule_id: i64, sequence: u32, label: &str) -> [ActionRow; 2] {
    [
        record(rule_id, sequence, label),
        ActionRow::new(rule_id, sequence, label, "Record", "fail", "true"),
    ]
}
