//! The action contract and the registry that resolves function identifiers
//! to action constructors.

mod send_email;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{ActionError, LoadError};

pub use send_email::{LogMailer, MailError, Mailer, SendEmail};

/// One name/value parameter of an action, in the order it was added.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A parameterized unit of side-effecting work run by an applicable rule.
pub trait Action: fmt::Debug + Send {
    /// Add one parameter. Parameters accumulate in call order.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::InvalidParameter`] if the name or value is not
    /// accepted by this action.
    fn add_parameter(&mut self, name: &str, value: &str) -> Result<(), ActionError>;

    /// Parameters accepted so far, in the order they were added.
    fn parameters(&self) -> &[Parameter];

    /// Perform the work.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::ExecutionFailed`] if the work could not be done.
    fn execute(&mut self) -> Result<(), ActionError>;
}

type ActionConstructor = Arc<dyn Fn() -> Box<dyn Action> + Send + Sync>;

/// Maps action function identifiers (e.g. `"SendEmail"`) to constructors.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    constructors: HashMap<String, ActionConstructor>,
}

impl ActionRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `SendEmail` delivering through a [`LogMailer`].
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::with_mailer(Arc::new(LogMailer), send_email::DEFAULT_FROM)
    }

    /// `SendEmail` delivering through `mailer`, sent from `from`.
    #[must_use]
    pub fn with_mailer(mailer: Arc<dyn Mailer>, from: impl Into<String>) -> Self {
        let from = from.into();
        Self::new().register(send_email::FUNCTION, move || {
            Box::new(SendEmail::new(Arc::clone(&mailer), from.clone()))
        })
    }

    /// Register (or replace) the constructor for `function`.
    #[must_use]
    pub fn register(
        mut self,
        function: impl Into<String>,
        constructor: impl Fn() -> Box<dyn Action> + Send + Sync + 'static,
    ) -> Self {
        self.constructors.insert(function.into(), Arc::new(constructor));
        self
    }

    /// Construct a fresh action for `function`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::UnknownActionType`] for unregistered identifiers.
    pub fn create(&self, function: &str) -> Result<Box<dyn Action>, LoadError> {
        self.constructors
            .get(function)
            .map(|ctor| ctor())
            .ok_or_else(|| LoadError::UnknownActionType(function.to_owned()))
    }

    /// Registered identifiers, sorted.
    #[must_use]
    pub fn functions(&self) -> Vec<&str> {
        let mut functions: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        functions.sort_unstable();
        functions
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("functions", &self.functions())
            .finish()
    }
}
