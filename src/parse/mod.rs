mod error;
mod grammar;

pub use error::ParseError;

/// A parsed criterion logic spec of the form `Unit.SubPredicate[=value]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicSpec {
    pub unit: String,
    pub predicate: String,
    /// Everything after the sub-predicate name, minus one leading `=`.
    /// Empty when the spec carries no value.
    pub check_value: String,
}

/// Parse a logic spec string such as `"Patient.AgeGreaterThan=22"`.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid logic spec.
pub fn parse_logic_spec(input: &str) -> Result<LogicSpec, ParseError> {
    use winnow::Parser;
    grammar::logic_spec
        .parse(input)
        .map_err(|e| ParseError {
            message: e.to_string(),
        })
}
