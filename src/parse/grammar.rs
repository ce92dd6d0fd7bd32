use winnow::combinator::{cut_err, opt, preceded};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{rest, take_while};

use super::LogicSpec;

// -- Names ------------------------------------------------------------------

fn name<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)
}

// -- Comparison value -------------------------------------------------------

// The `=` is optional: `Patient.AgeGreaterThan22` carries the value `22`.
fn check_value<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    preceded(opt('='), rest).parse_next(input)
}

// -- Top-level parser -------------------------------------------------------

pub fn logic_spec(input: &mut &str) -> ModalResult<LogicSpec> {
    let unit = name
        .context(StrContext::Expected(StrContextValue::Description(
            "logic unit name",
        )))
        .parse_next(input)?;

    cut_err('.')
        .context(StrContext::Expected(StrContextValue::CharLiteral('.')))
        .parse_next(input)?;

    let predicate = cut_err(name)
        .context(StrContext::Expected(StrContextValue::Description(
            "sub-predicate name",
        )))
        .parse_next(input)?;

    let check_value = check_value(input)?;

    Ok(LogicSpec {
        unit: unit.to_owned(),
        predicate: predicate.to_owned(),
        check_value: check_value.to_owned(),
    })
}
