//! SMT-related zero-cost wrappers.

use std::str::FromStr;

use rsmt2::parse::{IdentParser, ModelParser, ValueParser};
use rsmt2::print::{Expr2Smt, Sort2Smt};

use crate::common::*;

/// SMT-prints a term using the default var writer.
pub struct SmtTerm<'a> {
    /// The term.
    pub term: &'a Term,
}
impl<'a> SmtTerm<'a> {
    /// Constructor.
    pub fn new(term: &'a Term) -> Self {
        SmtTerm { term }
    }
}
impl<'a> Expr2Smt<()> for SmtTerm<'a> {
    fn expr_to_smt2<Writer: Write>(&self, w: &mut Writer, _: ()) -> SmtRes<()> {
        self.term.write(w, |w, var| var.default_write(w))?;
        Ok(())
    }
}

/// SMT-prints the negation of a term using the default var writer.
///
/// Validity of `t` is checked as unsatisfiability of `(not t)`.
pub struct SmtNegTerm<'a> {
    /// The term.
    pub term: &'a Term,
}
impl<'a> SmtNegTerm<'a> {
    /// Constructor.
    pub fn new(term: &'a Term) -> Self {
        SmtNegTerm { term }
    }
}
impl<'a> Expr2Smt<()> for SmtNegTerm<'a> {
    fn expr_to_smt2<Writer: Write>(&self, w: &mut Writer, _: ()) -> SmtRes<()> {
        write!(w, "(not ")?;
        self.term.write(w, |w, var| var.default_write(w))?;
        write!(w, ")")?;
        Ok(())
    }
}

impl Sort2Smt for Typ {
    fn sort_to_smt2<Writer: Write>(&self, w: &mut Writer) -> SmtRes<()> {
        match *self {
            Typ::Int => write!(w, "Int")?,
            Typ::Bool => write!(w, "Bool")?,
        }
        Ok(())
    }
}

/// Unit type parsing the output of the SMT solver.
///
/// Parses variables of the form `v_<int>` and integer or boolean constants.
/// Designed to parse models of the falsification of a constraint whose
/// variables are written as `v_<index>` in smt2.
#[derive(Clone, Copy)]
pub struct FullParser;

impl<'a> IdentParser<VarIdx, (), &'a str> for FullParser {
    fn parse_ident(self, input: &'a str) -> SmtRes<VarIdx> {
        if input.len() < 3 || &input[0..2] != "v_" {
            bail!("unexpected symbol `{}` in model", input)
        }
        match usize::from_str(&input[2..]) {
            Ok(idx) => Ok(idx.into()),
            Err(e) => bail!("could not retrieve var index from `{}`: {}", input, e),
        }
    }
    fn parse_type(self, _: &'a str) -> SmtRes<()> {
        Ok(())
    }
}

impl<'a> ValueParser<Val, &'a str> for FullParser {
    fn parse_value(self, input: &'a str) -> SmtRes<Val> {
        let input = input.trim();
        if let Some(b) = bool_of_value(input) {
            return Ok(val::bool(b));
        }
        if let Some(i) = int_of_value(input) {
            return Ok(val::int(i));
        }
        bail!("unexpected value `{}` in model", input)
    }
}

impl<'a> ModelParser<VarIdx, (), Val, &'a str> for FullParser {
    fn parse_value(
        self,
        input: &'a str,
        _id: &VarIdx,
        _args: &[(VarIdx, ())],
        _out: &(),
    ) -> SmtRes<Val> {
        ValueParser::parse_value(self, input)
    }
}

/// Parses a boolean value.
fn bool_of_value(input: &str) -> Option<bool> {
    match input {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parses an integer value, possibly of the form `(- <int>)`.
fn int_of_value(input: &str) -> Option<Int> {
    if let Ok(i) = Int::from_str(input) {
        return Some(i);
    }
    let input = input.trim();
    if input.starts_with('(') && input.ends_with(')') {
        let inner = input[1..input.len() - 1].trim();
        if let Some(sub) = inner.strip_prefix('-') {
            if let Ok(i) = Int::from_str(sub.trim()) {
                return Some(-i);
            }
        }
    }
    None
}
