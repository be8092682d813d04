//! Error types.
//!
//! Two outcomes are deliberately *not* errors: exhausting the cost budget
//! (the solve returns an empty solution list) and a counter-example from
//! the oracle (it becomes a new point). Everything defined here aborts the
//! solve.

use crate::common::*;

error_chain! {
    types {
        Error, ErrorKind, ResultExt, Res;
    }

    links {
        SmtError(
            ::rsmt2::errors::Error, ::rsmt2::errors::ErrorKind
        ) #[doc = "Error at SMT level."];
    }

    foreign_links {
        Io(::std::io::Error) #[doc = "IO error."];
    }

    errors {
        #[doc = "The background theory could not decide a validity query."]
        Unknown {
            description("smt solver reported `unknown`")
            display("the background theory could not decide a validity query")
        }
        #[doc = "Resource ceiling reached, fatal to the current solve."]
        Timeout {
            description("timeout")
            display("timeout")
        }
        #[doc = "The specification has a shape the solver does not handle."]
        SpecShape(msg: String) {
            description("unsupported specification shape")
            display("unsupported specification shape: {}", msg)
        }
    }
}

impl Error {
    /// True if the kind of the error is [`ErrorKind::Unknown`][unknown].
    ///
    /// [unknown]: enum.ErrorKind.html#variant.Unknown
    /// (ErrorKind's Unknown variant)
    pub fn is_unknown(&self) -> bool {
        match *self.kind() {
            ErrorKind::Unknown => true,
            _ => false,
        }
    }

    /// True if the kind of the error is [`ErrorKind::Timeout`][timeout].
    ///
    /// [timeout]: enum.ErrorKind.html#variant.Timeout
    /// (ErrorKind's Timeout variant)
    pub fn is_timeout(&self) -> bool {
        match *self.kind() {
            ErrorKind::Timeout => true,
            _ => false,
        }
    }

    /// True if the kind of the error is [`ErrorKind::SpecShape`][shape].
    ///
    /// [shape]: enum.ErrorKind.html#variant.SpecShape
    /// (ErrorKind's SpecShape variant)
    pub fn is_spec_shape(&self) -> bool {
        match *self.kind() {
            ErrorKind::SpecShape(_) => true,
            _ => false,
        }
    }
}

/// Prints an error.
pub fn print_err(errs: &Error) {
    println!("({} \"", conf.bad("error"));
    for err in errs.iter() {
        for line in format!("{}", err).lines() {
            println!("  {}", line)
        }
    }
    println!("\")")
}
