//! Base types and functions.

pub use std::collections::{HashMap, HashSet};
pub use std::fmt;
pub use std::io::Write;
pub use std::sync::RwLock;

pub use either::Either;
pub use hashconsing::{HConsed, HConsign, HashConsign};
pub use num::{One, Signed, Zero};
pub use rsmt2::{SmtRes, Solver};

pub use crate::errors::*;
pub use crate::grammar::{Grammar, NtDef, Prod};
pub use crate::instance::{FunApp, Instance, PbeExample, SynthTarget, VarInfo};
pub use crate::term;
pub use crate::term::{Op, RTerm, Term, Typ};
pub use crate::val;
pub use crate::val::{RVal, Val};

#[macro_use]
pub mod macros;
pub mod config;
pub mod profiling;
pub mod smt;
mod wrappers;

pub use self::config::*;
pub use self::profiling::{DurationExt, Profiler};
pub use self::wrappers::*;

lazy_static! {
    /// Configuration from clap.
    pub static ref conf: Config = Config::clap();
}

/// Alias type for `std::io` results.
pub type IoRes<T> = ::std::io::Result<T>;

/// Integers.
pub type Int = ::num::BigInt;

/// A concrete assignment to the base auxiliary variables.
pub type Point = VarMap<Val>;

/// Solution for one solve: an expression per synthesis target.
pub type Solution = Vec<(TgtIdx, Term)>;

/// All solutions found during a solve.
///
/// A singleton list under current semantics, shaped as a list to admit
/// future enumeration of multiple solutions.
pub type Solutions = Vec<Solution>;
