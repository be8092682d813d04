//! Cegen synthesizes executable expressions from logical specifications.
//!
//! Given a [`Grammar`] describing a space of candidate expressions and an
//! [`Instance`] carrying a first-order constraint over one or more unknown
//! functions, the [`CegSolver`] searches for expressions that make the
//! constraint valid under a decision procedure for the background theory.
//!
//! The search is counter-example guided: candidates are enumerated by
//! increasing cost, checked *concretely* on an accumulated set of points,
//! pruned when their behavior signature duplicates a previous candidate's,
//! and only then submitted to the validity [`Oracle`]. A counter-example
//! from the oracle becomes a new point and restarts enumeration.
//!
//! When the constraint is a conjunction of input/output examples, the solver
//! switches to programming-by-example mode: it discovers one terminal
//! expression per group of compatible examples and unifies them with a
//! decision tree over synthesized predicates.
//!
//! [`Grammar`]: grammar/struct.Grammar.html (Grammar struct)
//! [`Instance`]: instance/struct.Instance.html (Instance struct)
//! [`CegSolver`]: solver/struct.CegSolver.html (CegSolver struct)
//! [`Oracle`]: oracle/trait.Oracle.html (Oracle trait)

#![allow(non_upper_case_globals)]

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate lazy_static;

#[macro_use]
pub mod common;
pub mod errors;

pub mod val;
pub mod term;

pub mod grammar;
pub mod instance;

pub mod data;
pub mod enumerator;
pub mod oracle;
pub mod solver;

use crate::common::*;
use crate::oracle::Oracle;
use crate::solver::{CegSolver, SolveStats};

/// Solves a synthesis instance with the given oracle.
///
/// Convenience entry point: runs a [`CegSolver`] with the global
/// configuration's solver options and returns the solutions along with the
/// solve counters. An empty solution list means the cost budget was
/// exhausted.
///
/// [`CegSolver`]: solver/struct.CegSolver.html (CegSolver struct)
pub fn solve<O: Oracle>(instance: &Instance, oracle: O) -> Res<(Solutions, SolveStats)> {
    let mut solver = CegSolver::new(instance, oracle);
    let solutions = solver.solve()?;
    Ok((solutions, solver.stats().clone()))
}
