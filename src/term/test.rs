//! Tests for the term structure.

use crate::common::*;
use crate::term::{self, Op};

#[test]
fn cst_add() {
    let c_1 = term::int(7);
    let c_2 = term::int(3);
    let sum = term::app(Op::Add, vec![c_1, c_2]);
    let model = model!();
    assert_eval!(int model => sum, 10)
}

#[test]
fn cst_sub() {
    let c_1 = term::int(7);
    let c_2 = term::int(3);
    let sub = term::app(Op::Sub, vec![c_1, c_2]);
    let model = model!();
    assert_eval!(int model => sub, 4)
}

#[test]
fn cst_minus() {
    let c_1 = term::int(7);
    let sub = term::app(Op::Sub, vec![c_1]);
    let model = model!();
    assert_eval!(int model => sub, (-7))
}

#[test]
fn cst_mul() {
    let c_1 = term::int(7);
    let c_2 = term::int(3);
    let mul = term::app(Op::Mul, vec![c_1, c_2]);
    let model = model!();
    assert_eval!(int model => mul, 21)
}

#[test]
fn cst_div() {
    let c_1 = term::int(7);
    let c_2 = term::int(3);
    let div = term::app(Op::IDiv, vec![c_1, c_2]);
    let model = model!();
    assert_eval!(int model => div, 2)
}

#[test]
fn cst_mod() {
    let c_1 = term::int(7);
    let c_2 = term::int(3);
    let m0d = term::app(Op::Mod, vec![c_1, c_2]);
    let model = model!();
    assert_eval!(int model => m0d, 1)
}

#[test]
fn euclidean_negatives() {
    // Remainder stays in `[0, |b|)`, as in smt-lib 2.
    let model = model!();
    assert_eval!(
        int model => term::modulo(term::int(-7), term::int(3)), 2
    );
    assert_eval!(
        int model => term::idiv(term::int(-7), term::int(3)), (-3)
    );
    assert_eval!(
        int model => term::modulo(term::int(7), term::int(-3)), 1
    );
    assert_eval!(
        int model => term::idiv(term::int(7), term::int(-3)), (-2)
    );
}

#[test]
fn div_by_zero_is_stuck() {
    let div = term::idiv(term::int(7), term::int(0));
    let model = model!();
    let res = div.eval(&model).expect("evaluation failed");
    assert_eq!(res, val::none());
    // The non-value propagates through operators.
    let sum = term::add(term::idiv(term::int(7), term::int(0)), term::int(1));
    let res = sum.eval(&model).expect("evaluation failed");
    assert_eq!(res, val::none())
}

#[test]
fn cst_gt() {
    let gt = term::gt(term::int(7), term::int(3));
    let model = model!();
    assert_eval!(bool model => gt)
}

#[test]
fn cst_le() {
    let le = term::le(term::int(7), term::int(3));
    let model = model!();
    assert_eval!(bool not model => le)
}

#[test]
fn var_eval() {
    let x = term::var(Typ::Int, 0);
    let y = term::var(Typ::Int, 1);
    let t = term::add(x, term::mul(term::int(2), y));
    let model = model!(val::int(3), val::int(5));
    assert_eval!(int model => t, 13)
}

#[test]
fn ite_eval() {
    let x = term::var(Typ::Int, 0);
    let y = term::var(Typ::Int, 1);
    let max = term::ite(term::le(x.clone(), y.clone()), y, x);
    let model = model!(val::int(3), val::int(5));
    assert_eval!(int model => max, 5);
    let model = model!(val::int(5), val::int(3));
    assert_eval!(int model => max, 5)
}

#[test]
fn implication_short_circuits() {
    // A false antecedent hides a stuck consequent.
    let stuck = term::eq(
        term::idiv(term::int(1), term::int(0)),
        term::int(0),
    );
    let t = term::implies(term::bool(false), stuck);
    let model = model!();
    assert_eval!(bool model => t)
}

#[test]
fn subst_replaces_vars() {
    let x = term::var(Typ::Int, 0);
    let d = term::var(Typ::Int, 1);
    let constraint = term::ge(d.clone(), x.clone());
    let mut map = VarHMap::new();
    map.insert(1.into(), term::add(x.clone(), term::int(1)));
    let constraint = constraint.subst(&map);
    let model = model!(val::int(7));
    assert_eval!(bool model => constraint)
}

#[test]
fn size_counts_nodes() {
    let x = term::var(Typ::Int, 0);
    let y = term::var(Typ::Int, 1);
    let max = term::ite(term::le(x.clone(), y.clone()), y, x);
    assert_eq!(max.size(), 6)
}

#[test]
fn display_is_smt2() {
    let x = term::var(Typ::Int, 0);
    let t = term::add(x, term::int(-2));
    assert_eq!(format!("{}", t), "(+ v_0 (- 2))")
}
