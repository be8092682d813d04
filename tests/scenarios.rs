//! End-to-end synthesis scenarios over stub oracles.
//!
//! No smt solver is needed: the oracles here decide validity by brute
//! force over a finite grid of inputs, or answer a canned verdict.

use cegen::common::*;
use cegen::data::Evaluator;
use cegen::grammar::Grammar;
use cegen::oracle::{ground_constraint, CexRes, Oracle};
use cegen::solver::pbe::Phase;
use cegen::solver::{CegSolver, State};

/// Decides validity by evaluating the grounded constraint on every tuple
/// of a finite integer grid. The first failing tuple is the
/// counter-example.
struct GridOracle {
    domain: Vec<i64>,
}
impl GridOracle {
    fn new(domain: Vec<i64>) -> Self {
        GridOracle { domain }
    }
}
impl Oracle for GridOracle {
    fn check_validity(&mut self, instance: &Instance, cands: &TgtMap<Term>) -> Res<CexRes> {
        let grounded = ground_constraint(instance, cands)?;
        let dims = instance.base().len();
        let mut odometer = vec![0usize; dims];
        loop {
            let point: Point = odometer
                .iter()
                .map(|idx| val::int(self.domain[*idx]))
                .collect::<Vec<_>>()
                .into();
            if grounded.eval(&point)? != val::bool(true) {
                return Ok(CexRes::Invalid(point));
            }
            let mut dim = 0;
            loop {
                if dim == dims {
                    return Ok(CexRes::Valid);
                }
                odometer[dim] += 1;
                if odometer[dim] < self.domain.len() {
                    break;
                }
                odometer[dim] = 0;
                dim += 1
            }
        }
    }
}

/// Always answers `Unknown`.
struct UnknownOracle;
impl Oracle for UnknownOracle {
    fn check_validity(&mut self, _: &Instance, _: &TgtMap<Term>) -> Res<CexRes> {
        Ok(CexRes::Unknown)
    }
}

/// Panics if queried; for programming-by-example runs, which never reach
/// the oracle.
struct NoOracle;
impl Oracle for NoOracle {
    fn check_validity(&mut self, _: &Instance, _: &TgtMap<Term>) -> Res<CexRes> {
        panic!("programming-by-example should not query the oracle")
    }
}

fn ceg_conf(cost_budget: usize) -> CegConf {
    CegConf {
        cost_budget,
        no_dist: false,
        stats_level: 0,
    }
}

/// Instance with one target `f(x)` and one application slot `v_1`.
fn unary_instance(constraint: Term, grammar: Grammar) -> Instance {
    let mut base = VarMap::new();
    base.push(VarInfo::new("x", Typ::Int));
    let mut params = VarMap::new();
    params.push(Typ::Int);
    let mut targets = TgtMap::new();
    targets.push(SynthTarget::new("f", Typ::Int, grammar, params));
    let mut apps = TgtMap::new();
    apps.push(vec![FunApp::new(1.into(), vec![term::var(Typ::Int, 0)])]);
    Instance::new(constraint, base, targets, apps)
}

/// S1: `f(x) = f(x)` over a constant grammar. The smallest-cost constant
/// wins with a single oracle query.
#[test]
fn trivial_constant() {
    let mut grammar = Grammar::new();
    let start = grammar.add_nt("Start", Typ::Int);
    grammar.add_leaf(start, term::int(0));
    grammar.add_leaf(start, term::int(1));
    grammar.add_leaf(start, term::int(2));

    let d = term::var(Typ::Int, 1);
    let constraint = term::eq(d.clone(), d);
    let instance = unary_instance(constraint, grammar);

    let oracle = GridOracle::new(vec![-1, 0, 1]);
    let mut solver = CegSolver::with_conf(&instance, oracle, ceg_conf(4));
    let solutions = solver.solve().expect("solve failed");

    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0], vec![(TgtIdx::zero(), term::int(0))]);
    assert_eq!(solver.stats().oracle_queries, 1);
    assert_eq!(solver.stats().restarts, 0);
    assert_eq!(solver.stats().solution_size, Some(1));
    assert_eq!(solver.state(), State::Completed)
}

/// Max2 instance: `f(x, y) ≥ x ∧ f(x, y) ≥ y ∧ (f = x ∨ f = y)` over a
/// grammar with `if`, `≤` and the two variables.
fn max2_instance() -> Instance {
    let x = term::var(Typ::Int, 0);
    let y = term::var(Typ::Int, 1);
    let d = term::var(Typ::Int, 2);
    let constraint = term::and(vec![
        term::ge(d.clone(), x.clone()),
        term::ge(d.clone(), y.clone()),
        term::or(vec![
            term::eq(d.clone(), x.clone()),
            term::eq(d, y.clone()),
        ]),
    ]);

    let mut grammar = Grammar::new();
    let start = grammar.add_nt("Start", Typ::Int);
    let cond = grammar.add_nt("Cond", Typ::Bool);
    grammar.add_leaf(start, term::var(Typ::Int, 0));
    grammar.add_leaf(start, term::var(Typ::Int, 1));
    grammar.add_app(start, Op::Ite, vec![cond, start, start]);
    grammar.add_app(cond, Op::Le, vec![start, start]);

    let mut base = VarMap::new();
    base.push(VarInfo::new("x", Typ::Int));
    base.push(VarInfo::new("y", Typ::Int));
    let mut params = VarMap::new();
    params.push(Typ::Int);
    params.push(Typ::Int);
    let mut targets = TgtMap::new();
    targets.push(SynthTarget::new("max2", Typ::Int, grammar, params));
    let mut apps = TgtMap::new();
    apps.push(vec![FunApp::new(2.into(), vec![x, y])]);

    Instance::new(constraint, base, targets, apps)
}

/// S2: max2. The first candidates (`x`, then `y`) are concretely valid
/// but symbolically refuted, each counter-example restarts enumeration.
#[test]
fn max2() {
    let instance = max2_instance();
    let oracle = GridOracle::new(vec![0, 1, 2]);
    let mut solver = CegSolver::with_conf(&instance, oracle, ceg_conf(8));
    let solutions = solver.solve().expect("solve failed");

    let x = term::var(Typ::Int, 0);
    let y = term::var(Typ::Int, 1);
    let expected = term::ite(term::le(x.clone(), y.clone()), y, x);
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0], vec![(TgtIdx::zero(), expected)]);
    assert!(solver.stats().restarts >= 1);
    assert_eq!(solver.stats().restarts, 2);
    assert_eq!(solver.state(), State::Completed)
}

/// Under `no_dist`, counter-examples are added but enumeration is not
/// restarted and nothing is pruned; max2 is still found.
#[test]
fn max2_no_dist() {
    let instance = max2_instance();
    let oracle = GridOracle::new(vec![0, 1, 2]);
    let test_conf = CegConf {
        cost_budget: 8,
        no_dist: true,
        stats_level: 0,
    };
    let mut solver = CegSolver::with_conf(&instance, oracle, test_conf);
    let solutions = solver.solve().expect("solve failed");

    assert_eq!(solutions.len(), 1);
    assert_eq!(solver.stats().restarts, 0);
    let solution = &solutions[0][0].1;
    // Whatever its shape, the solution behaves like max on the grid.
    for &(a, b) in &[(0i64, 1i64), (1, 0), (2, 2), (0, 2)] {
        let model: VarMap<Val> = vec![val::int(a), val::int(b)].into();
        let max = if a >= b { a } else { b };
        assert_eq!(
            solution.eval(&model).expect("evaluation failed"),
            val::int(max)
        )
    }
}

/// Builds a programming-by-example instance for `f(x)` from `(input,
/// output)` pairs.
fn pbe_instance(grammar: Grammar, examples: &[(i64, i64)]) -> Instance {
    let x = term::var(Typ::Int, 0);
    let d = term::var(Typ::Int, 1);
    let mut conjuncts = Vec::with_capacity(examples.len());
    let mut artifacts = Vec::with_capacity(examples.len());
    for &(input, output) in examples {
        let antecedent = term::eq(x.clone(), term::int(input));
        let consequent = term::eq(d.clone(), term::int(output));
        conjuncts.push(term::implies(antecedent.clone(), consequent.clone()));
        let bindings: Point = vec![val::int(input)].into();
        artifacts.push(PbeExample::new(antecedent, consequent, bindings));
    }
    let mut instance = unary_instance(term::and(conjuncts), grammar);
    instance.set_pbe(artifacts);
    instance
}

/// S3: parity examples. Two terminal expressions, predicates drawn from a
/// `mod` non-terminal separate even from odd inputs.
#[test]
fn pbe_parity() {
    let mut grammar = Grammar::new();
    let start = grammar.add_nt("Start", Typ::Int);
    let cond = grammar.add_nt("Cond", Typ::Int);
    grammar.add_leaf(start, term::int(0));
    grammar.add_leaf(start, term::int(1));
    grammar.add_leaf(start, term::int(2));
    grammar.add_leaf(start, term::var(Typ::Int, 0));
    grammar.add_app(start, Op::Add, vec![start, start]);
    grammar.add_app(cond, Op::Mod, vec![start, start]);
    grammar.set_cond(cond);

    let instance = pbe_instance(grammar, &[(0, 0), (1, 1), (2, 0), (3, 1)]);
    let mut solver = CegSolver::with_conf(&instance, NoOracle, ceg_conf(8));
    let solutions = solver.solve().expect("solve failed");

    assert_eq!(solutions.len(), 1);
    assert_eq!(solver.pbe_phase(), Some(Phase::BuildDecisionTree));
    let tree = &solutions[0][0].1;

    // The tree computes parity, beyond the given examples.
    for x in 0i64..7 {
        let model: VarMap<Val> = vec![val::int(x)].into();
        assert_eq!(
            tree.eval(&model).expect("evaluation failed"),
            val::int(x % 2),
            "tree disagrees with parity at {}",
            x
        )
    }
    assert!(solver.stats().restarts >= 2)
}

/// S4: every example maps to `42`: a single terminal covers everything
/// and the decision-tree phase is never entered.
#[test]
fn pbe_single_term() {
    let mut grammar = Grammar::new();
    let start = grammar.add_nt("Start", Typ::Int);
    grammar.add_leaf(start, term::int(0));
    grammar.add_leaf(start, term::int(1));
    grammar.add_leaf(start, term::int(42));
    grammar.add_leaf(start, term::var(Typ::Int, 0));

    let instance = pbe_instance(grammar, &[(0, 42), (1, 42), (5, 42)]);
    let mut solver = CegSolver::with_conf(&instance, NoOracle, ceg_conf(4));
    let solutions = solver.solve().expect("solve failed");

    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0], vec![(TgtIdx::zero(), term::int(42))]);
    assert_eq!(solver.pbe_phase(), Some(Phase::BuildTermExprs));
    assert_eq!(solver.stats().restarts, 0)
}

/// Decision-tree shape: on programming-by-example completion, every
/// example accepts the assembled tree.
#[test]
fn pbe_coverage() {
    let mut grammar = Grammar::new();
    let start = grammar.add_nt("Start", Typ::Int);
    let cond = grammar.add_nt("Cond", Typ::Int);
    grammar.add_leaf(start, term::int(0));
    grammar.add_leaf(start, term::int(1));
    grammar.add_leaf(start, term::int(2));
    grammar.add_leaf(start, term::var(Typ::Int, 0));
    grammar.add_app(cond, Op::Mod, vec![start, start]);
    grammar.set_cond(cond);

    let examples = [(0i64, 0i64), (1, 1), (2, 0), (3, 1)];
    let instance = pbe_instance(grammar, &examples);
    let mut solver = CegSolver::with_conf(&instance, NoOracle, ceg_conf(8));
    let solutions = solver.solve().expect("solve failed");
    let tree = &solutions[0][0].1;

    for &(input, output) in &examples {
        // Rebuild the per-example check: antecedent implies consequent.
        let x = term::var(Typ::Int, 0);
        let d = term::var(Typ::Int, 1);
        let constraint = term::implies(
            term::eq(x.clone(), term::int(input)),
            term::eq(d, term::int(output)),
        );
        let mut apps = TgtMap::new();
        apps.push(vec![FunApp::new(1.into(), vec![x])]);
        let eval = {
            let mut eval = Evaluator::new(0.into(), constraint, 1, apps);
            eval.add_point(vec![val::int(input)].into());
            eval
        };
        assert!(
            eval.check_example_validity(tree).expect("validation failed"),
            "example ({} -> {}) rejects the tree",
            input,
            output
        )
    }
}

/// S5: the only solution has cost 3, the budget stops at 2. Empty
/// solution map, restart count bounded by the point growth.
#[test]
fn unsat_under_budget() {
    let mut grammar = Grammar::new();
    let start = grammar.add_nt("Start", Typ::Int);
    grammar.add_leaf(start, term::var(Typ::Int, 0));
    grammar.add_app(start, Op::Add, vec![start, start]);

    let x = term::var(Typ::Int, 0);
    let d = term::var(Typ::Int, 1);
    let constraint = term::eq(d, term::add(x.clone(), x));
    let instance = unary_instance(constraint, grammar);

    let oracle = GridOracle::new(vec![0, 1, 2]);
    let mut solver = CegSolver::with_conf(&instance, oracle, ceg_conf(2));
    let solutions = solver.solve().expect("solve failed");

    assert!(solutions.is_empty());
    assert_eq!(solver.state(), State::Exhausted);
    assert_eq!(solver.stats().restarts, 1)
}

/// S6: the oracle cannot decide. The solve aborts with `Unknown` and the
/// evaluation scratch is torn down anyway.
#[test]
fn oracle_unknown_aborts() {
    let mut grammar = Grammar::new();
    let start = grammar.add_nt("Start", Typ::Int);
    grammar.add_leaf(start, term::int(0));

    let d = term::var(Typ::Int, 1);
    let constraint = term::eq(d.clone(), d);
    let instance = unary_instance(constraint, grammar);

    let mut solver = CegSolver::with_conf(&instance, UnknownOracle, ceg_conf(4));
    let err = solver.solve().unwrap_err();
    assert!(err.is_unknown());
    assert!(!term::Scratch::is_active())
}

/// Multi-function mode: tuples are evaluated jointly, counter-examples
/// never restart enumeration.
#[test]
fn multi_function_tuples() {
    let constants = |name: &str| {
        let mut grammar = Grammar::new();
        let start = grammar.add_nt(name, Typ::Int);
        grammar.add_leaf(start, term::int(0));
        grammar.add_leaf(start, term::int(1));
        grammar
    };

    let x = term::var(Typ::Int, 0);
    let df = term::var(Typ::Int, 1);
    let dg = term::var(Typ::Int, 2);
    let constraint = term::and(vec![
        term::eq(df, term::int(1)),
        term::eq(dg, term::int(0)),
    ]);

    let mut base = VarMap::new();
    base.push(VarInfo::new("x", Typ::Int));
    let mut params = VarMap::new();
    params.push(Typ::Int);
    let mut targets = TgtMap::new();
    targets.push(SynthTarget::new(
        "f",
        Typ::Int,
        constants("F"),
        params.clone(),
    ));
    targets.push(SynthTarget::new("g", Typ::Int, constants("G"), params));
    let mut apps = TgtMap::new();
    apps.push(vec![FunApp::new(1.into(), vec![x.clone()])]);
    apps.push(vec![FunApp::new(2.into(), vec![x])]);
    let instance = Instance::new(constraint, base, targets, apps);

    let oracle = GridOracle::new(vec![0, 1]);
    let mut solver = CegSolver::with_conf(&instance, oracle, ceg_conf(4));
    let solutions = solver.solve().expect("solve failed");

    assert_eq!(solutions.len(), 1);
    assert_eq!(
        solutions[0],
        vec![
            (TgtIdx::zero(), term::int(1)),
            (TgtIdx::from(1), term::int(0)),
        ]
    );
    assert_eq!(solver.stats().restarts, 0);
    assert_eq!(solver.stats().solution_size, Some(2))
}

/// Pre-flight: let-bound grammar variables are rejected before
/// enumeration begins.
#[test]
fn let_bindings_are_rejected() {
    let mut grammar = Grammar::new();
    let start = grammar.add_nt("Start", Typ::Int);
    grammar.add_leaf(start, term::int(0));
    let mut params = VarMap::new();
    params.push(Typ::Int);
    let mut target = SynthTarget::new("f", Typ::Int, grammar, params);
    target.let_vars = 2;
    let mut targets = TgtMap::new();
    targets.push(target);

    let mut base = VarMap::new();
    base.push(VarInfo::new("x", Typ::Int));
    let mut apps = TgtMap::new();
    apps.push(vec![FunApp::new(1.into(), vec![term::var(Typ::Int, 0)])]);
    let d = term::var(Typ::Int, 1);
    let instance = Instance::new(term::eq(d.clone(), d), base, targets, apps);

    let mut solver = CegSolver::with_conf(&instance, UnknownOracle, ceg_conf(4));
    let err = solver.solve().unwrap_err();
    assert!(err.is_spec_shape())
}
