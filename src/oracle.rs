//! Validity oracle.
//!
//! The oracle decides whether the rewritten constraint is valid once every
//! synthesis target is bound to its candidate expression. Validity of
//! `C[f := e]` is checked as unsatisfiability of `¬C[f := e]`; a model of
//! the negation is a counter-example point over the base variables.
//!
//! [`SmtOracle`] runs the check through an smt solver spawned with the
//! global configuration; hosts and tests can plug any other decision
//! procedure through the [`Oracle`] trait.
//!
//! [`SmtOracle`]: struct.SmtOracle.html (SmtOracle struct)
//! [`Oracle`]: trait.Oracle.html (Oracle trait)

use crate::common::smt::{FullParser, SmtNegTerm};
use crate::common::*;

/// Answer from a validity query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CexRes {
    /// The constraint is valid with the candidates substituted.
    Valid,
    /// A counter-example point over the base variables.
    Invalid(Point),
    /// The background theory could not decide the query.
    ///
    /// Fatal: the solve aborts with [`ErrorKind::Unknown`][unknown].
    ///
    /// [unknown]: ../errors/enum.ErrorKind.html#variant.Unknown
    /// (ErrorKind's Unknown variant)
    Unknown,
}

/// Abstracts the symbolic validity check.
pub trait Oracle {
    /// Checks the rewritten constraint with each target bound to its
    /// candidate expression.
    fn check_validity(&mut self, instance: &Instance, cands: &TgtMap<Term>) -> Res<CexRes>;
}

/// Substitutes the candidate applications for the derived variables.
///
/// For each application slot, the candidate's formal parameters are
/// replaced by the application's argument terms; the constraint then only
/// mentions base variables.
pub fn ground_constraint(instance: &Instance, cands: &TgtMap<Term>) -> Res<Term> {
    if cands.len() != instance.targets().len() {
        bail!("[bug] expected {} candidates, got {}", instance.targets().len(), cands.len())
    }
    let mut map = VarHMap::new();
    for (tgt, apps) in instance.apps().index_iter() {
        for app in apps {
            let mut params = VarHMap::new();
            for (idx, arg) in app.args.iter().enumerate() {
                params.insert(VarIdx::from(idx), arg.clone());
            }
            let applied = cands[tgt].subst(&params);
            let prev = map.insert(app.slot, applied);
            if prev.is_some() {
                bail!("[bug] application slot v_{} bound twice", app.slot)
            }
        }
    }
    Ok(instance.constraint().subst(&map))
}

/// SMT-backed oracle.
pub struct SmtOracle {
    /// The solver.
    solver: Solver<FullParser>,
}

impl SmtOracle {
    /// Spawns the solver with the global configuration.
    pub fn new() -> Res<Self> {
        log_debug! { "spawning oracle solver `{}`", conf.solver.cmd }
        let solver = conf.solver.spawn("oracle", FullParser)?;
        Ok(SmtOracle { solver })
    }

    /// Kills the underlying solver.
    pub fn finalize(mut self) -> Res<()> {
        self.solver
            .kill()
            .chain_err(|| "while killing the oracle's solver")?;
        Ok(())
    }
}

impl Oracle for SmtOracle {
    fn check_validity(&mut self, instance: &Instance, cands: &TgtMap<Term>) -> Res<CexRes> {
        let grounded = ground_constraint(instance, cands)?;

        self.solver
            .reset()
            .chain_err(|| "while resetting the oracle's solver")?;
        for (var, info) in instance.base().index_iter() {
            self.solver
                .declare_const(&var, &info.typ)
                .chain_err(|| format!("while declaring base variable `{}`", info.name))?
        }
        self.solver
            .assert(&SmtNegTerm::new(&grounded))
            .chain_err(|| "while asserting the negated constraint")?;

        let sat = self
            .solver
            .check_sat_or_unk()
            .chain_err(|| "during the validity check")?;

        match sat {
            Some(false) => Ok(CexRes::Valid),
            Some(true) => {
                let model = self
                    .solver
                    .get_model()
                    .chain_err(|| "while retrieving the counter-example model")?;
                let mut point = Point::with_capacity(instance.base().len());
                for info in instance.base() {
                    point.push(info.typ.default_val());
                }
                for (var, args, _, val) in model {
                    if args.is_empty() && var.get() < point.len() {
                        point[var] = val
                    }
                }
                Ok(CexRes::Invalid(point))
            }
            None => Ok(CexRes::Unknown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;

    fn max_instance() -> Instance {
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

        let mut base = VarMap::new();
        base.push(VarInfo::new("x", Typ::Int));
        base.push(VarInfo::new("y", Typ::Int));

        let mut grammar = Grammar::new();
        let start = grammar.add_nt("Start", Typ::Int);
        grammar.add_leaf(start, term::var(Typ::Int, 0));
        grammar.add_leaf(start, term::var(Typ::Int, 1));

        let mut params = VarMap::new();
        params.push(Typ::Int);
        params.push(Typ::Int);
        let mut targets = TgtMap::new();
        targets.push(SynthTarget::new("max2", Typ::Int, grammar, params));

        let mut apps = TgtMap::new();
        apps.push(vec![FunApp::new(2.into(), vec![x, y])]);

        Instance::new(constraint, base, targets, apps)
    }

    #[test]
    fn grounding_substitutes_applications() {
        let instance = max_instance();
        let mut cands = TgtMap::new();
        // `f(x, y) = y`.
        cands.push(term::var(Typ::Int, 1));
        let grounded = ground_constraint(&instance, &cands).expect("grounding failed");

        // `d` is replaced by `y` everywhere: valid at `(0, 1)`, falsified
        // at `(1, 0)`.
        let mut model = Point::new();
        model.push(val::int(0));
        model.push(val::int(1));
        assert_eq!(
            grounded.eval(&model).expect("evaluation failed"),
            val::bool(true)
        );
        let mut model = Point::new();
        model.push(val::int(1));
        model.push(val::int(0));
        assert_eq!(
            grounded.eval(&model).expect("evaluation failed"),
            val::bool(false)
        )
    }
}
