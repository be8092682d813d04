//! The counter-example guided synthesis loop.
//!
//! [`CegSolver`] orchestrates the concrete and symbolic phases: it drives
//! the enumerator by increasing cost, routes candidates through the
//! concrete [`Evaluator`], and queries the validity [`Oracle`] on
//! concretely valid candidates. A counter-example becomes a new point, the
//! signature store is reset, and enumeration restarts from the minimum
//! cost so that freshly distinguishable regions are re-explored.
//!
//! States: `Preparing → Enumerating → {Completed | Restarting |
//! Exhausted}`. `Restarting` loops back to `Enumerating`; `Exhausted`
//! means the cost budget ran out and the solve returns an empty solution
//! list.
//!
//! [`CegSolver`]: struct.CegSolver.html (CegSolver struct)
//! [`Evaluator`]: ../data/struct.Evaluator.html (Evaluator struct)
//! [`Oracle`]: ../oracle/trait.Oracle.html (Oracle trait)

pub mod dtree;
pub mod pbe;

use crate::common::*;
use crate::data::Evaluator;
use crate::enumerator::{CfgEnumerator, EnumHost, Feedback};
use crate::oracle::{CexRes, Oracle};

use self::pbe::{PbeCtrl, PbeStep, Phase};

/// Solve states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Collecting artifacts, pre-flight checks.
    Preparing,
    /// Driving the enumerator.
    Enumerating,
    /// A solution was recorded.
    Completed,
    /// A counter-example invalidated the signatures; enumeration must
    /// restart from the minimum cost.
    Restarting,
    /// Cost budget exhausted without a solution.
    Exhausted,
}

/// Counters reported at the end of a solve.
#[derive(Debug, Clone, Default)]
pub struct SolveStats {
    /// Expressions tried.
    pub tried: usize,
    /// Distinguishable expressions among them.
    pub dist: usize,
    /// Enumeration restarts.
    pub restarts: usize,
    /// Validity queries sent to the oracle.
    pub oracle_queries: usize,
    /// Size of the first solution, if any.
    pub solution_size: Option<usize>,
    /// Peak resident memory in megabytes, if the platform exposes it.
    pub peak_mem_mb: Option<f64>,
}

/// The counter-example guided synthesis solver.
pub struct CegSolver<'a, O> {
    /// Specification artifacts.
    instance: &'a Instance,
    /// Validity oracle.
    oracle: O,
    /// Per-solve options.
    conf: CegConf,
    /// Concrete evaluator, outside of programming-by-example mode.
    eval: Option<Evaluator>,
    /// Programming-by-example controller, when the specification shape
    /// degenerates to examples.
    pbe: Option<PbeCtrl>,
    /// Current state.
    state: State,
    /// Solutions found.
    solutions: Solutions,
    /// Counters.
    stats: SolveStats,
    /// Profiler.
    _profiler: Profiler,
}

impl<'a, O: Oracle> CegSolver<'a, O> {
    /// Constructor with the global configuration's solve options.
    pub fn new(instance: &'a Instance, oracle: O) -> Self {
        Self::with_conf(instance, oracle, conf.ceg.clone())
    }

    /// Constructor with explicit solve options.
    pub fn with_conf(instance: &'a Instance, oracle: O, conf_arg: CegConf) -> Self {
        CegSolver {
            instance,
            oracle,
            conf: conf_arg,
            eval: None,
            pbe: None,
            state: State::Preparing,
            solutions: Solutions::new(),
            stats: SolveStats::default(),
            _profiler: Profiler::new(),
        }
    }

    /// Counters of the last solve.
    pub fn stats(&self) -> &SolveStats {
        &self.stats
    }

    /// State of the solve.
    pub fn state(&self) -> State {
        self.state
    }

    /// Phase of the programming-by-example controller, if that mode was
    /// entered.
    pub fn pbe_phase(&self) -> Option<Phase> {
        self.pbe.as_ref().map(|pbe| pbe.phase())
    }

    /// Runs the solve.
    ///
    /// Returns the solution map; an empty list means the cost budget was
    /// exhausted. Teardown (evaluation scratch, evaluators) runs on every
    /// exit path.
    pub fn solve(&mut self) -> Res<Solutions> {
        self.state = State::Preparing;
        self.instance.preflight()?;
        let _scratch = term::Scratch::acquire()?;
        profile! { self tick "solve" }

        let res = self.prepare().and_then(|()| self.run());

        profile! { self mark "solve" }
        self.stats.peak_mem_mb = crate::common::profiling::peak_mem_mb();
        let solutions = res?;

        slog! {
            self.conf, 1 => "tried {} expressions in all", self.stats.tried
        }
        slog! {
            self.conf, 1 => "{} were distinguishable", self.stats.dist
        }
        slog! {
            self.conf, 1 => "needed {} restarts", self.stats.restarts
        }
        slog! {
            self.conf, 1 => "total time: {}s", self._profiler.total().to_str()
        }
        if let Some(mem) = self.stats.peak_mem_mb {
            slog! { self.conf, 1 => "peak memory: {:.1} MB", mem }
        }
        if let Some(size) = self.stats.solution_size {
            slog! { self.conf, 1 => "solution size: {}", size }
        }
        if conf.stats {
            self._profiler.print()
        }

        Ok(solutions)
    }

    /// Mode detection and evaluator construction.
    fn prepare(&mut self) -> Res<()> {
        if let Some(examples) = self.instance.pbe_examples() {
            if self.instance.targets().len() != 1 {
                bail!("[bug] programming-by-example with more than one synthesized function")
            }
            log_info! { "programming-by-example constraints detected" }
            self.pbe = Some(PbeCtrl::new(self.instance, examples, self.conf.clone())?)
        } else {
            self.eval = Some(Evaluator::of_instance(EvlIdx::zero(), self.instance))
        }
        self.state = State::Enumerating;
        Ok(())
    }

    /// The enumeration loop.
    fn run(&mut self) -> Res<Solutions> {
        let min_cost = self.instance.targets().len();
        let grammars: Vec<&Grammar> = self
            .instance
            .targets()
            .iter()
            .map(|target| target.grammar())
            .collect();
        let mut enumerator = if grammars.len() == 1 {
            CfgEnumerator::single(grammars[0])
        } else {
            CfgEnumerator::multi(grammars)
        };

        'restart: loop {
            self.state = State::Enumerating;
            for cost in min_cost..=self.conf.cost_budget {
                slog! { self.conf, 2 => "trying expressions of cost {}", cost }
                let _ = enumerator.enumerate_of_cost(cost, self)?;
                match self.state {
                    State::Restarting => {
                        enumerator.reset();
                        self.stats.restarts += 1;
                        slog! {
                            self.conf, 2 => "restarting enumeration... ({})",
                            self.stats.restarts
                        }
                        continue 'restart;
                    }
                    State::Completed => break 'restart,
                    _ => (),
                }
            }
            self.state = State::Exhausted;
            break 'restart;
        }

        if self.state == State::Exhausted {
            log_info! { "no solution within the cost budget" }
        }
        Ok(self.solutions.clone())
    }

    /// Records a solution for the single target.
    fn record_single(&mut self, expr: &Term) {
        let expr = term::to_user(expr);
        self.stats.solution_size = Some(expr.size());
        self.solutions.push(vec![(TgtIdx::zero(), expr)]);
        self.state = State::Completed
    }

    /// Candidate handling, counter-example guided mode.
    fn ceg_expression(&mut self, expr: &Term) -> Res<Feedback> {
        self.stats.tried += 1;
        let pruning = !self.conf.no_dist;

        let eval = match self.eval.as_mut() {
            Some(eval) => eval,
            None => bail!("[bug] candidate callback without a concrete evaluator"),
        };
        profile! { self tick "concrete" }
        let (valid, status) = eval.check_concrete_validity(expr)?;
        profile! { self mark "concrete" }

        if !valid && !status.dist && pruning {
            slog! { self.conf, 4 => "{}... invalid, indist", expr }
            return Ok(Feedback::Prune);
        }
        if !valid {
            slog! {
                self.conf, 4 => "{}... invalid, dist{}",
                expr,
                if status.partial { " (partial)" } else { "" }
            }
            self.stats.dist += 1;
            return Ok(Feedback::Keep);
        }

        self.stats.dist += 1;
        slog! { self.conf, 4 => "{}... valid", expr }

        // Concretely valid: ask the oracle.
        let mut cands = TgtMap::with_capacity(1);
        cands.push(term::to_user(expr));
        self.stats.oracle_queries += 1;
        profile! { self tick "oracle" }
        let verdict = self.oracle.check_validity(self.instance, &cands)?;
        profile! { self mark "oracle" }

        match verdict {
            CexRes::Valid => {
                self.record_single(expr);
                Ok(Feedback::Stop)
            }
            CexRes::Invalid(point) => {
                let eval = self
                    .eval
                    .as_mut()
                    .expect("[unreachable] checked at callback entry");
                eval.add_point(point);
                eval.reset_sigs();
                if pruning {
                    self.state = State::Restarting;
                    Ok(Feedback::Stop)
                } else {
                    Ok(Feedback::Keep)
                }
            }
            CexRes::Unknown => bail!(ErrorKind::Unknown),
        }
    }

    /// Tuple handling, multi-function mode.
    ///
    /// Concrete validity is evaluated jointly; there is no per-component
    /// signature policy and no restart: a counter-example adds a point and
    /// enumeration simply continues.
    fn ceg_expressions(&mut self, exprs: &[Term]) -> Res<Feedback> {
        self.stats.tried += 1;
        self.stats.dist += 1;

        let eval = match self.eval.as_mut() {
            Some(eval) => eval,
            None => bail!("[bug] tuple callback without a concrete evaluator"),
        };
        let valid = eval.check_tuple_validity(exprs)?;
        if !valid {
            return Ok(Feedback::Keep);
        }

        let mut cands = TgtMap::with_capacity(exprs.len());
        for expr in exprs {
            cands.push(term::to_user(expr));
        }
        self.stats.oracle_queries += 1;
        match self.oracle.check_validity(self.instance, &cands)? {
            CexRes::Valid => {
                let mut solution = Solution::with_capacity(exprs.len());
                let mut size = 0;
                for (tgt, expr) in cands.index_iter() {
                    size += expr.size();
                    solution.push((tgt, expr.clone()))
                }
                self.stats.solution_size = Some(size);
                self.solutions.push(solution);
                self.state = State::Completed;
                Ok(Feedback::Stop)
            }
            CexRes::Invalid(point) => {
                let eval = self
                    .eval
                    .as_mut()
                    .expect("[unreachable] checked at callback entry");
                eval.add_point(point);
                eval.reset_sigs();
                Ok(Feedback::Keep)
            }
            CexRes::Unknown => bail!(ErrorKind::Unknown),
        }
    }

    /// Sub-expression pruning, counter-example guided mode.
    fn ceg_sub_expression(&mut self, expr: &Term, nt: NtIdx) -> Res<Feedback> {
        if self.conf.no_dist {
            return Ok(Feedback::Keep);
        }
        let eval = match self.eval.as_mut() {
            Some(eval) => eval,
            None => bail!("[bug] sub-expression callback without a concrete evaluator"),
        };
        let (dist, status) = eval.check_sub_expression(nt, expr)?;
        if dist {
            slog! {
                self.conf, 4 => "checking subexpression {}... dist{}",
                expr,
                if status.partial { " (partial)" } else { "" }
            }
            self.stats.dist += 1;
            Ok(Feedback::Keep)
        } else {
            slog! { self.conf, 4 => "checking subexpression {}... indist", expr }
            Ok(Feedback::Prune)
        }
    }

    /// Applies a programming-by-example step.
    fn pbe_step(&mut self, step: PbeStep) -> Res<Feedback> {
        match step {
            PbeStep::Continue(feedback) => Ok(feedback),
            PbeStep::Restart => {
                self.state = State::Restarting;
                Ok(Feedback::Stop)
            }
            PbeStep::Done(expr) => {
                self.record_single(&expr);
                Ok(Feedback::Stop)
            }
        }
    }
}

impl<'a, O: Oracle> EnumHost for CegSolver<'a, O> {
    fn expression(&mut self, expr: &Term, _typ: Typ, nt: NtIdx, _index: usize) -> Res<Feedback> {
        conf.check_timeout()?;
        if let Some(mut ctrl) = self.pbe.take() {
            let step = ctrl.candidate(expr, nt, false, &mut self.stats);
            self.pbe = Some(ctrl);
            self.pbe_step(step?)
        } else {
            self.ceg_expression(expr)
        }
    }

    fn expressions(&mut self, exprs: &[Term]) -> Res<Feedback> {
        conf.check_timeout()?;
        if self.pbe.is_some() {
            bail!("[bug] programming-by-example with more than one synthesized function")
        }
        self.ceg_expressions(exprs)
    }

    fn sub_expression(&mut self, expr: &Term, _typ: Typ, nt: NtIdx) -> Res<Feedback> {
        conf.check_timeout()?;
        if let Some(mut ctrl) = self.pbe.take() {
            let step = ctrl.candidate(expr, nt, true, &mut self.stats);
            self.pbe = Some(ctrl);
            self.pbe_step(step?)
        } else {
            self.ceg_sub_expression(expr, nt)
        }
    }
}
