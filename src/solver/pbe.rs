//! Programming-by-example unification.
//!
//! Entered when the rewritten specification is a conjunction of
//! implications whose antecedents pin every base variable to a constant.
//! Each implication becomes one example with its own evaluator seeded with
//! one point, and validity queries are replaced by a two-phase search:
//!
//! 1. *terminal discovery*: find, for the front of a FIFO of per-example
//!    evaluators, a concretely valid expression; probe the remaining
//!    examples to attach duplicates and pick the next front;
//! 2. *decision-tree assembly*: find predicate expressions separating the
//!    frontier pairs of the partial tree, until no pending slot remains.

use crate::common::*;
use crate::data::Evaluator;
use crate::enumerator::Feedback;
use crate::solver::dtree::{BranchSemantics, TreeBuilder, UnitBranch};
use crate::solver::SolveStats;

/// Phases of the programming-by-example search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Searching terminal expressions, one per group of compatible
    /// examples.
    BuildTermExprs,
    /// Searching separating predicates for the decision tree.
    BuildDecisionTree,
}

/// Outcome of handing a candidate to the controller.
pub enum PbeStep {
    /// Feed the verdict back to the enumerator.
    Continue(Feedback),
    /// Reset and restart enumeration.
    Restart,
    /// Solution found.
    Done(Term),
}

/// Drives terminal discovery and decision-tree assembly.
pub struct PbeCtrl {
    /// Per-example evaluators, in example order.
    evals: EvlMap<Evaluator>,
    /// Terminal expression index of each covered example.
    term_of: EvlHMap<usize>,
    /// Terminal expressions.
    terms: Vec<Term>,
    /// Tree builder.
    builder: TreeBuilder,
    /// Current phase.
    phase: Phase,
    /// Current frontier pair, in tree phase.
    pair: Option<(EvlIdx, EvlIdx)>,
    /// Branching non-terminal, when the grammar declares one.
    cond: Option<NtIdx>,
    /// Branch semantics.
    sem: Box<dyn BranchSemantics>,
    /// Diagnostics configuration.
    conf: CegConf,
}

impl PbeCtrl {
    /// Constructor: one evaluator per example, seeded with the example's
    /// point; the first example primes the terminal-search FIFO.
    pub fn new(instance: &Instance, examples: &[PbeExample], conf_arg: CegConf) -> Res<Self> {
        if examples.is_empty() {
            bail!(ErrorKind::SpecShape(
                "programming-by-example with zero examples".into()
            ))
        }

        let mut evals = EvlMap::with_capacity(examples.len());
        for example in examples {
            let idx = evals.next_index();
            let constraint =
                term::implies(example.antecedent.clone(), example.consequent.clone());
            let mut eval = Evaluator::new(
                idx,
                constraint,
                instance.base().len(),
                instance.apps().clone(),
            );
            eval.add_point(example.bindings.clone());
            evals.push(eval);
        }

        let mut builder = TreeBuilder::new();
        builder.reset();
        let first = EvlIdx::zero();
        builder.push_uniq(first);
        evals[first].reset_sigs();

        let cond = instance.targets()[TgtIdx::zero()].grammar().cond();

        Ok(PbeCtrl {
            evals,
            term_of: EvlHMap::new(),
            terms: Vec::new(),
            builder,
            phase: Phase::BuildTermExprs,
            pair: None,
            cond,
            sem: Box::new(UnitBranch),
            conf: conf_arg,
        })
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Routes a candidate or sub-expression to the current phase.
    pub fn candidate(
        &mut self,
        expr: &Term,
        nt: NtIdx,
        is_sub: bool,
        stats: &mut SolveStats,
    ) -> Res<PbeStep> {
        match self.phase {
            Phase::BuildTermExprs => {
                if is_sub {
                    self.prune_sub(expr, nt)
                } else {
                    self.term_candidate(expr, stats)
                }
            }
            Phase::BuildDecisionTree => {
                // Predicates come from the branching non-terminal when the
                // grammar declares one, from everywhere otherwise.
                let is_pred = match self.cond {
                    Some(cond) => is_sub && nt == cond,
                    None => true,
                };
                if is_pred {
                    self.tree_candidate(expr, nt, stats)
                } else {
                    Ok(PbeStep::Continue(Feedback::Keep))
                }
            }
        }
    }

    /// Sub-expression pruning against the front evaluator, terminal
    /// phase.
    fn prune_sub(&mut self, expr: &Term, nt: NtIdx) -> Res<PbeStep> {
        if self.conf.no_dist {
            return Ok(PbeStep::Continue(Feedback::Keep));
        }
        let front = match self.builder.queue_back() {
            Some(front) => front,
            None => bail!("[bug] terminal search with an empty evaluator queue"),
        };
        let (dist, _) = self.evals[front].check_sub_expression(nt, expr)?;
        if dist {
            Ok(PbeStep::Continue(Feedback::Keep))
        } else {
            Ok(PbeStep::Continue(Feedback::Prune))
        }
    }

    /// Terminal-phase candidate handling.
    fn term_candidate(&mut self, expr: &Term, stats: &mut SolveStats) -> Res<PbeStep> {
        stats.tried += 1;
        let front = match self.builder.queue_back() {
            Some(front) => front,
            None => bail!("[bug] terminal search with an empty evaluator queue"),
        };

        let (valid, status) = self.evals[front].check_concrete_validity(expr)?;
        if !valid {
            if !status.dist && !self.conf.no_dist {
                slog! { self.conf, 4 => "{}... eval[{}], invalid, indist", expr, front }
                return Ok(PbeStep::Continue(Feedback::Prune));
            }
            slog! { self.conf, 4 => "{}... eval[{}], invalid, dist", expr, front }
            stats.dist += 1;
            return Ok(PbeStep::Continue(Feedback::Keep));
        }
        stats.dist += 1;
        slog! { self.conf, 2 => "found terminal expression for example [{}]", front }

        // Keep the terminal, probe every later example not yet covered.
        let term_idx = self.terms.len();
        self.terms.push(term::to_user(expr));
        let prev = self.term_of.insert(front, term_idx);
        debug_assert! { prev.is_none() }

        let mut new_front = None;
        for idx in (front.get() + 1)..self.evals.len() {
            let evl = EvlIdx::from(idx);
            if self.term_of.contains_key(&evl) {
                continue;
            }
            let (covered, _) = self.evals[evl].check_concrete_validity(expr)?;
            if covered {
                slog! { self.conf, 4 => "eval[{}], duplicate valid", evl }
                let prev = self.term_of.insert(evl, term_idx);
                debug_assert! { prev.is_none() }
                self.builder.push_dup(evl)
            } else if new_front.is_none() {
                new_front = Some(evl);
                self.builder.push_uniq(evl)
            }
        }

        if self.term_of.len() != self.evals.len() {
            // Some example is still uncovered: search terminals for the
            // new front.
            let front = match self.builder.queue_back() {
                Some(front) => front,
                None => bail!("[bug] uncovered examples but no new front"),
            };
            self.evals[front].reset_sigs();
            return Ok(PbeStep::Restart);
        }

        if self.terms.len() == 1 {
            // A single terminal covers every example, no unification
            // needed.
            return Ok(PbeStep::Done(self.terms[0].clone()));
        }

        slog! {
            self.conf, 2 => "terminal expressions done ({} unique, {} duplicate), \
                building decision tree",
            self.builder.uniq_count(),
            self.builder.dup_count()
        }
        self.enter_tree_phase()
    }

    /// Transition to the decision-tree phase.
    fn enter_tree_phase(&mut self) -> Res<PbeStep> {
        let order: Vec<EvlIdx> = self.evals.index_iter().map(|(idx, _)| idx).collect();
        self.builder.init_tree(order)?;
        self.phase = Phase::BuildDecisionTree;
        self.next_frontier()
    }

    /// Advances to the next frontier pair needing a predicate, collapsing
    /// shared pairs along the way.
    fn next_frontier(&mut self) -> Res<PbeStep> {
        while let Some((fst, snd)) = self.builder.locate_next_eval_node() {
            let fst_term = self.term_idx(fst)?;
            let snd_term = self.term_idx(snd)?;
            if fst_term == snd_term {
                slog! { self.conf, 4 => "shared node: eval[{}], eval[{}]", fst, snd }
                self.builder.insert_shared_decision_node(fst_term)?;
                continue;
            }
            self.pair = Some((fst, snd));
            self.evals[fst].reset_sigs();
            return Ok(PbeStep::Restart);
        }

        // No pending slot left: materialize and validate.
        let tree = self.builder.tree_expr(&self.terms, &*self.sem)?;
        if self.conf.stats_level >= 2 {
            let mut okay = true;
            for (idx, eval) in self.evals.index_iter() {
                if !eval.check_example_validity(&tree)? {
                    slog! { self.conf, 2 => "eval[{}] rejects the assembled tree", idx }
                    okay = false
                }
            }
            slog! {
                self.conf, 2 => "solution found, validating ... {}",
                if okay { "valid" } else { "invalid" }
            }
        }
        Ok(PbeStep::Done(tree))
    }

    /// Tree-phase candidate handling: pair-tests a predicate candidate.
    fn tree_candidate(&mut self, expr: &Term, nt: NtIdx, stats: &mut SolveStats) -> Res<PbeStep> {
        stats.tried += 1;
        let (fst, snd) = match self.pair {
            Some(pair) => pair,
            None => bail!("[bug] decision-tree search without a frontier pair"),
        };

        let (dist, _) = self.evals[fst].check_sub_expression(nt, expr)?;
        let fst_val = match self.evals[fst].sub_expr_eval().and_then(|vals| vals.first()) {
            Some(val) => val.clone(),
            None => bail!("[bug] no sub-expression evaluation point for eval[{}]", fst),
        };
        let snd_val = match self.evals[snd].eval_sub_expression(expr)?.first() {
            Some(val) => val.clone(),
            None => bail!("[bug] no sub-expression evaluation point for eval[{}]", snd),
        };

        let taken = self.sem.taken();
        let separates = fst_val != snd_val && (fst_val == taken || snd_val == taken);
        if !separates {
            if !dist && !self.conf.no_dist {
                slog! { self.conf, 6 => "{}... condition invalid, indist", expr }
                return Ok(PbeStep::Continue(Feedback::Prune));
            }
            slog! { self.conf, 6 => "{}... condition invalid, dist", expr }
            stats.dist += 1;
            return Ok(PbeStep::Continue(Feedback::Keep));
        }
        stats.dist += 1;

        // Orientation: the evaluator producing the taken value goes to the
        // then branch.
        let (then_ev, else_ev) = if fst_val == taken { (fst, snd) } else { (snd, fst) };
        let then_term = self.term_idx(then_ev)?;
        let else_term = self.term_idx(else_ev)?;
        let pred = term::to_user(expr);
        slog! {
            self.conf, 4 => "unique node: {}, then: {}, else: {}, eval[{}], eval[{}]",
            pred, self.terms[then_term], self.terms[else_term], then_ev, else_ev
        }
        self.builder
            .insert_decision_node(pred, then_term, else_ev, else_term)?;

        self.pair = None;
        self.next_frontier()
    }

    /// Terminal index of a covered example.
    fn term_idx(&self, evl: EvlIdx) -> Res<usize> {
        match self.term_of.get(&evl) {
            Some(idx) => Ok(*idx),
            None => bail!("[bug] example eval[{}] has no terminal expression", evl),
        }
    }
}
