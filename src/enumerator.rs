//! Cost-stratified enumeration of grammar expressions.
//!
//! The enumerator builds expressions bottom-up, one cost layer at a time,
//! keeping per-(non-terminal, cost) pools of the expressions that survived
//! the host's callbacks. Pruned expressions are excluded from the pools,
//! so no structural successor ever embeds them.
//!
//! Candidates are delivered in non-decreasing cost order across successive
//! [`enumerate_of_cost`] calls, for the exact cost requested. After a
//! callback stops enumeration, the host resets the enumerator before
//! asking for more.
//!
//! In multi-target mode the enumerator emits tuples of total cost `k` and
//! issues no sub-expression callbacks: distinguishability pruning is
//! disabled for joint candidates.
//!
//! [`enumerate_of_cost`]: struct.CfgEnumerator.html#method.enumerate_of_cost
//! (enumerate_of_cost method)

use crate::common::*;
use crate::grammar::{Grammar, Prod};

/// Verdict returned by enumeration callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// Continue enumerating.
    Keep,
    /// Drop this expression and every structural successor that would
    /// embed it.
    Prune,
    /// Abort the current enumeration call.
    Stop,
}

/// Host driving an enumerator.
///
/// The expression references handed to the callbacks are borrowed from the
/// enumerator's pools; a host materializes the ones that must outlive the
/// callback with [`term::to_user`].
///
/// [`term::to_user`]: ../term/fn.to_user.html (to_user function)
pub trait EnumHost {
    /// Full candidate of the start non-terminal.
    ///
    /// `index` is the enumerator index, `0` outside of multi-target mode.
    fn expression(&mut self, expr: &Term, typ: Typ, nt: NtIdx, index: usize) -> Res<Feedback>;

    /// Tuple candidate, one expression per target. Multi-target mode only.
    fn expressions(&mut self, exprs: &[Term]) -> Res<Feedback>;

    /// Sub-expression entering the pools.
    fn sub_expression(&mut self, expr: &Term, typ: Typ, nt: NtIdx) -> Res<Feedback>;
}

/// Per-grammar expression pools: for each non-terminal, for each cost
/// (1-based), the expressions kept at that cost.
#[derive(Debug, Clone)]
struct Pools {
    /// Kept expressions. `pools[nt][c]` holds cost `c + 1`.
    nts: NtMap<Vec<Vec<Term>>>,
    /// Number of complete cost layers.
    built: usize,
}

impl Pools {
    fn new(grammar: &Grammar) -> Self {
        let mut nts = NtMap::with_capacity(grammar.nts().len());
        for _ in grammar.nts() {
            nts.push(Vec::new());
        }
        Pools { nts, built: 0 }
    }

    /// Expressions of a non-terminal at a cost.
    fn at(&self, nt: NtIdx, cost: usize) -> &[Term] {
        debug_assert! { cost >= 1 }
        self.nts[nt]
            .get(cost - 1)
            .map(|exprs| exprs.as_slice())
            .unwrap_or(&[])
    }
}

/// Walks one or more grammars by increasing cost, reporting candidates to
/// a host.
pub struct CfgEnumerator<'a> {
    /// Grammars, one per synthesis target.
    grammars: Vec<&'a Grammar>,
    /// Pools, one per grammar.
    pools: Vec<Pools>,
    /// True when a previous call was stopped mid-layer.
    dirty: bool,
}

impl<'a> CfgEnumerator<'a> {
    /// Enumerator for a single target.
    pub fn single(grammar: &'a Grammar) -> Self {
        Self::multi(vec![grammar])
    }

    /// Enumerator for several targets, emitting tuples.
    pub fn multi(grammars: Vec<&'a Grammar>) -> Self {
        let pools = grammars.iter().map(|grammar| Pools::new(grammar)).collect();
        CfgEnumerator {
            grammars,
            pools,
            dirty: false,
        }
    }

    /// Number of targets.
    pub fn width(&self) -> usize {
        self.grammars.len()
    }

    /// Discards the pools.
    pub fn reset(&mut self) {
        for (pools, grammar) in self.pools.iter_mut().zip(self.grammars.iter()) {
            *pools = Pools::new(grammar)
        }
        self.dirty = false
    }

    /// Produces every grammar-legal candidate of cost exactly `cost`.
    ///
    /// Single-target mode invokes `expression` for start-symbol
    /// expressions and `sub_expression` for everything else; multi-target
    /// mode invokes `expressions` on tuples of total cost `cost`.
    ///
    /// Returns `false` iff a callback stopped the enumeration.
    pub fn enumerate_of_cost<H: EnumHost>(&mut self, cost: usize, host: &mut H) -> Res<bool> {
        if self.dirty {
            bail!("[bug] enumerator was not reset after an interrupted enumeration")
        }
        if cost == 0 {
            return Ok(true);
        }
        let done = if self.width() == 1 {
            self.ensure_single(cost, host)?
        } else {
            self.enumerate_tuples(cost, host)?
        };
        if !done {
            self.dirty = true
        }
        Ok(done)
    }

    /// Builds the single-target pools up to `cost` included, firing
    /// callbacks for the layers built.
    fn ensure_single<H: EnumHost>(&mut self, cost: usize, host: &mut H) -> Res<bool> {
        debug_assert_eq! { self.width(), 1 }
        while self.pools[0].built < cost {
            let layer = self.pools[0].built + 1;
            let full = layer == cost;
            if !self.build_layer(0, layer, full, host)? {
                return Ok(false);
            }
            self.pools[0].built = layer
        }
        Ok(true)
    }

    /// Builds one cost layer of one grammar.
    ///
    /// `full` controls whether start-symbol expressions of this layer are
    /// reported as candidates; sub-expression callbacks fire in
    /// single-target mode only.
    fn build_layer<H: EnumHost>(
        &mut self,
        gram: usize,
        layer: usize,
        full: bool,
        host: &mut H,
    ) -> Res<bool> {
        let grammar = self.grammars[gram];
        let single = self.width() == 1;
        let start = grammar.start();

        for (nt, def) in grammar.nts().index_iter() {
            let mut kept = Vec::new();
            for prod in &def.prods {
                match prod {
                    Prod::Leaf(term) => {
                        if layer == 1
                            && !self.deliver(
                                host, single, full, gram, nt, def.typ, start, term, &mut kept,
                            )?
                        {
                            return Ok(false);
                        }
                    }
                    Prod::App { op, args } => {
                        if layer < args.len() + 1 {
                            continue;
                        }
                        let mut splits = Splits::new(layer - 1, args.len());
                        while let Some(costs) = splits.next() {
                            let mut picks = Picks::new(&self.pools[gram], args, costs);
                            while let Some(chosen) = picks.next() {
                                let expr = term::app(*op, chosen);
                                if !self.deliver(
                                    host, single, full, gram, nt, def.typ, start, &expr, &mut kept,
                                )? {
                                    return Ok(false);
                                }
                            }
                        }
                    }
                }
            }
            let pools = &mut self.pools[gram].nts[nt];
            debug_assert_eq! { pools.len(), layer - 1 }
            pools.push(kept)
        }
        Ok(true)
    }

    /// Reports one expression to the host and pools it if kept.
    #[allow(clippy::too_many_arguments)]
    fn deliver<H: EnumHost>(
        &self,
        host: &mut H,
        single: bool,
        full: bool,
        gram: usize,
        nt: NtIdx,
        typ: Typ,
        start: NtIdx,
        expr: &Term,
        kept: &mut Vec<Term>,
    ) -> Res<bool> {
        let feedback = if !single {
            Feedback::Keep
        } else if nt == start {
            if full {
                host.expression(expr, typ, nt, gram)?
            } else {
                Feedback::Keep
            }
        } else {
            host.sub_expression(expr, typ, nt)?
        };
        match feedback {
            Feedback::Stop => Ok(false),
            Feedback::Prune => Ok(true),
            Feedback::Keep => {
                kept.push(expr.clone());
                Ok(true)
            }
        }
    }

    /// Emits every tuple of total cost `cost`, one component per grammar.
    fn enumerate_tuples<H: EnumHost>(&mut self, cost: usize, host: &mut H) -> Res<bool> {
        let width = self.width();
        if cost < width {
            return Ok(true);
        }
        // Component pools carry no callbacks in multi-target mode.
        for gram in 0..width {
            let top = cost + 1 - width;
            while self.pools[gram].built < top {
                let layer = self.pools[gram].built + 1;
                if !self.build_layer(gram, layer, false, host)? {
                    return Ok(false);
                }
                self.pools[gram].built = layer
            }
        }

        let mut splits = Splits::new(cost, width);
        while let Some(costs) = splits.next() {
            let starts: Vec<&[Term]> = (0..width)
                .map(|gram| self.pools[gram].at(self.grammars[gram].start(), costs[gram]))
                .collect();
            if starts.iter().any(|pool| pool.is_empty()) {
                continue;
            }
            let mut odometer = vec![0; width];
            loop {
                let tuple: Vec<Term> = (0..width)
                    .map(|gram| starts[gram][odometer[gram]].clone())
                    .collect();
                match host.expressions(&tuple)? {
                    Feedback::Stop => return Ok(false),
                    _ => (),
                }
                // Advance the odometer.
                let mut dim = 0;
                loop {
                    if dim == width {
                        break;
                    }
                    odometer[dim] += 1;
                    if odometer[dim] < starts[dim].len() {
                        break;
                    }
                    odometer[dim] = 0;
                    dim += 1
                }
                if dim == width {
                    break;
                }
            }
        }
        Ok(true)
    }
}

/// Iterator over the ways to split a total cost among `n` slots, each
/// getting at least `1`.
struct Splits {
    total: usize,
    current: Option<Vec<usize>>,
}

impl Splits {
    fn new(total: usize, slots: usize) -> Self {
        debug_assert! { slots >= 1 }
        let current = if total >= slots {
            let mut first = vec![1; slots];
            first[slots - 1] = total - (slots - 1);
            Some(first)
        } else {
            None
        };
        Splits { total, current }
    }

    /// Next split, in lexicographic order.
    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.current.take()?;
        let slots = current.len();
        // Successor: bump the rightmost slot that can still grow while the
        // remainder keeps every later slot at `1` or more.
        let mut next = current.clone();
        let mut done = true;
        for dim in (0..slots - 1).rev() {
            let used: usize = next[0..=dim].iter().sum();
            let after = slots - dim - 1;
            if used + 1 + after <= self.total {
                next[dim] += 1;
                for slot in next.iter_mut().skip(dim + 1).take(after - 1) {
                    *slot = 1
                }
                let used: usize = next[0..slots - 1].iter().sum();
                next[slots - 1] = self.total - used;
                self.current = Some(next);
                done = false;
                break;
            }
        }
        if done {
            self.current = None
        }
        Some(current)
    }
}

/// Iterator over argument choices for an application production, given
/// per-argument costs.
struct Picks<'a> {
    pools: Vec<&'a [Term]>,
    odometer: Vec<usize>,
    done: bool,
}

impl<'a> Picks<'a> {
    fn new(pools: &'a Pools, args: &[NtIdx], costs: Vec<usize>) -> Self {
        debug_assert_eq! { args.len(), costs.len() }
        let pools: Vec<&[Term]> = args
            .iter()
            .zip(costs.iter())
            .map(|(nt, cost)| pools.at(*nt, *cost))
            .collect();
        let done = pools.iter().any(|pool| pool.is_empty());
        Picks {
            odometer: vec![0; pools.len()],
            pools,
            done,
        }
    }

    fn next(&mut self) -> Option<Vec<Term>> {
        if self.done {
            return None;
        }
        let chosen: Vec<Term> = self
            .pools
            .iter()
            .zip(self.odometer.iter())
            .map(|(pool, idx)| pool[*idx].clone())
            .collect();
        // Advance the odometer.
        let mut dim = 0;
        loop {
            if dim == self.pools.len() {
                self.done = true;
                break;
            }
            self.odometer[dim] += 1;
            if self.odometer[dim] < self.pools[dim].len() {
                break;
            }
            self.odometer[dim] = 0;
            dim += 1
        }
        Some(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Collector {
        exprs: Vec<(usize, Term)>,
        subs: Vec<Term>,
        cost: usize,
        prune: Option<Term>,
        stop_after: Option<usize>,
    }
    impl Collector {
        fn new(cost: usize) -> Self {
            Collector {
                exprs: Vec::new(),
                subs: Vec::new(),
                cost,
                prune: None,
                stop_after: None,
            }
        }
    }
    impl EnumHost for Collector {
        fn expression(&mut self, expr: &Term, _typ: Typ, _nt: NtIdx, _index: usize) -> Res<Feedback> {
            if let Some(pruned) = self.prune.as_ref() {
                if pruned == expr {
                    return Ok(Feedback::Prune);
                }
            }
            self.exprs.push((self.cost, term::to_user(expr)));
            if let Some(max) = self.stop_after {
                if self.exprs.len() >= max {
                    return Ok(Feedback::Stop);
                }
            }
            Ok(Feedback::Keep)
        }
        fn expressions(&mut self, _exprs: &[Term]) -> Res<Feedback> {
            Ok(Feedback::Keep)
        }
        fn sub_expression(&mut self, expr: &Term, _typ: Typ, _nt: NtIdx) -> Res<Feedback> {
            self.subs.push(term::to_user(expr));
            Ok(Feedback::Keep)
        }
    }

    fn arith_grammar() -> Grammar {
        let mut grammar = Grammar::new();
        let start = grammar.add_nt("Start", Typ::Int);
        grammar.add_leaf(start, term::int(0));
        grammar.add_leaf(start, term::int(1));
        grammar.add_app(start, Op::Add, vec![start, start]);
        grammar
    }

    #[test]
    fn costs_are_exact() {
        let grammar = arith_grammar();
        let mut enumerator = CfgEnumerator::single(&grammar);
        let mut host = Collector::new(1);
        assert!(enumerator.enumerate_of_cost(1, &mut host).expect("enumeration failed"));
        let cost_1: Vec<_> = host.exprs.drain(..).collect();
        assert_eq!(
            cost_1.iter().map(|(_, t)| t.clone()).collect::<Vec<_>>(),
            vec![term::int(0), term::int(1)]
        );

        // No expression has cost 2 in this grammar.
        host.cost = 2;
        assert!(enumerator.enumerate_of_cost(2, &mut host).expect("enumeration failed"));
        assert!(host.exprs.is_empty());

        host.cost = 3;
        assert!(enumerator.enumerate_of_cost(3, &mut host).expect("enumeration failed"));
        let cost_3: Vec<_> = host.exprs.drain(..).collect();
        assert_eq!(cost_3.len(), 4);
        for (_, expr) in &cost_3 {
            assert_eq!(expr.size(), 3)
        }
    }

    #[test]
    fn pruning_removes_successors() {
        let grammar = arith_grammar();
        let mut enumerator = CfgEnumerator::single(&grammar);
        let mut host = Collector::new(1);
        host.prune = Some(term::int(1));
        assert!(enumerator.enumerate_of_cost(1, &mut host).expect("enumeration failed"));
        assert!(enumerator.enumerate_of_cost(2, &mut host).expect("enumeration failed"));
        host.cost = 3;
        assert!(enumerator.enumerate_of_cost(3, &mut host).expect("enumeration failed"));
        // Only `0 + 0` survives: every successor embedding `1` is gone.
        let exprs: Vec<_> = host
            .exprs
            .iter()
            .filter(|(cost, _)| *cost == 3)
            .map(|(_, t)| t.clone())
            .collect();
        assert_eq!(exprs, vec![term::add(term::int(0), term::int(0))])
    }

    #[test]
    fn stop_interrupts_and_requires_reset() {
        let grammar = arith_grammar();
        let mut enumerator = CfgEnumerator::single(&grammar);
        let mut host = Collector::new(1);
        host.stop_after = Some(1);
        assert!(!enumerator.enumerate_of_cost(1, &mut host).expect("enumeration failed"));
        assert_eq!(host.exprs.len(), 1);

        // Enumerating again without a reset is a bug.
        let err = enumerator.enumerate_of_cost(1, &mut host).unwrap_err();
        assert!(format!("{}", err).contains("[bug]"));

        enumerator.reset();
        host.stop_after = None;
        assert!(enumerator.enumerate_of_cost(1, &mut host).expect("enumeration failed"))
    }

    #[test]
    fn cond_nt_goes_through_sub_expressions() {
        let mut grammar = Grammar::new();
        let start = grammar.add_nt("Start", Typ::Int);
        let cond = grammar.add_nt("Cond", Typ::Bool);
        grammar.add_leaf(start, term::int(0));
        grammar.add_leaf(start, term::var(Typ::Int, 0));
        grammar.add_app(cond, Op::Le, vec![start, start]);
        grammar.set_cond(cond);

        let mut enumerator = CfgEnumerator::single(&grammar);
        let mut host = Collector::new(1);
        assert!(enumerator.enumerate_of_cost(1, &mut host).expect("enumeration failed"));
        host.cost = 3;
        assert!(enumerator.enumerate_of_cost(3, &mut host).expect("enumeration failed"));
        // The four `<=` combinations arrived as sub-expressions.
        assert_eq!(host.subs.len(), 4)
    }

    #[test]
    fn splits_cover_compositions() {
        let mut splits = Splits::new(4, 2);
        let mut all = Vec::new();
        while let Some(split) = splits.next() {
            all.push(split)
        }
        assert_eq!(all, vec![vec![1, 3], vec![2, 2], vec![3, 1]])
    }

    #[test]
    fn tuple_costs_sum_up() {
        let grammar_1 = arith_grammar();
        let grammar_2 = arith_grammar();

        struct Tuples {
            tuples: Vec<Vec<Term>>,
        }
        impl EnumHost for Tuples {
            fn expression(&mut self, _: &Term, _: Typ, _: NtIdx, _: usize) -> Res<Feedback> {
                panic!("no single-expression callbacks in multi mode")
            }
            fn expressions(&mut self, exprs: &[Term]) -> Res<Feedback> {
                self.tuples.push(exprs.to_vec());
                Ok(Feedback::Keep)
            }
            fn sub_expression(&mut self, _: &Term, _: Typ, _: NtIdx) -> Res<Feedback> {
                panic!("no sub-expression callbacks in multi mode")
            }
        }

        let mut enumerator = CfgEnumerator::multi(vec![&grammar_1, &grammar_2]);
        let mut host = Tuples { tuples: Vec::new() };
        assert!(enumerator.enumerate_of_cost(2, &mut host).expect("enumeration failed"));
        // Cost 2 tuples: both components cost 1.
        assert_eq!(host.tuples.len(), 4);
        for tuple in &host.tuples {
            assert_eq!(tuple.len(), 2);
            assert_eq!(tuple[0].size() + tuple[1].size(), 2)
        }
    }
}
