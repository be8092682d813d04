//! Decision-tree assembly for programming-by-example unification.
//!
//! The builder tracks, during terminal discovery, a FIFO of *unique*
//! per-example evaluators (each needing its own terminal expression) and a
//! bag of *duplicates* attached to an already chosen terminal. Once every
//! example is covered, the tree phase threads the evaluators into a
//! partial binary tree whose internal nodes are predicate expressions,
//! whose leaves are terminal indices, and whose pending slots are
//! evaluator pairs awaiting a separating predicate.
//!
//! Pending slots are located in a canonical order: leaves first, left
//! before right.

use crate::common::*;

/// Branch-taking convention for decision trees.
///
/// The predicate test compares sub-expression evaluation values against a
/// canonical *taken* value; materialization turns a predicate and two
/// subtrees into a user expression.
pub trait BranchSemantics {
    /// Value a predicate must produce for its branch to be taken.
    fn taken(&self) -> Val;
    /// Materializes a decision node.
    fn materialize(&self, pred: &Term, then: &Term, els: &Term) -> Term;
}

/// Integer-1 convention: a predicate takes its branch when it evaluates
/// to `1`.
pub struct UnitBranch;
impl BranchSemantics for UnitBranch {
    fn taken(&self) -> Val {
        val::int(1)
    }
    fn materialize(&self, pred: &Term, then: &Term, els: &Term) -> Term {
        term::ite(
            term::eq(pred.clone(), term::int(1)),
            then.clone(),
            els.clone(),
        )
    }
}

/// A node of the partial tree.
#[derive(Debug, Clone)]
enum DTree {
    /// Resolved leaf: a terminal expression index.
    Leaf(usize),
    /// Pair of evaluators awaiting a separating predicate.
    Pending(EvlIdx, EvlIdx),
    /// Decision node.
    Node {
        /// Predicate expression.
        pred: Term,
        /// Taken branch.
        then: Box<DTree>,
        /// Other branch.
        els: Box<DTree>,
    },
}

impl DTree {
    /// First pending slot, leaves first, left before right.
    fn locate(&self) -> Option<(EvlIdx, EvlIdx)> {
        match *self {
            DTree::Leaf(_) => None,
            DTree::Pending(fst, snd) => Some((fst, snd)),
            DTree::Node {
                ref then, ref els, ..
            } => then.locate().or_else(|| els.locate()),
        }
    }

    /// Mutable reference on the first pending slot.
    fn locate_mut(&mut self) -> Option<&mut DTree> {
        match *self {
            DTree::Leaf(_) => None,
            DTree::Pending(_, _) => Some(self),
            DTree::Node {
                ref mut then,
                ref mut els,
                ..
            } => then.locate_mut().or_else(move || els.locate_mut()),
        }
    }

    /// Materializes the tree. Defined only when no pending slot remains.
    fn expr(&self, terms: &[Term], sem: &dyn BranchSemantics) -> Res<Term> {
        match *self {
            DTree::Leaf(idx) => match terms.get(idx) {
                Some(term) => Ok(term.clone()),
                None => bail!("[bug] decision-tree leaf points at unknown terminal {}", idx),
            },
            DTree::Pending(fst, snd) => bail!(
                "[bug] materializing an incomplete decision tree (pending pair {}, {})",
                fst,
                snd
            ),
            DTree::Node {
                ref pred,
                ref then,
                ref els,
            } => {
                let then = then.expr(terms, sem)?;
                let els = els.expr(terms, sem)?;
                Ok(sem.materialize(pred, &then, &els))
            }
        }
    }
}

/// Maintains the per-example evaluator queues and the partial tree.
pub struct TreeBuilder {
    /// Unique evaluators, in discovery order. The back one is the current
    /// front of the terminal search.
    uniq: Vec<EvlIdx>,
    /// Duplicate evaluators, attached to an existing terminal.
    dups: Vec<EvlIdx>,
    /// Evaluators not yet threaded into the tree.
    todo: ::std::collections::VecDeque<EvlIdx>,
    /// Partial tree, built once terminals are done.
    root: Option<DTree>,
}

impl TreeBuilder {
    /// Constructor.
    pub fn new() -> Self {
        TreeBuilder {
            uniq: Vec::new(),
            dups: Vec::new(),
            todo: ::std::collections::VecDeque::new(),
            root: None,
        }
    }

    /// Resets the builder. Called at solve start and at
    /// programming-by-example entry.
    pub fn reset(&mut self) {
        self.uniq.clear();
        self.dups.clear();
        self.todo.clear();
        self.root = None
    }

    /// Registers an example needing its own terminal expression.
    pub fn push_uniq(&mut self, evl: EvlIdx) {
        self.uniq.push(evl)
    }

    /// Registers an example covered by an existing terminal.
    pub fn push_dup(&mut self, evl: EvlIdx) {
        self.dups.push(evl)
    }

    /// Current front of the terminal search.
    pub fn queue_back(&self) -> Option<EvlIdx> {
        self.uniq.last().cloned()
    }

    /// Number of unique examples.
    pub fn uniq_count(&self) -> usize {
        self.uniq.len()
    }

    /// Number of duplicate examples.
    pub fn dup_count(&self) -> usize {
        self.dups.len()
    }

    /// Threads the evaluators into the initial tree skeleton.
    ///
    /// `order` lists every example evaluator in example order; the first
    /// pair becomes the root's pending slot.
    pub fn init_tree(&mut self, order: Vec<EvlIdx>) -> Res<()> {
        if order.len() < 2 {
            bail!("[bug] decision tree over fewer than two examples")
        }
        let mut order = order.into_iter();
        let fst = order.next().expect("[unreachable] checked above");
        let snd = order.next().expect("[unreachable] checked above");
        self.todo = order.collect();
        self.root = Some(DTree::Pending(fst, snd));
        Ok(())
    }

    /// Next pending pair, in canonical traversal order. `None` when the
    /// tree is complete.
    pub fn locate_next_eval_node(&self) -> Option<(EvlIdx, EvlIdx)> {
        self.root.as_ref().and_then(|root| root.locate())
    }

    /// Replaces the current pending slot with a decision node.
    ///
    /// The pair must be oriented by the caller: `then_ev` is the evaluator
    /// whose sub-expression value equals the canonical taken value. The
    /// other evaluator either chains to the next evaluator awaiting
    /// placement, or becomes the final leaf.
    pub fn insert_decision_node(
        &mut self,
        pred: Term,
        then_term: usize,
        else_ev: EvlIdx,
        else_term: usize,
    ) -> Res<()> {
        let next = self.todo.pop_front();
        let slot = match self.root.as_mut().and_then(|root| root.locate_mut()) {
            Some(slot) => slot,
            None => bail!("[bug] inserting a decision node without a pending slot"),
        };
        let els = match next {
            Some(next_ev) => DTree::Pending(else_ev, next_ev),
            None => DTree::Leaf(else_term),
        };
        *slot = DTree::Node {
            pred,
            then: Box::new(DTree::Leaf(then_term)),
            els: Box::new(els),
        };
        Ok(())
    }

    /// Collapses a pending pair whose terminals coincide into a shared
    /// leaf. Needs no enumerator assistance.
    pub fn insert_shared_decision_node(&mut self, shared_term: usize) -> Res<()> {
        let next = self.todo.pop_front();
        let slot = match self.root.as_mut().and_then(|root| root.locate_mut()) {
            Some(slot) => slot,
            None => bail!("[bug] collapsing a shared node without a pending slot"),
        };
        let pair_snd = match *slot {
            DTree::Pending(_, snd) => snd,
            _ => bail!("[bug] located slot is not pending"),
        };
        *slot = match next {
            Some(next_ev) => DTree::Pending(pair_snd, next_ev),
            None => DTree::Leaf(shared_term),
        };
        Ok(())
    }

    /// Materializes the user-facing if-then-else expression.
    ///
    /// Defined only when no pending slot remains.
    pub fn tree_expr(&self, terms: &[Term], sem: &dyn BranchSemantics) -> Res<Term> {
        match self.root {
            Some(ref root) => root.expr(terms, sem),
            None => bail!("[bug] materializing a decision tree that was never initialized"),
        }
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        TreeBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_examples_one_predicate() {
        let mut builder = TreeBuilder::new();
        builder.push_uniq(0.into());
        builder.push_uniq(1.into());
        builder
            .init_tree(vec![0.into(), 1.into()])
            .expect("init failed");

        let pair = builder.locate_next_eval_node().expect("no pending pair");
        assert_eq!(pair, (0.into(), 1.into()));

        let pred = term::modulo(term::var(Typ::Int, 0), term::int(2));
        // Oriented: evaluator 1 takes the branch.
        builder
            .insert_decision_node(pred, 1, 0.into(), 0)
            .expect("insertion failed");
        assert!(builder.locate_next_eval_node().is_none());

        let terms = vec![term::int(0), term::int(1)];
        let tree = builder
            .tree_expr(&terms, &UnitBranch)
            .expect("materialization failed");
        let expected = term::ite(
            term::eq(
                term::modulo(term::var(Typ::Int, 0), term::int(2)),
                term::int(1),
            ),
            term::int(1),
            term::int(0),
        );
        assert_eq!(tree, expected)
    }

    #[test]
    fn shared_pairs_collapse_without_predicates() {
        let mut builder = TreeBuilder::new();
        // Three examples, the first two sharing terminal `0`.
        builder
            .init_tree(vec![0.into(), 1.into(), 2.into()])
            .expect("init failed");

        let pair = builder.locate_next_eval_node().expect("no pending pair");
        assert_eq!(pair, (0.into(), 1.into()));
        builder
            .insert_shared_decision_node(0)
            .expect("collapse failed");

        // The pair moved on to the third example.
        let pair = builder.locate_next_eval_node().expect("no pending pair");
        assert_eq!(pair, (1.into(), 2.into()));

        let pred = term::var(Typ::Int, 0);
        builder
            .insert_decision_node(pred.clone(), 1, 1.into(), 0)
            .expect("insertion failed");
        assert!(builder.locate_next_eval_node().is_none());

        let terms = vec![term::int(7), term::int(42)];
        let tree = builder
            .tree_expr(&terms, &UnitBranch)
            .expect("materialization failed");
        let expected = term::ite(
            term::eq(pred, term::int(1)),
            term::int(42),
            term::int(7),
        );
        assert_eq!(tree, expected)
    }

    #[test]
    fn incomplete_tree_is_a_bug() {
        let mut builder = TreeBuilder::new();
        builder
            .init_tree(vec![0.into(), 1.into()])
            .expect("init failed");
        let terms = vec![term::int(0), term::int(1)];
        let err = builder.tree_expr(&terms, &UnitBranch).unwrap_err();
        assert!(format!("{}", err).contains("[bug]"))
    }

    #[test]
    fn duplicate_bookkeeping() {
        let mut builder = TreeBuilder::new();
        builder.push_uniq(0.into());
        builder.push_dup(2.into());
        builder.push_uniq(1.into());
        assert_eq!(builder.queue_back(), Some(1.into()));
        assert_eq!(builder.uniq_count(), 2);
        builder.reset();
        assert_eq!(builder.queue_back(), None)
    }
}
