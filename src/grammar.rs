//! Grammar of candidate expressions.
//!
//! A grammar is a set of typed non-terminals, each with productions that
//! are either leaves (constants, formal parameters) or operator
//! applications over non-terminals. The enumerator walks it by increasing
//! cost, where the cost of an expression is its size: `1` for a leaf,
//! `1` plus the children's costs for an application.
//!
//! Candidate expressions use [`term::var`] for formal parameters: variable
//! `i` is the target's `i`-th parameter.
//!
//! [`term::var`]: ../term/fn.var.html (var function)

use crate::common::*;

/// A production of a non-terminal.
#[derive(Debug, Clone)]
pub enum Prod {
    /// A leaf: a constant or a formal parameter.
    Leaf(Term),
    /// An operator applied to sub-expressions drawn from non-terminals.
    App {
        /// The operator.
        op: Op,
        /// Non-terminals the arguments are drawn from.
        args: Vec<NtIdx>,
    },
}

/// A non-terminal.
#[derive(Debug, Clone)]
pub struct NtDef {
    /// Name, for diagnostics.
    pub name: String,
    /// Semantic type of the expressions this non-terminal produces.
    pub typ: Typ,
    /// Productions.
    pub prods: Vec<Prod>,
}

/// A grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    /// Non-terminals.
    nts: NtMap<NtDef>,
    /// Start non-terminal, producing full candidates.
    start: NtIdx,
    /// Non-terminal whose expressions can branch decision trees, if any.
    cond: Option<NtIdx>,
}

impl Grammar {
    /// Empty grammar. The first non-terminal added is the start symbol.
    pub fn new() -> Self {
        Grammar {
            nts: NtMap::new(),
            start: NtIdx::zero(),
            cond: None,
        }
    }

    /// Adds a non-terminal, yields its index.
    pub fn add_nt<S: Into<String>>(&mut self, name: S, typ: Typ) -> NtIdx {
        self.nts.push(NtDef {
            name: name.into(),
            typ,
            prods: Vec::new(),
        })
    }

    /// Adds a production to a non-terminal.
    pub fn add_prod(&mut self, nt: NtIdx, prod: Prod) {
        self.nts[nt].prods.push(prod)
    }

    /// Adds a leaf production.
    pub fn add_leaf(&mut self, nt: NtIdx, term: Term) {
        self.add_prod(nt, Prod::Leaf(term))
    }

    /// Adds an application production.
    pub fn add_app(&mut self, nt: NtIdx, op: Op, args: Vec<NtIdx>) {
        self.add_prod(nt, Prod::App { op, args })
    }

    /// Sets the start non-terminal.
    pub fn set_start(&mut self, nt: NtIdx) {
        self.start = nt
    }

    /// Marks a non-terminal as the decision-tree branching family.
    pub fn set_cond(&mut self, nt: NtIdx) {
        self.cond = Some(nt)
    }

    /// Non-terminals.
    pub fn nts(&self) -> &NtMap<NtDef> {
        &self.nts
    }

    /// Start non-terminal.
    pub fn start(&self) -> NtIdx {
        self.start
    }

    /// Branching non-terminal, if any.
    pub fn cond(&self) -> Option<NtIdx> {
        self.cond
    }

    /// Type of the start non-terminal.
    pub fn typ(&self) -> Typ {
        self.nts[self.start].typ
    }

    /// Checks the grammar is well-formed.
    pub fn check(&self) -> Res<()> {
        if self.nts.is_empty() {
            bail!(ErrorKind::SpecShape("grammar has no non-terminal".into()))
        }
        for nt in &self.nts {
            if nt.prods.is_empty() {
                bail!(ErrorKind::SpecShape(format!(
                    "non-terminal `{}` has no production",
                    nt.name
                )))
            }
            for prod in &nt.prods {
                match prod {
                    Prod::Leaf(term) => {
                        if term.typ() != nt.typ {
                            bail!(ErrorKind::SpecShape(format!(
                                "leaf `{}` of non-terminal `{}` has type {}, expected {}",
                                term,
                                nt.name,
                                term.typ(),
                                nt.typ
                            )))
                        }
                    }
                    Prod::App { args, .. } => {
                        if args.is_empty() {
                            bail!(ErrorKind::SpecShape(format!(
                                "application production of `{}` has no argument",
                                nt.name
                            )))
                        }
                        for arg in args {
                            if *arg >= self.nts.next_index() {
                                bail!(ErrorKind::SpecShape(format!(
                                    "production of `{}` mentions unknown non-terminal #{}",
                                    nt.name, arg
                                )))
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Grammar::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_grammar_is_rejected() {
        let grammar = Grammar::new();
        let err = grammar.check().unwrap_err();
        assert!(err.is_spec_shape())
    }

    #[test]
    fn productionless_nt_is_rejected() {
        let mut grammar = Grammar::new();
        let _ = grammar.add_nt("Start", Typ::Int);
        let err = grammar.check().unwrap_err();
        assert!(err.is_spec_shape())
    }

    #[test]
    fn well_formed() {
        let mut grammar = Grammar::new();
        let start = grammar.add_nt("Start", Typ::Int);
        grammar.add_leaf(start, term::int(0));
        grammar.add_leaf(start, term::var(Typ::Int, 0));
        grammar.add_app(start, Op::Add, vec![start, start]);
        grammar.check().expect("grammar should be well-formed")
    }
}
