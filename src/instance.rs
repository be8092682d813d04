//! Specification artifacts the solve runs on.
//!
//! Everything here is produced by the host's specification rewriter and is
//! treated as an immutable input: a rewritten constraint in
//! antecedent/consequent form, the base auxiliary variables (the
//! universally quantified inputs), the derived auxiliary variables
//! (application slots for the synthesized functions), and the synthesis
//! targets themselves.
//!
//! Variable indexing convention: the constraint is a term over
//! `0 .. base + derived` where indices below `base` are base variables and
//! the rest are application slots.

use crate::common::*;
use crate::grammar::Grammar;

/// Information about a base auxiliary variable.
#[derive(Debug, Clone)]
pub struct VarInfo {
    /// Name in the original specification.
    pub name: String,
    /// Type.
    pub typ: Typ,
}
impl VarInfo {
    /// Constructor.
    pub fn new<S: Into<String>>(name: S, typ: Typ) -> Self {
        VarInfo {
            name: name.into(),
            typ,
        }
    }
}

/// A function symbol to synthesize.
#[derive(Debug, Clone)]
pub struct SynthTarget {
    /// Name of the function in the original specification.
    pub name: String,
    /// Semantic type of the function's body.
    pub typ: Typ,
    /// Grammar describing this target's candidate space.
    grammar: Grammar,
    /// Types of the formal parameters.
    pub params: VarMap<Typ>,
    /// Number of let-bound variables in the grammar.
    pub let_vars: usize,
    /// Position of the target, stable during a solve.
    position: TgtIdx,
}
impl SynthTarget {
    /// Constructor. The position is set when the target is registered in
    /// an [`Instance`].
    ///
    /// [`Instance`]: struct.Instance.html (Instance struct)
    pub fn new<S: Into<String>>(name: S, typ: Typ, grammar: Grammar, params: VarMap<Typ>) -> Self {
        SynthTarget {
            name: name.into(),
            typ,
            grammar,
            params,
            let_vars: 0,
            position: TgtIdx::zero(),
        }
    }

    /// The target's grammar.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Position of the target.
    pub fn position(&self) -> TgtIdx {
        self.position
    }

    /// Sets the position of the target.
    pub fn set_position(&mut self, position: TgtIdx) {
        self.position = position
    }
}

/// One application of a synthesis target inside the constraint.
#[derive(Debug, Clone)]
pub struct FunApp {
    /// Derived variable standing for the application's value.
    pub slot: VarIdx,
    /// Argument terms, over the base variables.
    pub args: Vec<Term>,
}
impl FunApp {
    /// Constructor.
    pub fn new(slot: VarIdx, args: Vec<Term>) -> Self {
        FunApp { slot, args }
    }
}

/// A programming-by-example conjunct.
///
/// Produced by the rewriter when an implication's antecedent pins every
/// base variable to a constant.
#[derive(Debug, Clone)]
pub struct PbeExample {
    /// Antecedent, pins the base variables.
    pub antecedent: Term,
    /// Consequent, constrains the application slot.
    pub consequent: Term,
    /// Constant bindings for the base variables.
    pub bindings: Point,
}
impl PbeExample {
    /// Constructor.
    pub fn new(antecedent: Term, consequent: Term, bindings: Point) -> Self {
        PbeExample {
            antecedent,
            consequent,
            bindings,
        }
    }
}

/// A synthesis instance: rewritten constraint, auxiliary-variable tables,
/// and synthesis targets.
pub struct Instance {
    /// Rewritten constraint, over base and derived variables.
    constraint: Term,
    /// Base auxiliary variables.
    base: VarMap<VarInfo>,
    /// Synthesis targets.
    targets: TgtMap<SynthTarget>,
    /// Application slots, per target.
    apps: TgtMap<Vec<FunApp>>,
    /// Per-example artifacts when the rewriter detected a
    /// programming-by-example shape.
    pbe: Option<Vec<PbeExample>>,
}

impl Instance {
    /// Constructor.
    ///
    /// Assigns positions to the targets in registration order.
    pub fn new(
        constraint: Term,
        base: VarMap<VarInfo>,
        mut targets: TgtMap<SynthTarget>,
        apps: TgtMap<Vec<FunApp>>,
    ) -> Self {
        for (position, target) in targets
            .iter_mut()
            .enumerate()
            .map(|(idx, tgt)| (TgtIdx::from(idx), tgt))
        {
            target.set_position(position)
        }
        Instance {
            constraint,
            base,
            targets,
            apps,
            pbe: None,
        }
    }

    /// Attaches programming-by-example artifacts.
    pub fn set_pbe(&mut self, examples: Vec<PbeExample>) {
        self.pbe = Some(examples)
    }

    /// The rewritten constraint.
    pub fn constraint(&self) -> &Term {
        &self.constraint
    }

    /// Base auxiliary variables.
    pub fn base(&self) -> &VarMap<VarInfo> {
        &self.base
    }

    /// Synthesis targets.
    pub fn targets(&self) -> &TgtMap<SynthTarget> {
        &self.targets
    }

    /// Application slots, per target.
    pub fn apps(&self) -> &TgtMap<Vec<FunApp>> {
        &self.apps
    }

    /// Total number of variables: base plus derived.
    pub fn var_count(&self) -> usize {
        let mut count = self.base.len();
        for apps in &self.apps {
            count += apps.len()
        }
        count
    }

    /// Programming-by-example artifacts, if the specification degenerates
    /// to pointwise examples: every example's antecedent pins all base
    /// variables to constants.
    pub fn pbe_examples(&self) -> Option<&[PbeExample]> {
        match self.pbe {
            Some(ref examples)
                if examples
                    .iter()
                    .all(|ex| ex.bindings.len() == self.base.len()) =>
            {
                Some(examples)
            }
            _ => None,
        }
    }

    /// Pre-flight checks, run before enumeration begins.
    pub fn preflight(&self) -> Res<()> {
        if self.targets.is_empty() {
            bail!(ErrorKind::SpecShape(
                "no function to synthesize in the constraint".into()
            ))
        }
        if self.targets.len() != self.apps.len() {
            bail!("[bug] target and application tables disagree")
        }

        for target in &self.targets {
            if target.let_vars > 0 {
                bail!(ErrorKind::SpecShape(format!(
                    "target `{}` uses let-bound grammar variables",
                    target.name
                )))
            }
            target.grammar().check()?
        }

        // Application slots must sit right after the base variables.
        let total = self.var_count();
        for apps in &self.apps {
            for app in apps {
                if *app.slot < self.base.len() || *app.slot >= total {
                    bail!("[bug] application slot v_{} out of range", app.slot)
                }
            }
        }

        if self.pbe_examples().is_some() {
            for apps in &self.apps {
                if apps.len() != 1 {
                    bail!(ErrorKind::SpecShape(
                        "programming-by-example requires exactly one application per target".into()
                    ))
                }
            }
        }

        Ok(())
    }
}
