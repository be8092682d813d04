//! Hash-consed terms of the candidate language.
//!
//! Terms double as *user expressions* and as the payload of enumerator
//! candidates: a candidate borrowed from the enumerator's pools is
//! materialized into an owned expression with [`to_user`], which is cheap
//! thanks to hash-consing.
//!
//! Evaluation stages intermediate values on a shared scratch stack, owned
//! by a [`Scratch`] guard for the duration of a solve. Outside of a solve
//! (unit tests, typically) evaluation falls back on a local buffer.
//!
//! [`to_user`]: fn.to_user.html (to_user function)
//! [`Scratch`]: struct.Scratch.html (Scratch struct)

use std::cell::RefCell;

use hashconsing::{HConsign, HashConsign};

use crate::common::*;

pub mod op;
#[cfg(test)]
mod test;

pub use self::op::Op;

/// Types of the candidate language.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Typ {
    /// Booleans.
    Bool,
    /// Integers.
    Int,
}
impl Typ {
    /// Default value of a type.
    pub fn default_val(self) -> Val {
        match self {
            Typ::Bool => val::bool(false),
            Typ::Int => val::int(0),
        }
    }
}
impl fmt::Display for Typ {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Typ::Bool => write!(fmt, "Bool"),
            Typ::Int => write!(fmt, "Int"),
        }
    }
}

/// Type of the term factory.
type Factory = RwLock<HConsign<RTerm>>;

lazy_static! {
    /// Term factory.
    static ref factory: Factory = RwLock::new(HConsign::with_capacity(3_000));
}

/// A hash-consed term.
pub type Term = HConsed<RTerm>;

/// A real term.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum RTerm {
    /// A variable.
    Var(Typ, VarIdx),
    /// An integer constant.
    Int(Int),
    /// A boolean constant.
    Bool(bool),
    /// An operator application.
    App {
        /// The operator.
        op: Op,
        /// The arguments.
        args: Vec<Term>,
    },
}

impl RTerm {
    /// Type of the term.
    pub fn typ(&self) -> Typ {
        match *self {
            RTerm::Var(typ, _) => typ,
            RTerm::Int(_) => Typ::Int,
            RTerm::Bool(_) => Typ::Bool,
            RTerm::App { op, ref args } => op.typ(
                args.get(1)
                    .map(|arg| arg.typ())
                    .unwrap_or(Typ::Bool),
            ),
        }
    }

    /// Size of the term: number of nodes.
    pub fn size(&self) -> usize {
        match *self {
            RTerm::Var(_, _) | RTerm::Int(_) | RTerm::Bool(_) => 1,
            RTerm::App { ref args, .. } => {
                let mut size = 1;
                for arg in args {
                    size += arg.size()
                }
                size
            }
        }
    }

    /// Evaluates the term against a model.
    ///
    /// Errors on ill-typed applications and out-of-range variables; a
    /// *stuck* evaluation (division by zero) is not an error, it yields the
    /// non-value.
    pub fn eval(&self, model: &VarMap<Val>) -> Res<Val> {
        with_scratch(|vals| {
            // Post-order traversal: values are staged on `vals`, operators
            // are applied when all their arguments are available.
            let mut to_do = vec![Either::Left(self)];
            while let Some(item) = to_do.pop() {
                match item {
                    Either::Left(term) => match *term {
                        RTerm::Var(_, var) => {
                            if *var >= model.len() {
                                bail!("[bug] no value for variable `v_{}` in model", var)
                            }
                            vals.push(model[var].clone())
                        }
                        RTerm::Int(ref i) => vals.push(val::int(i.clone())),
                        RTerm::Bool(b) => vals.push(val::bool(b)),
                        RTerm::App { op, ref args } => {
                            to_do.push(Either::Right((op, args.len())));
                            for arg in args.iter().rev() {
                                to_do.push(Either::Left(arg.get()))
                            }
                        }
                    },
                    Either::Right((op, argc)) => {
                        let args = vals.split_off(vals.len() - argc);
                        vals.push(op.eval(args)?)
                    }
                }
            }
            match vals.pop() {
                Some(val) => Ok(val),
                None => bail!("[bug] evaluation left no value on the stack"),
            }
        })
    }

    /// Writes the term in smt-lib 2 syntax, using a special function to
    /// write variables.
    pub fn write<W, WriteVar>(&self, w: &mut W, write_var: WriteVar) -> IoRes<()>
    where
        W: Write,
        WriteVar: Fn(&mut W, VarIdx) -> IoRes<()>,
    {
        self.write_with(w, &write_var)
    }

    fn write_with<W, WriteVar>(&self, w: &mut W, write_var: &WriteVar) -> IoRes<()>
    where
        W: Write,
        WriteVar: Fn(&mut W, VarIdx) -> IoRes<()>,
    {
        match *self {
            RTerm::Var(_, var) => write_var(w, var),
            RTerm::Int(ref i) => {
                if i.is_negative() {
                    write!(w, "(- {})", -i)
                } else {
                    write!(w, "{}", i)
                }
            }
            RTerm::Bool(b) => write!(w, "{}", b),
            RTerm::App { op, ref args } => {
                write!(w, "({}", op)?;
                for arg in args {
                    write!(w, " ")?;
                    arg.write_with(w, write_var)?
                }
                write!(w, ")")
            }
        }
    }

    /// Substitutes variables by terms. Variables not in the map are left
    /// alone.
    pub fn subst(&self, map: &VarHMap<Term>) -> Term {
        match *self {
            RTerm::Var(typ, v) => match map.get(&v) {
                Some(term) => term.clone(),
                None => var(typ, v),
            },
            RTerm::Int(ref i) => int(i.clone()),
            RTerm::Bool(b) => bool(b),
            RTerm::App { op, ref args } => {
                let args = args.iter().map(|arg| arg.subst(map)).collect();
                app(op, args)
            }
        }
    }
}

impl fmt::Display for RTerm {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut buf = Vec::new();
        self.write(&mut buf, |w, var| var.default_write(w))
            .map_err(|_| fmt::Error)?;
        let s = ::std::str::from_utf8(&buf).map_err(|_| fmt::Error)?;
        fmt.write_str(s)
    }
}

/// Materializes a borrowed candidate into an owned user expression.
pub fn to_user(term: &Term) -> Term {
    term.clone()
}

/// Creates a variable.
pub fn var<V: Into<VarIdx>>(typ: Typ, var: V) -> Term {
    factory.mk(RTerm::Var(typ, var.into()))
}
/// Creates an integer constant.
pub fn int<I: Into<Int>>(i: I) -> Term {
    factory.mk(RTerm::Int(i.into()))
}
/// Creates a boolean constant.
pub fn bool(b: bool) -> Term {
    factory.mk(RTerm::Bool(b))
}
/// Creates an operator application.
///
/// No simplification is performed: candidates are syntactic objects, the
/// enumerator controls their structure and cost.
pub fn app(op: Op, args: Vec<Term>) -> Term {
    factory.mk(RTerm::App { op, args })
}

/// Creates an addition.
pub fn add(l: Term, r: Term) -> Term {
    app(Op::Add, vec![l, r])
}
/// Creates a subtraction.
pub fn sub(l: Term, r: Term) -> Term {
    app(Op::Sub, vec![l, r])
}
/// Creates a multiplication.
pub fn mul(l: Term, r: Term) -> Term {
    app(Op::Mul, vec![l, r])
}
/// Creates an integer division.
pub fn idiv(l: Term, r: Term) -> Term {
    app(Op::IDiv, vec![l, r])
}
/// Creates a modulo.
pub fn modulo(l: Term, r: Term) -> Term {
    app(Op::Mod, vec![l, r])
}
/// Creates a greater-than.
pub fn gt(l: Term, r: Term) -> Term {
    app(Op::Gt, vec![l, r])
}
/// Creates a greater-than-or-equal.
pub fn ge(l: Term, r: Term) -> Term {
    app(Op::Ge, vec![l, r])
}
/// Creates a less-than-or-equal.
pub fn le(l: Term, r: Term) -> Term {
    app(Op::Le, vec![l, r])
}
/// Creates a less-than.
pub fn lt(l: Term, r: Term) -> Term {
    app(Op::Lt, vec![l, r])
}
/// Creates an equality.
pub fn eq(l: Term, r: Term) -> Term {
    app(Op::Eql, vec![l, r])
}
/// Creates a negation.
pub fn not(t: Term) -> Term {
    app(Op::Not, vec![t])
}
/// Creates a conjunction.
pub fn and(args: Vec<Term>) -> Term {
    app(Op::And, args)
}
/// Creates a disjunction.
pub fn or(args: Vec<Term>) -> Term {
    app(Op::Or, args)
}
/// Creates an implication.
pub fn implies(l: Term, r: Term) -> Term {
    app(Op::Impl, vec![l, r])
}
/// Creates an if-then-else.
pub fn ite(c: Term, t: Term, e: Term) -> Term {
    app(Op::Ite, vec![c, t, e])
}

thread_local! {
    /// Evaluation scratch: stages intermediate values during term
    /// evaluation. `None` when no solve is running.
    static SCRATCH: RefCell<Option<Vec<Val>>> = RefCell::new(None);
}

/// Runs an evaluation with the scratch stack if one is active, with a
/// local buffer otherwise.
///
/// The scratch is restored to its input length on exit, error paths
/// included.
fn with_scratch<F>(f: F) -> Res<Val>
where
    F: FnOnce(&mut Vec<Val>) -> Res<Val>,
{
    SCRATCH.with(|scratch| {
        let mut slot = scratch.borrow_mut();
        if let Some(stack) = slot.as_mut() {
            let len = stack.len();
            let res = f(stack);
            stack.truncate(len);
            res
        } else {
            let mut stack = Vec::with_capacity(17);
            f(&mut stack)
        }
    })
}

/// Scoped handle on the evaluation scratch.
///
/// Acquired once at the beginning of a solve; dropping it tears the
/// scratch down, on every solve exit path.
pub struct Scratch {
    _priv: (),
}
impl Scratch {
    /// Acquires the scratch.
    ///
    /// Errors if the scratch is already held by a running solve.
    pub fn acquire() -> Res<Self> {
        SCRATCH.with(|scratch| {
            let mut slot = scratch.borrow_mut();
            if slot.is_some() {
                bail!("[bug] evaluation scratch acquired twice")
            }
            *slot = Some(Vec::with_capacity(211));
            Ok(Scratch { _priv: () })
        })
    }

    /// True if the scratch is currently held.
    pub fn is_active() -> bool {
        SCRATCH.with(|scratch| scratch.borrow().is_some())
    }
}
impl Drop for Scratch {
    fn drop(&mut self) {
        SCRATCH.with(|scratch| *scratch.borrow_mut() = None)
    }
}
