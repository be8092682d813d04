//! Operators.

use crate::common::*;

/// Operators of the candidate language.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Op {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Integer division, Euclidean.
    IDiv,
    /// Modulo, Euclidean.
    Mod,

    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Ge,
    /// Less than or equal to.
    Le,
    /// Less than.
    Lt,

    /// Equal to.
    Eql,
    /// Negation.
    Not,
    /// Conjunction.
    And,
    /// Disjunction.
    Or,
    /// Implication.
    Impl,

    /// If-then-else.
    Ite,
}

impl Op {
    /// String representation, as in smt-lib 2.
    pub fn as_str(self) -> &'static str {
        use self::Op::*;
        match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            IDiv => "div",
            Mod => "mod",
            Gt => ">",
            Ge => ">=",
            Le => "<=",
            Lt => "<",
            Eql => "=",
            Not => "not",
            And => "and",
            Or => "or",
            Impl => "=>",
            Ite => "ite",
        }
    }

    /// Type of an application of the operator, given the type of the
    /// branches for `ite`.
    pub fn typ(self, ite_typ: Typ) -> Typ {
        use self::Op::*;
        match self {
            Add | Sub | Mul | IDiv | Mod => Typ::Int,
            Gt | Ge | Le | Lt | Eql | Not | And | Or | Impl => Typ::Bool,
            Ite => ite_typ,
        }
    }

    /// Evaluation.
    pub fn eval(self, args: Vec<Val>) -> Res<Val> {
        use self::Op::*;
        if args.is_empty() {
            bail!("evaluating operator `{}` on zero arguments", self)
        }

        match self {
            Add => eval::arith(args, "+", |lhs, rhs| lhs + rhs),
            Sub => {
                if args.len() == 1 {
                    eval::minus(args)
                } else {
                    eval::arith(args, "-", |lhs, rhs| lhs - rhs)
                }
            }
            Mul => eval::arith(args, "*", |lhs, rhs| lhs * rhs),
            IDiv => eval::idiv(args),
            Mod => eval::modulo(args),

            Gt => eval::rel(args, ">", |lhs, rhs| lhs > rhs),
            Ge => eval::rel(args, ">=", |lhs, rhs| lhs >= rhs),
            Le => eval::rel(args, "<=", |lhs, rhs| lhs <= rhs),
            Lt => eval::rel(args, "<", |lhs, rhs| lhs < rhs),

            Eql => eval::eql(args),
            Not => eval::not(args),
            And => eval::and(args),
            Or => eval::or(args),
            Impl => eval::implies(args),

            Ite => eval::ite(args),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

/// Evaluation-related stuff.
mod eval {
    use num::Integer;

    use crate::common::*;

    /// Arity check.
    macro_rules! arity {
        ($op:expr => $args:expr, $len:expr) => {
            if $args.len() != $len {
                bail!(
                    "illegal application of `{}` to {} arguments",
                    $op,
                    $args.len()
                )
            }
        };
    }

    /// Extracts the integers of some arguments, `None` if one of them is
    /// the non-value.
    fn ints(args: &[Val], op: &str) -> Res<Option<Vec<Int>>> {
        let mut res = Vec::with_capacity(args.len());
        for arg in args {
            match arg.get() {
                RVal::I(ref i) => res.push(i.clone()),
                RVal::N => return Ok(None),
                RVal::B(_) => bail!("[bug] boolean argument to arithmetic operator `{}`", op),
            }
        }
        Ok(Some(res))
    }

    /// Left-associative application of an arithmetic operation.
    pub fn arith<F>(args: Vec<Val>, op: &str, f: F) -> Res<Val>
    where
        F: Fn(Int, &Int) -> Int,
    {
        let ints = match ints(&args, op)? {
            Some(ints) => ints,
            None => return Ok(val::none()),
        };
        let mut ints = ints.into_iter();
        let mut acc = ints.next().expect("[unreachable] empty application");
        for i in ints {
            acc = f(acc, &i)
        }
        Ok(val::int(acc))
    }

    /// Unary minus.
    pub fn minus(args: Vec<Val>) -> Res<Val> {
        arity!("-" => args, 1);
        match ints(&args, "-")? {
            Some(ints) => Ok(val::int(-&ints[0])),
            None => Ok(val::none()),
        }
    }

    /// Euclidean division: `(div a b)` is stuck when `b` is zero.
    pub fn idiv(args: Vec<Val>) -> Res<Val> {
        arity!("div" => args, 2);
        match euclidean(&args, "div")? {
            Some((q, _)) => Ok(val::int(q)),
            None => Ok(val::none()),
        }
    }

    /// Euclidean remainder: `(mod a b)` is stuck when `b` is zero.
    pub fn modulo(args: Vec<Val>) -> Res<Val> {
        arity!("mod" => args, 2);
        match euclidean(&args, "mod")? {
            Some((_, r)) => Ok(val::int(r)),
            None => Ok(val::none()),
        }
    }

    /// Euclidean division and remainder: the remainder is in `[0, |b|)`.
    fn euclidean(args: &[Val], op: &str) -> Res<Option<(Int, Int)>> {
        let ints = match ints(args, op)? {
            Some(ints) => ints,
            None => return Ok(None),
        };
        let (a, b) = (&ints[0], &ints[1]);
        if b.is_zero() {
            return Ok(None);
        }
        let (mut q, mut r) = a.div_mod_floor(b);
        if r.is_negative() {
            // Floor remainder has the divisor's sign; shift into `[0, |b|)`.
            r -= b;
            q = q + Int::one()
        }
        Ok(Some((q, r)))
    }

    /// Chained relation over integers.
    pub fn rel<F>(args: Vec<Val>, op: &str, f: F) -> Res<Val>
    where
        F: Fn(&Int, &Int) -> bool,
    {
        if args.len() < 2 {
            bail!("illegal application of `{}` to {} argument", op, args.len())
        }
        let ints = match ints(&args, op)? {
            Some(ints) => ints,
            None => return Ok(val::none()),
        };
        for pair in ints.windows(2) {
            if !f(&pair[0], &pair[1]) {
                return Ok(val::bool(false));
            }
        }
        Ok(val::bool(true))
    }

    /// Equality, polymorphic over known values.
    pub fn eql(args: Vec<Val>) -> Res<Val> {
        arity!("=" => args, 2);
        if !args[0].is_known() || !args[1].is_known() {
            return Ok(val::none());
        }
        Ok(val::bool(args[0] == args[1]))
    }

    /// Negation.
    pub fn not(args: Vec<Val>) -> Res<Val> {
        arity!("not" => args, 1);
        match args[0].to_bool()? {
            Some(b) => Ok(val::bool(!b)),
            None => Ok(val::none()),
        }
    }

    /// Conjunction. A false argument dominates the non-value.
    pub fn and(args: Vec<Val>) -> Res<Val> {
        let mut stuck = false;
        for arg in &args {
            match arg.to_bool()? {
                Some(false) => return Ok(val::bool(false)),
                Some(true) => (),
                None => stuck = true,
            }
        }
        if stuck {
            Ok(val::none())
        } else {
            Ok(val::bool(true))
        }
    }

    /// Disjunction. A true argument dominates the non-value.
    pub fn or(args: Vec<Val>) -> Res<Val> {
        let mut stuck = false;
        for arg in &args {
            match arg.to_bool()? {
                Some(true) => return Ok(val::bool(true)),
                Some(false) => (),
                None => stuck = true,
            }
        }
        if stuck {
            Ok(val::none())
        } else {
            Ok(val::bool(false))
        }
    }

    /// Implication.
    pub fn implies(args: Vec<Val>) -> Res<Val> {
        arity!("=>" => args, 2);
        match (args[0].to_bool()?, args[1].to_bool()?) {
            (Some(false), _) | (_, Some(true)) => Ok(val::bool(true)),
            (Some(true), Some(false)) => Ok(val::bool(false)),
            _ => Ok(val::none()),
        }
    }

    /// If-then-else.
    pub fn ite(args: Vec<Val>) -> Res<Val> {
        arity!("ite" => args, 3);
        match args[0].to_bool()? {
            Some(true) => Ok(args[1].clone()),
            Some(false) => Ok(args[2].clone()),
            None => Ok(val::none()),
        }
    }
}
