//! Hash-consed concrete values.
//!
//! Values can be automatically created (using `into`) to
//!
//! - `RVal::B` from `bool`
//! - `RVal::I` from `Int`, `usize`, `isize`, `u32`, `i32`, `u64`, `i64`
//!
//! `RVal::N` is the *non-value*: evaluation got stuck, typically on a
//! division by zero. It propagates through every operator and is never
//! concretely valid.

use hashconsing::{HConsign, HashConsign};

use crate::common::*;

/// Type of the value factory.
type Factory = RwLock<HConsign<RVal>>;

lazy_static! {
    /// Value factory.
    static ref factory: Factory = RwLock::new(HConsign::with_capacity(211));
}

/// A hash-consed value.
pub type Val = HConsed<RVal>;

/// Creates a value.
pub fn mk<V: Into<RVal>>(val: V) -> Val {
    factory.mk(val.into())
}

/// Creates a boolean value.
pub fn bool(b: bool) -> Val {
    factory.mk(RVal::B(b))
}

/// Creates an integer value.
pub fn int<I: Into<Int>>(i: I) -> Val {
    factory.mk(RVal::I(i.into()))
}

/// Creates a non-value.
pub fn none() -> Val {
    factory.mk(RVal::N)
}

/// A concrete value.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum RVal {
    /// A boolean.
    B(bool),
    /// An integer.
    I(Int),
    /// No value.
    N,
}

impl RVal {
    /// Type of the value, if it has one.
    pub fn typ(&self) -> Option<Typ> {
        match *self {
            RVal::B(_) => Some(Typ::Bool),
            RVal::I(_) => Some(Typ::Int),
            RVal::N => None,
        }
    }

    /// True if the value is a proper value.
    pub fn is_known(&self) -> bool {
        match *self {
            RVal::N => false,
            _ => true,
        }
    }

    /// Extracts a boolean. `None` for the non-value.
    ///
    /// Errors on integer values.
    pub fn to_bool(&self) -> Res<Option<bool>> {
        match *self {
            RVal::B(b) => Ok(Some(b)),
            RVal::N => Ok(None),
            RVal::I(_) => bail!("[bug] expected a boolean value, got an integer"),
        }
    }

    /// Extracts an integer. `None` for the non-value.
    ///
    /// Errors on boolean values.
    pub fn to_int(&self) -> Res<Option<Int>> {
        match *self {
            RVal::I(ref i) => Ok(Some(i.clone())),
            RVal::N => Ok(None),
            RVal::B(_) => bail!("[bug] expected an integer value, got a boolean"),
        }
    }
}

impl From<bool> for RVal {
    fn from(b: bool) -> RVal {
        RVal::B(b)
    }
}
impl From<Int> for RVal {
    fn from(i: Int) -> RVal {
        RVal::I(i)
    }
}
macro_rules! int_impls {
    ( $($int:ty),* $(,)? ) => (
        $(
            impl From<$int> for RVal {
                fn from(i: $int) -> RVal {
                    RVal::I( i.into() )
                }
            }
        )*
    );
}
int_impls! { usize, isize, u32, i32, u64, i64 }

impl fmt::Display for RVal {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RVal::B(b) => write!(fmt, "{}", b),
            RVal::I(ref i) => {
                if i.is_negative() {
                    write!(fmt, "(- {})", -i)
                } else {
                    write!(fmt, "{}", i)
                }
            }
            RVal::N => write!(fmt, "_"),
        }
    }
}
