//! Zero-cost wrappers for safe indexing.

use std::io::Write;

use rsmt2::print::{Expr2Smt, Sym2Smt};
use rsmt2::SmtRes;

wrap_usize! {
    #[doc = "Auxiliary variable indices."]
    VarIdx
    #[doc = "Total map from variables to something."]
    map: VarMap
}

impl VarIdx {
    /// Default way to write variables: `v_<idx>`.
    pub fn default_write<W>(self, w: &mut W) -> ::std::io::Result<()>
    where
        W: Write,
    {
        write!(w, "v_{}", self)
    }
    /// Default string representation of a variable.
    pub fn default_str(self) -> String {
        format!("v_{}", self)
    }
}

impl<T: Copy> Sym2Smt<T> for VarIdx {
    fn sym_to_smt2<Writer>(&self, w: &mut Writer, _: T) -> SmtRes<()>
    where
        Writer: Write,
    {
        self.default_write(w)?;
        Ok(())
    }
}

impl<T: Copy> Expr2Smt<T> for VarIdx {
    fn expr_to_smt2<Writer>(&self, w: &mut Writer, _: T) -> SmtRes<()>
    where
        Writer: Write,
    {
        self.sym_to_smt2(w, ())
    }
}

/// Hash map from variables to something.
pub type VarHMap<T> = ::std::collections::HashMap<VarIdx, T>;

wrap_usize! {
    #[doc = "Synthesis target indices."]
    TgtIdx
    #[doc = "Total map from targets to something."]
    map: TgtMap
}

wrap_usize! {
    #[doc = "Grammar non-terminal indices."]
    NtIdx
    #[doc = "Total map from non-terminals to something."]
    map: NtMap
}

wrap_usize! {
    #[doc = "Concrete evaluator identities."]
    EvlIdx
    #[doc = "Total map from evaluators to something."]
    map: EvlMap
}

/// Hash map from evaluator identities to something.
pub type EvlHMap<T> = ::std::collections::HashMap<EvlIdx, T>;
