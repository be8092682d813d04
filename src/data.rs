//! Point storage, behavior signatures and concrete evaluation.
//!
//! An [`Evaluator`] owns the point set of a solve (or of a single
//! programming-by-example conjunct) and a [`SigStore`] interning the
//! behavior signatures observed so far. The point set only grows; adding a
//! point makes the interned signatures stale, which callers acknowledge by
//! resetting the store.
//!
//! A *signature* is the vector of values a candidate produces at every
//! (point, application) pair, in point order. Evaluation short-circuits on
//! a known-bad point, one where the candidate's own evaluation is stuck
//! (division by zero, typically), leaving a *partial* signature: partial
//! signatures are never interned, so two of them can never be wrongly
//! unified. A candidate that merely falsifies the constraint still gets a
//! complete signature, so semantically redundant invalid candidates are
//! recognized and pruned.
//!
//! [`Evaluator`]: struct.Evaluator.html (Evaluator struct)
//! [`SigStore`]: struct.SigStore.html (SigStore struct)

use crate::common::*;

/// A behavior signature.
pub type Sig = Vec<Val>;

/// Outcome of interning a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified {
    /// The signature was not observed before for this evaluator.
    Fresh,
    /// The signature duplicates a previous one.
    Duplicate,
}

/// Flags reported by concrete evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalStatus {
    /// The signature is new for this evaluator.
    pub dist: bool,
    /// Evaluation short-circuited on a known-bad point, the signature is
    /// only partial.
    pub partial: bool,
}

/// Interns behavior signatures for one evaluator.
#[derive(Debug, Clone, Default)]
pub struct SigStore {
    /// Candidate signatures seen.
    cands: HashSet<Sig>,
    /// Sub-expression signatures seen, per originating non-terminal.
    ///
    /// Expressions from different non-terminals are not interchangeable in
    /// the enumerator's pools, so they never prune each other.
    subs: HashMap<NtIdx, HashSet<Sig>>,
    /// Generation counter, bumped on every reset.
    generation: usize,
}

impl SigStore {
    /// Constructor.
    pub fn new() -> Self {
        SigStore::default()
    }

    /// Classifies a candidate signature.
    ///
    /// A partial signature is distinguishable but inconclusive: it is not
    /// interned and compares equal to nothing.
    pub fn classify(&mut self, sig: Sig, partial: bool) -> Classified {
        if partial {
            return Classified::Fresh;
        }
        if self.cands.insert(sig) {
            Classified::Fresh
        } else {
            Classified::Duplicate
        }
    }

    /// Classifies a sub-expression signature.
    pub fn classify_sub(&mut self, nt: NtIdx, sig: Sig, partial: bool) -> Classified {
        if partial {
            return Classified::Fresh;
        }
        if self.subs.entry(nt).or_insert_with(HashSet::new).insert(sig) {
            Classified::Fresh
        } else {
            Classified::Duplicate
        }
    }

    /// Discards all entries without destroying the store.
    ///
    /// Used when new points invalidate previously interned signatures.
    pub fn reset(&mut self) {
        self.cands.clear();
        self.subs.clear();
        self.generation += 1
    }

    /// Number of resets so far.
    pub fn generation(&self) -> usize {
        self.generation
    }
}

/// Evaluates expressions against the accumulated point set.
///
/// Owns its signature store; lives for one solve.
pub struct Evaluator {
    /// Evaluator identity, namespace for signature interning and queue
    /// membership in programming-by-example mode.
    idx: EvlIdx,
    /// Constraint checked at each point, over base and derived variables.
    constraint: Term,
    /// Number of base variables.
    base: usize,
    /// Total number of variables, base plus derived.
    total: usize,
    /// Application slots, per target.
    apps: TgtMap<Vec<FunApp>>,
    /// Point set, append-only.
    points: Vec<Point>,
    /// Signature store.
    sigs: SigStore,
    /// Value vector of the last sub-expression checked, retrievable by
    /// evaluator identity.
    sub_eval: Option<Vec<Val>>,
}

impl Evaluator {
    /// Evaluator for a full instance, seeded with zero points.
    pub fn of_instance(idx: EvlIdx, instance: &Instance) -> Self {
        Self::new(
            idx,
            instance.constraint().clone(),
            instance.base().len(),
            instance.apps().clone(),
        )
    }

    /// Constructor.
    pub fn new(idx: EvlIdx, constraint: Term, base: usize, apps: TgtMap<Vec<FunApp>>) -> Self {
        let mut total = base;
        for apps in &apps {
            total += apps.len()
        }
        Evaluator {
            idx,
            constraint,
            base,
            total,
            apps,
            points: Vec::new(),
            sigs: SigStore::new(),
            sub_eval: None,
        }
    }

    /// Evaluator identity.
    pub fn idx(&self) -> EvlIdx {
        self.idx
    }

    /// Number of points.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Appends a point.
    ///
    /// No signature is recomputed eagerly; callers reset the signature
    /// store when they need the new point reflected. Duplicate points are
    /// accepted, adding one is idempotent modulo that reset.
    pub fn add_point(&mut self, point: Point) {
        debug_assert_eq! { point.len(), self.base }
        self.points.push(point)
    }

    /// Discards the interned signatures.
    pub fn reset_sigs(&mut self) {
        self.sigs.reset()
    }

    /// Checks an expression for concrete validity on every point.
    ///
    /// Returns `true` iff the constraint, instantiated at the expression,
    /// holds on every point. Evaluation short-circuits when the
    /// expression itself gets stuck at a point; the truncated signature is
    /// flagged as partial. A point that merely falsifies the constraint
    /// does not truncate the signature.
    ///
    /// Single-target form: the expression stands for target `0`.
    pub fn check_concrete_validity(&mut self, expr: &Term) -> Res<(bool, EvalStatus)> {
        let mut sig = Sig::with_capacity(self.points.len());
        let mut valid = true;
        let mut partial = false;

        'points: for point in &self.points {
            let mut model = Self::blank_model(point, self.total);
            for apps in &self.apps {
                for app in apps {
                    let value = Self::apply(expr, app, point)?;
                    let known = value.is_known();
                    sig.push(value.clone());
                    model[app.slot] = value;
                    if !known {
                        valid = false;
                        partial = true;
                        break 'points;
                    }
                }
            }
            if self.constraint.eval(&model)?.to_bool()? != Some(true) {
                valid = false
            }
        }

        let dist = self.sigs.classify(sig, partial) == Classified::Fresh;
        Ok((valid, EvalStatus { dist, partial }))
    }

    /// Checks a tuple of expressions, one per target, jointly.
    ///
    /// No signature policy applies: multi-function mode evaluates
    /// concrete validity jointly and never prunes.
    pub fn check_tuple_validity(&self, exprs: &[Term]) -> Res<bool> {
        debug_assert_eq! { exprs.len(), self.apps.len() }
        for point in &self.points {
            let mut model = Self::blank_model(point, self.total);
            for (tgt, apps) in self.apps.index_iter() {
                for app in apps {
                    let value = Self::apply(&exprs[tgt.get()], app, point)?;
                    model[app.slot] = value
                }
            }
            let holds = self.constraint.eval(&model)?.to_bool()?;
            if holds != Some(true) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Classifies a sub-expression: computes its value at every
    /// (point, application) pair and interns the vector.
    ///
    /// The value vector is recorded as the *sub-expression evaluation
    /// point*, retrievable with [`sub_expr_eval`]. A stuck value makes the
    /// signature partial.
    ///
    /// [`sub_expr_eval`]: struct.Evaluator.html#method.sub_expr_eval
    /// (sub_expr_eval method)
    pub fn check_sub_expression(&mut self, nt: NtIdx, expr: &Term) -> Res<(bool, EvalStatus)> {
        let values = self.eval_sub_expression(expr)?;
        let partial = values.iter().any(|val| !val.is_known());
        let dist = self.sigs.classify_sub(nt, values.clone(), partial) == Classified::Fresh;
        self.sub_eval = Some(values);
        Ok((dist, EvalStatus { dist, partial }))
    }

    /// Evaluates a sub-expression at every (point, application) pair
    /// without touching the signature store.
    pub fn eval_sub_expression(&self, expr: &Term) -> Res<Vec<Val>> {
        let mut values = Vec::with_capacity(self.points.len());
        for point in &self.points {
            for apps in &self.apps {
                for app in apps {
                    values.push(Self::apply(expr, app, point)?)
                }
            }
        }
        Ok(values)
    }

    /// Value vector of the last sub-expression checked.
    pub fn sub_expr_eval(&self) -> Option<&[Val]> {
        self.sub_eval.as_deref()
    }

    /// Checks an assembled expression against this evaluator's points.
    ///
    /// Programming-by-example only: used to validate a decision-tree
    /// expression against a single example.
    pub fn check_example_validity(&self, expr: &Term) -> Res<bool> {
        for point in &self.points {
            let mut sink = Sig::new();
            let model = Self::model_single(point, self.total, &self.apps, expr, &mut sink)?;
            let holds = self.constraint.eval(&model)?.to_bool()?;
            if holds != Some(true) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Assembles the full model for a point with a single-target
    /// candidate, pushing the application values into `sig`.
    fn model_single(
        point: &Point,
        total: usize,
        apps: &TgtMap<Vec<FunApp>>,
        expr: &Term,
        sig: &mut Sig,
    ) -> Res<VarMap<Val>> {
        debug_assert_eq! { apps.len(), 1 }
        let mut model = Self::blank_model(point, total);
        for apps in apps {
            for app in apps {
                let value = Self::apply(expr, app, point)?;
                sig.push(value.clone());
                model[app.slot] = value
            }
        }
        Ok(model)
    }

    /// Model with the point's values and default-padded derived slots.
    fn blank_model(point: &Point, total: usize) -> VarMap<Val> {
        let mut model = VarMap::with_capacity(total);
        for val in point {
            model.push(val.clone());
        }
        while model.len() < total {
            model.push(val::none());
        }
        model
    }

    /// Applies a candidate to an application slot's arguments at a point.
    fn apply(expr: &Term, app: &FunApp, point: &Point) -> Res<Val> {
        let mut params = VarMap::with_capacity(app.args.len());
        for arg in &app.args {
            params.push(arg.eval(point)?);
        }
        expr.eval(&params)
    }
}
