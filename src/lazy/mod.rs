//! Lazy values — proposals whose computation waits on other properties.
//!
//! Every value a specifier proposes is a [`ValueExpr`]. The `Delayed` arm
//! pairs a pure function with the set of properties it reads, so the
//! dependency graph can be built without calling anything.

pub mod context;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::model::{Distribution, Entity, Resolved, Value};
use crate::Result;

pub use context::Context;

/// Pure computation over a restricted context.
pub type Evaluator = Arc<dyn Fn(&Context<'_>) -> Result<ValueExpr> + Send + Sync>;

/// Box a closure as an [`Evaluator`].
pub(crate) fn evaluator<F>(f: F) -> Evaluator
where
    F: Fn(&Context<'_>) -> Result<ValueExpr> + Send + Sync + 'static,
{
    Arc::new(f)
}

// ============================================================================
// DelayedArgument
// ============================================================================

/// A computation deferred until its required properties are committed.
#[derive(Clone)]
pub struct DelayedArgument {
    required: BTreeSet<String>,
    evaluate: Evaluator,
    internal: bool,
}

impl DelayedArgument {
    pub fn new<F>(required: impl IntoIterator<Item = impl Into<String>>, evaluate: F) -> Self
    where
        F: Fn(&Context<'_>) -> Result<ValueExpr> + Send + Sync + 'static,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
            evaluate: Arc::new(evaluate),
            internal: false,
        }
    }

    /// Argument synthesized by the library itself (default expansion).
    pub(crate) fn internal(required: BTreeSet<String>, evaluate: Evaluator) -> Self {
        Self { required, evaluate, internal: true }
    }

    pub fn required_properties(&self) -> &BTreeSet<String> {
        &self.required
    }

    pub fn is_internal(&self) -> bool {
        self.internal
    }

    pub(crate) fn evaluator(&self) -> &Evaluator {
        &self.evaluate
    }

    pub fn evaluate(&self, ctx: &Context<'_>) -> Result<ValueExpr> {
        (self.evaluate)(ctx)
    }
}

impl fmt::Debug for DelayedArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelayedArgument")
            .field("required", &self.required)
            .field("internal", &self.internal)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ValueExpr
// ============================================================================

/// A proposed property value.
#[derive(Debug, Clone)]
pub enum ValueExpr {
    Concrete(Value),
    Distribution(Distribution),
    Delayed(DelayedArgument),
}

impl ValueExpr {
    pub fn concrete(v: impl Into<Value>) -> Self {
        ValueExpr::Concrete(v.into())
    }

    pub fn delayed<F>(required: impl IntoIterator<Item = impl Into<String>>, evaluate: F) -> Self
    where
        F: Fn(&Context<'_>) -> Result<ValueExpr> + Send + Sync + 'static,
    {
        ValueExpr::Delayed(DelayedArgument::new(required, evaluate))
    }

    /// Properties that must be committed before this value can be computed.
    pub fn required_properties(&self) -> BTreeSet<String> {
        match self {
            ValueExpr::Delayed(d) => d.required.clone(),
            ValueExpr::Concrete(_) | ValueExpr::Distribution(_) => BTreeSet::new(),
        }
    }

    pub fn needs_lazy_evaluation(&self) -> bool {
        matches!(self, ValueExpr::Delayed(_))
    }

    /// Commit form of this value; `None` while it is still lazy.
    pub fn into_resolved(self) -> Option<Resolved> {
        match self {
            ValueExpr::Concrete(v) => Some(Resolved::Concrete(v)),
            ValueExpr::Distribution(d) => Some(Resolved::Random(d)),
            ValueExpr::Delayed(_) => None,
        }
    }
}

impl PartialEq for ValueExpr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ValueExpr::Concrete(a), ValueExpr::Concrete(b)) => a == b,
            (ValueExpr::Distribution(a), ValueExpr::Distribution(b)) => a == b,
            (ValueExpr::Delayed(a), ValueExpr::Delayed(b)) => {
                Arc::ptr_eq(&a.evaluate, &b.evaluate) && a.required == b.required
            }
            _ => false,
        }
    }
}

impl From<Value> for ValueExpr {
    fn from(v: Value) -> Self { ValueExpr::Concrete(v) }
}

impl From<Distribution> for ValueExpr {
    fn from(d: Distribution) -> Self { ValueExpr::Distribution(d) }
}

impl From<DelayedArgument> for ValueExpr {
    fn from(d: DelayedArgument) -> Self { ValueExpr::Delayed(d) }
}

impl From<Resolved> for ValueExpr {
    fn from(r: Resolved) -> Self {
        match r {
            Resolved::Concrete(v) => ValueExpr::Concrete(v),
            Resolved::Random(d) => ValueExpr::Distribution(d),
        }
    }
}

impl fmt::Display for ValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueExpr::Concrete(v) => write!(f, "{v}"),
            ValueExpr::Distribution(d) => write!(f, "{d}"),
            ValueExpr::Delayed(d) => {
                let reqs: Vec<&str> = d.required.iter().map(String::as_str).collect();
                write!(f, "<delayed on {}>", reqs.join(", "))
            }
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// True iff `v` still needs lazy evaluation.
pub fn needs_lazy_evaluation(v: &ValueExpr) -> bool {
    v.needs_lazy_evaluation()
}

/// Evaluate `v` against the committed state of `entity`.
///
/// Delayed values see only their own required properties (plus `prior`);
/// every other value is returned unchanged. The caller guarantees that all
/// required properties are already committed.
pub fn value_in_context(
    v: &ValueExpr,
    entity: &Entity,
    prior: Option<&Resolved>,
) -> Result<ValueExpr> {
    match v {
        ValueExpr::Delayed(d) => {
            let ctx = Context::new(entity, &d.required, prior);
            d.evaluate(&ctx)
        }
        ValueExpr::Concrete(_) | ValueExpr::Distribution(_) => Ok(v.clone()),
    }
}
