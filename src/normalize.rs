//! Distribution normalization — the seam to the random-value layer.
//!
//! The engine calls a [`Normalizer`] on every evaluated value right before
//! checking that it is no longer lazy. Normalizers never sample; they only
//! canonicalize.

use crate::lazy::ValueExpr;
use crate::model::{Distribution, Resolved, Value};
use crate::{Error, Result};

/// Collapses symbolic random values to canonical form.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, expr: ValueExpr) -> Result<ValueExpr>;
}

/// Default normalizer.
///
/// - Degenerate distributions (constant, single option, zero-width range,
///   zero-stddev normal) become concrete values.
/// - Tuples normalize element-wise and become lists once nothing random
///   is left.
/// - Invalid parameters are rejected.
/// - Concrete and delayed values pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalNormalizer;

impl Normalizer for CanonicalNormalizer {
    fn normalize(&self, expr: ValueExpr) -> Result<ValueExpr> {
        match expr {
            ValueExpr::Distribution(d) => canonicalize(d),
            other => Ok(other),
        }
    }
}

fn canonicalize(dist: Distribution) -> Result<ValueExpr> {
    match dist {
        Distribution::Constant(v) => Ok(ValueExpr::Concrete(v)),
        Distribution::Range { low, high } => {
            if !low.is_finite() || !high.is_finite() {
                return Err(Error::InvalidDistribution(format!("Range({low}, {high}) has a non-finite bound")));
            }
            if low > high {
                return Err(Error::InvalidDistribution(format!("Range({low}, {high}) is empty")));
            }
            if low == high {
                Ok(ValueExpr::Concrete(Value::Float(low)))
            } else {
                Ok(ValueExpr::Distribution(Distribution::Range { low, high }))
            }
        }
        Distribution::Normal { mean, stddev } => {
            if !mean.is_finite() || !stddev.is_finite() || stddev < 0.0 {
                return Err(Error::InvalidDistribution(format!("Normal({mean}, {stddev})")));
            }
            if stddev == 0.0 {
                Ok(ValueExpr::Concrete(Value::Float(mean)))
            } else {
                Ok(ValueExpr::Distribution(Distribution::Normal { mean, stddev }))
            }
        }
        Distribution::Options(mut opts) => match opts.len() {
            0 => Err(Error::InvalidDistribution("Options() has no options".into())),
            1 => Ok(ValueExpr::Concrete(opts.remove(0))),
            _ => Ok(ValueExpr::Distribution(Distribution::Options(opts))),
        },
        Distribution::Tuple(parts) => {
            let parts = parts
                .into_iter()
                .map(|part| match part {
                    Resolved::Concrete(v) => Ok(Resolved::Concrete(v)),
                    Resolved::Random(d) => canonicalize(d)?
                        .into_resolved()
                        .ok_or_else(|| Error::InvalidDistribution("Tuple element is lazy".into())),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(tuple(parts))
        }
    }
}

/// A list when every part is concrete, otherwise a tuple distribution.
pub(crate) fn tuple(parts: Vec<Resolved>) -> ValueExpr {
    if parts.iter().any(Resolved::is_random) {
        return ValueExpr::Distribution(Distribution::Tuple(parts));
    }
    let values = parts
        .into_iter()
        .filter_map(|part| match part {
            Resolved::Concrete(v) => Some(v),
            Resolved::Random(_) => None,
        })
        .collect();
    ValueExpr::Concrete(Value::List(values))
}
