//! Symbolic random values.
//!
//! A `Distribution` is never sampled here. The engine only normalizes it
//! (see [`crate::normalize`]) and commits it; a downstream sampler draws
//! the actual value.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Resolved, Value};

/// A random value awaiting sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params")]
pub enum Distribution {
    /// A "random" value that can only take one value.
    Constant(Value),
    /// Uniform over the closed interval `[low, high]`.
    Range { low: f64, high: f64 },
    /// Gaussian with the given mean and standard deviation.
    Normal { mean: f64, stddev: f64 },
    /// Uniform choice among discrete options.
    Options(Vec<Value>),
    /// A sequence with at least one random element, sampled element-wise.
    Tuple(Vec<Resolved>),
}

impl Distribution {
    pub fn range(low: f64, high: f64) -> Self {
        Distribution::Range { low, high }
    }

    pub fn normal(mean: f64, stddev: f64) -> Self {
        Distribution::Normal { mean, stddev }
    }

    pub fn options<T: Into<Value>>(options: impl IntoIterator<Item = T>) -> Self {
        Distribution::Options(options.into_iter().map(Into::into).collect())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Distribution::Constant(_) => "Constant",
            Distribution::Range { .. } => "Range",
            Distribution::Normal { .. } => "Normal",
            Distribution::Options(_) => "Options",
            Distribution::Tuple(_) => "Tuple",
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::Constant(v) => write!(f, "Constant({v})"),
            Distribution::Range { low, high } => write!(f, "Range({low}, {high})"),
            Distribution::Normal { mean, stddev } => write!(f, "Normal({mean}, {stddev})"),
            Distribution::Options(opts) => {
                write!(f, "Options(")?;
                for (i, v) in opts.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{v}")?;
                }
                write!(f, ")")
            }
            Distribution::Tuple(parts) => {
                write!(f, "Tuple(")?;
                for (i, v) in parts.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{v}")?;
                }
                write!(f, ")")
            }
        }
    }
}
