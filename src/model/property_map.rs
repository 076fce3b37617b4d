//! PropertyMap — the committed key-value store on an entity.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Distribution, Value};

/// A committed property value: no longer lazy, possibly still random.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Resolved {
    Concrete(Value),
    Random(Distribution),
}

impl Resolved {
    /// The concrete value, if this property carries no randomness.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Resolved::Concrete(v) => Some(v),
            Resolved::Random(_) => None,
        }
    }

    pub fn is_random(&self) -> bool { matches!(self, Resolved::Random(_)) }

    pub fn type_name(&self) -> &'static str {
        match self {
            Resolved::Concrete(v) => v.type_name(),
            Resolved::Random(_) => "DISTRIBUTION",
        }
    }
}

impl From<Value> for Resolved {
    fn from(v: Value) -> Self { Resolved::Concrete(v) }
}

impl From<Distribution> for Resolved {
    fn from(d: Distribution) -> Self { Resolved::Random(d) }
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Concrete(v) => write!(f, "{v}"),
            Resolved::Random(d) => write!(f, "{d}"),
        }
    }
}

/// A map of property names to committed values, ordered by name.
pub type PropertyMap = BTreeMap<String, Resolved>;

