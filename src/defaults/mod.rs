//! # Property defaults
//!
//! A class may give each property one [`PropertyDefault`]: a fallback value
//! generator that only applies when nothing stronger specifies the property.
//! Defaults cascade down the class hierarchy:
//!
//! | Attribute  | Effect |
//! |------------|--------|
//! | (none)     | Replaces every ancestor default for the property |
//! | `additive` | Accumulates the whole ancestor chain, most specific first |
//! | `dynamic`  | Marks the property as changing during simulation |
//! | `final`    | Forbids overriding in subclasses and direct specification |

pub mod hierarchy;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::lazy::{evaluator, Context, DelayedArgument, Evaluator, ValueExpr};
use crate::model::Resolved;
use crate::normalize::tuple;
use crate::specifier::{Priority, Specifier};
use crate::{Error, Result};

pub use hierarchy::{ClassDef, ClassRegistry, DefaultChain};

// ============================================================================
// Attribute tags
// ============================================================================

/// Tag attached to a property default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Additive,
    Dynamic,
    Final,
}

impl FromStr for Attribute {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "additive" => Ok(Attribute::Additive),
            "dynamic" => Ok(Attribute::Dynamic),
            "final" => Ok(Attribute::Final),
            other => Err(Error::UnknownAttributeTag(other.to_owned())),
        }
    }
}

// ============================================================================
// PropertyDefault
// ============================================================================

/// A default value, possibly with dependencies.
#[derive(Clone)]
pub struct PropertyDefault {
    required: BTreeSet<String>,
    value: Evaluator,
    is_additive: bool,
    is_dynamic: bool,
    is_final: bool,
}

impl PropertyDefault {
    /// Create a default from attribute tags and a value function.
    ///
    /// Repeated tags are accepted; unknown ones fail with
    /// [`Error::UnknownAttributeTag`].
    pub fn new<F>(
        required: impl IntoIterator<Item = impl Into<String>>,
        attributes: impl IntoIterator<Item = impl AsRef<str>>,
        value: F,
    ) -> Result<Self>
    where
        F: Fn(&Context<'_>) -> Result<ValueExpr> + Send + Sync + 'static,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
            value: Arc::new(value),
            is_additive: false,
            is_dynamic: false,
            is_final: false,
        }
        .with_attributes(attributes)
    }

    /// A default with no attributes that always proposes `value`.
    ///
    /// A delayed `value` keeps its required properties.
    pub fn for_value(value: impl Into<ValueExpr>) -> Self {
        match value.into() {
            ValueExpr::Delayed(d) => Self {
                required: d.required_properties().clone(),
                value: d.evaluator().clone(),
                is_additive: false,
                is_dynamic: false,
                is_final: false,
            },
            fixed => Self {
                required: BTreeSet::new(),
                value: evaluator(move |_| Ok(fixed.clone())),
                is_additive: false,
                is_dynamic: false,
                is_final: false,
            },
        }
    }

    /// Same default with the given attribute tags added.
    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = impl AsRef<str>>) -> Result<Self> {
        for attr in attributes {
            match attr.as_ref().parse::<Attribute>()? {
                Attribute::Additive => self.is_additive = true,
                Attribute::Dynamic => self.is_dynamic = true,
                Attribute::Final => self.is_final = true,
            }
        }
        Ok(self)
    }

    pub fn required_properties(&self) -> &BTreeSet<String> { &self.required }
    pub fn is_additive(&self) -> bool { self.is_additive }
    pub fn is_dynamic(&self) -> bool { self.is_dynamic }
    pub fn is_final(&self) -> bool { self.is_final }

    /// Create a Specifier for `prop` from this default and the defaults it
    /// overrides (nearest ancestor first).
    pub fn resolve_for(&self, prop: &str, overridden: &[PropertyDefault]) -> Result<Specifier> {
        if overridden.iter().any(PropertyDefault::is_final) {
            return Err(Error::FinalOverride { property: prop.to_owned() });
        }

        let value = if self.is_additive {
            let mut all_reqs = self.required.clone();
            for other in overridden {
                all_reqs.extend(other.required.iter().cloned());
            }

            let chain: Vec<Evaluator> = std::iter::once(self.value.clone())
                .chain(overridden.iter().map(|d| d.value.clone()))
                .collect();
            let prop_name = prop.to_owned();
            let concatenator = evaluator(move |ctx| {
                let mut parts = Vec::with_capacity(chain.len());
                for eval in &chain {
                    match eval(ctx)? {
                        ValueExpr::Concrete(v) => parts.push(Resolved::Concrete(v)),
                        ValueExpr::Distribution(d) => parts.push(Resolved::Random(d)),
                        delayed @ ValueExpr::Delayed(_) => {
                            return Err(Error::TypeError {
                                expected: format!("non-lazy contribution to additive '{prop_name}'"),
                                got: delayed.to_string(),
                            });
                        }
                    }
                }
                Ok(tuple(parts))
            });
            DelayedArgument::internal(all_reqs, concatenator)
        } else {
            DelayedArgument::internal(self.required.clone(), self.value.clone())
        };

        Specifier::new(
            "PropertyDefault",
            BTreeMap::from([(prop.to_owned(), Priority::DEFAULT)]),
            BTreeMap::from([(prop.to_owned(), ValueExpr::Delayed(value))]),
            BTreeSet::new(),
            BTreeSet::new(),
        )
    }
}

impl fmt::Debug for PropertyDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDefault")
            .field("required", &self.required)
            .field("additive", &self.is_additive)
            .field("dynamic", &self.is_dynamic)
            .field("final", &self.is_final)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Distribution, Entity, EntityId, Value};
    use crate::normalize::CanonicalNormalizer;

    fn constant(v: i64, attrs: &[&str]) -> PropertyDefault {
        PropertyDefault::for_value(Value::from(v)).with_attributes(attrs).unwrap()
    }

    fn resolve(spec: &Specifier, prop: &str) -> Entity {
        let mut e = Entity::new(EntityId(1), "Test");
        spec.apply_to(&mut e, &[prop], false, &CanonicalNormalizer).unwrap();
        e
    }

    #[test]
    fn test_attribute_parsing() {
        let d = PropertyDefault::new(Vec::<String>::new(), ["additive", "dynamic", "additive"], |_| {
            Ok(ValueExpr::concrete(1))
        })
        .unwrap();
        assert!(d.is_additive());
        assert!(d.is_dynamic());
        assert!(!d.is_final());
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let err = PropertyDefault::new(Vec::<String>::new(), ["additive", "baloney_attr"], |_| {
            Ok(ValueExpr::concrete(1))
        })
        .unwrap_err();
        assert!(matches!(err, Error::UnknownAttributeTag(ref t) if t == "baloney_attr"));
    }

    #[test]
    fn test_replacing_shadows_ancestors() {
        let child = constant(7, &[]);
        let parent = constant(-12, &[]);
        let spec = child.resolve_for("flubber", &[parent]).unwrap();
        assert_eq!(spec.priority("flubber"), Some(Priority::DEFAULT));
        assert_eq!(resolve(&spec, "flubber").value("flubber"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_additive_accumulates_chain() {
        let child = constant(2, &["additive"]);
        let parent = constant(1, &["additive"]);
        let spec = child.resolve_for("foo", &[parent]).unwrap();
        assert_eq!(
            resolve(&spec, "foo").value("foo"),
            Some(&Value::List(vec![Value::Int(2), Value::Int(1)]))
        );
    }

    #[test]
    fn test_additive_keeps_random_parts() {
        let child = PropertyDefault::for_value(Distribution::range(0.0, 1.0))
            .with_attributes(["additive"])
            .unwrap();
        let parent = constant(1, &["additive"]);
        let spec = child.resolve_for("p", &[parent]).unwrap();
        assert_eq!(
            resolve(&spec, "p").get("p"),
            Some(&Resolved::Random(Distribution::Tuple(vec![
                Distribution::range(0.0, 1.0).into(),
                Value::Int(1).into(),
            ])))
        );
    }

    #[test]
    fn test_additive_unions_requirements() {
        let child = PropertyDefault::new(["width"], ["additive"], |_| Ok(ValueExpr::concrete(1))).unwrap();
        let parent = PropertyDefault::new(["length"], ["additive"], |_| Ok(ValueExpr::concrete(2))).unwrap();
        let spec = child.resolve_for("tags", &[parent]).unwrap();
        let reqs: Vec<&str> = spec.required_properties().iter().map(String::as_str).collect();
        assert_eq!(reqs, vec!["length", "width"]);
    }

    #[test]
    fn test_final_ancestor_forbids_override() {
        let child = constant(2, &[]);
        let parent = constant(1, &["final"]);
        let err = child.resolve_for("one", &[parent]).unwrap_err();
        assert!(matches!(err, Error::FinalOverride { ref property } if property == "one"));
        assert!(err.to_string().contains("property cannot be overridden"));
    }

    #[test]
    fn test_final_is_transitive() {
        let leaf = constant(3, &[]);
        let mid = constant(2, &[]);
        let root = constant(1, &["final"]);
        assert!(leaf.resolve_for("one", &[mid, root]).is_err());
    }

    #[test]
    fn test_final_without_override_is_fine() {
        let d = constant(1, &["final"]);
        assert!(d.resolve_for("one", &[]).is_ok());
    }

    #[test]
    fn test_default_cannot_depend_on_itself() {
        let d = PropertyDefault::new(["width"], Vec::<String>::new(), |_| Ok(ValueExpr::concrete(1))).unwrap();
        assert!(matches!(d.resolve_for("width", &[]), Err(Error::SelfDependency { .. })));
    }
}
