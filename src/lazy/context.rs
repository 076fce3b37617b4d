//! Evaluation context handed to delayed computations.

use std::collections::BTreeSet;

use crate::model::{Entity, Resolved, Value};
use crate::{Error, Result};

/// Read-only view of an entity, restricted to a declared set of properties.
///
/// A delayed computation sees only what it declared as required. For a
/// modifying specifier the context also carries the value committed by the
/// specifier it modifies.
pub struct Context<'a> {
    entity: &'a Entity,
    allowed: &'a BTreeSet<String>,
    prior: Option<&'a Resolved>,
}

impl<'a> Context<'a> {
    pub fn new(
        entity: &'a Entity,
        allowed: &'a BTreeSet<String>,
        prior: Option<&'a Resolved>,
    ) -> Self {
        Self { entity, allowed, prior }
    }

    /// The committed value of a required property.
    pub fn get(&self, name: &str) -> Result<&'a Resolved> {
        if !self.allowed.contains(name) {
            return Err(Error::UndeclaredDependency(name.to_owned()));
        }
        // The engine orders evaluation so this never fires on valid input.
        self.entity
            .get(name)
            .ok_or_else(|| Error::Incomplete(name.to_owned()))
    }

    /// The concrete value of a required property.
    pub fn value(&self, name: &str) -> Result<&'a Value> {
        match self.get(name)? {
            Resolved::Concrete(v) => Ok(v),
            Resolved::Random(d) => Err(Error::TypeError {
                expected: format!("concrete value for '{name}'"),
                got: format!("distribution {}", d.kind()),
            }),
        }
    }

    /// Value committed by the specifier being modified, if any.
    pub fn prior(&self) -> Option<&'a Resolved> {
        self.prior
    }

    pub fn prior_value(&self) -> Option<&'a Value> {
        self.prior.and_then(Resolved::as_value)
    }

    pub fn entity_class(&self) -> &'a str {
        &self.entity.class
    }
}
