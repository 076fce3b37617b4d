//! Entity — a scenario object whose properties are being resolved.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{PropertyMap, Resolved, Value};
use crate::{Error, Result};

/// Opaque entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scenario object owning an exclusive property map.
///
/// Each property moves from unset to committed exactly once, unless the
/// write is explicitly flagged as overriding. Once resolution succeeds the
/// entity is frozen and rejects every further write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub class: String,
    properties: PropertyMap,
    /// Properties that may change while a simulation runs.
    dynamic: BTreeSet<String>,
    resolved: bool,
}

impl Entity {
    pub fn new(id: EntityId, class: impl Into<String>) -> Self {
        Self {
            id,
            class: class.into(),
            properties: PropertyMap::new(),
            dynamic: BTreeSet::new(),
            resolved: false,
        }
    }

    pub fn with_dynamic(mut self, props: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.dynamic = props.into_iter().map(Into::into).collect();
        self
    }

    /// Commit a value for `name`.
    ///
    /// The first write always succeeds. A second write succeeds only when
    /// `overriding` is set; otherwise it is a writer-ordering violation.
    pub fn mutate_property(
        &mut self,
        name: &str,
        value: Resolved,
        overriding: bool,
    ) -> Result<()> {
        if self.resolved {
            return Err(Error::EntityFrozen(self.id));
        }
        if !overriding && self.properties.contains_key(name) {
            return Err(Error::AlreadySpecified(name.to_owned()));
        }
        self.properties.insert(name.to_owned(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Resolved> {
        self.properties.get(name)
    }

    /// The concrete value of `name`, if it is committed and not random.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Resolved::as_value)
    }

    pub fn has(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn is_dynamic(&self, name: &str) -> bool {
        self.dynamic.contains(name)
    }

    pub fn dynamic_properties(&self) -> &BTreeSet<String> {
        &self.dynamic
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub(crate) fn freeze(&mut self) {
        self.resolved = true;
    }
}
