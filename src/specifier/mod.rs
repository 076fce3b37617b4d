//! Specifiers — named bundles proposing values for a set of properties.
//!
//! A specifier maps each property it supplies to a [`Priority`] and a
//! [`ValueExpr`], and declares the properties it reads. A *modifying*
//! specifier additionally lists properties whose previously committed value
//! it combines with instead of replacing.

pub mod priority;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::trace;

use crate::lazy::{value_in_context, ValueExpr};
use crate::model::Entity;
use crate::normalize::Normalizer;
use crate::{Error, Result};

pub use priority::{Priority, PriorityLevel};

/// Specifier providing values for properties, at various priorities, given
/// dependencies.
#[derive(Debug, Clone)]
pub struct Specifier {
    name: String,
    priorities: BTreeMap<String, Priority>,
    values: BTreeMap<String, ValueExpr>,
    required: BTreeSet<String>,
    modifiable: BTreeSet<String>,
}

impl Specifier {
    /// Build a specifier, validating its shape.
    ///
    /// The required set is `deps` plus everything the delayed values read.
    /// Fails with [`Error::SelfDependency`] if a supplied property is also
    /// required.
    pub fn new(
        name: impl Into<String>,
        priorities: BTreeMap<String, Priority>,
        values: BTreeMap<String, ValueExpr>,
        deps: BTreeSet<String>,
        modifiable: BTreeSet<String>,
    ) -> Result<Self> {
        let name = name.into();

        if let Some(prop) = priorities.keys().find(|p| !values.contains_key(*p)) {
            return Err(Error::MalformedSpecifier(format!(
                "'{name}' gives a priority for '{prop}' but no value"
            )));
        }
        if let Some(prop) = values.keys().find(|p| !priorities.contains_key(*p)) {
            return Err(Error::MalformedSpecifier(format!(
                "'{name}' gives a value for '{prop}' but no priority"
            )));
        }
        if let Some(prop) = modifiable.iter().find(|p| !priorities.contains_key(*p)) {
            return Err(Error::MalformedSpecifier(format!(
                "'{name}' can only modify properties it specifies, not '{prop}'"
            )));
        }

        let mut required = deps;
        for v in values.values() {
            required.extend(v.required_properties());
        }

        if let Some(prop) = priorities.keys().find(|p| required.contains(*p)) {
            return Err(Error::SelfDependency {
                specifier: name,
                property: prop.clone(),
            });
        }

        Ok(Self { name, priorities, values, required, modifiable })
    }

    pub fn builder(name: impl Into<String>) -> SpecifierBuilder {
        SpecifierBuilder {
            name: name.into(),
            priorities: BTreeMap::new(),
            values: BTreeMap::new(),
            deps: BTreeSet::new(),
            modifiable: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priorities(&self) -> &BTreeMap<String, Priority> {
        &self.priorities
    }

    pub fn priority(&self, prop: &str) -> Option<Priority> {
        self.priorities.get(prop).copied()
    }

    pub fn value(&self, prop: &str) -> Option<&ValueExpr> {
        self.values.get(prop)
    }

    /// Properties supplied by this specifier, in name order.
    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.priorities.keys().map(String::as_str)
    }

    pub fn required_properties(&self) -> &BTreeSet<String> {
        &self.required
    }

    pub fn modifiable_properties(&self) -> &BTreeSet<String> {
        &self.modifiable
    }

    pub fn is_modifying(&self) -> bool {
        !self.modifiable.is_empty()
    }

    /// Whether this specifier combines with a prior value for `prop`.
    pub fn modifies(&self, prop: &str) -> bool {
        self.modifiable.contains(prop)
    }

    /// Evaluate, normalize and commit each of `properties` onto `entity`.
    ///
    /// Every required property must already be committed. Non-overriding
    /// writes to an already committed property fail with
    /// [`Error::AlreadySpecified`].
    pub fn apply_to<N: Normalizer + ?Sized>(
        &self,
        entity: &mut Entity,
        properties: &[&str],
        overriding: bool,
        normalizer: &N,
    ) -> Result<()> {
        for &prop in properties {
            let expr = self.values.get(prop).ok_or_else(|| {
                Error::NotFound(format!("property '{prop}' in specifier '{}'", self.name))
            })?;

            let prior = if self.modifies(prop) { entity.get(prop).cloned() } else { None };
            let evaluated = value_in_context(expr, entity, prior.as_ref())?;
            let normalized = normalizer.normalize(evaluated)?;
            let resolved = normalized
                .into_resolved()
                .ok_or_else(|| Error::StillLazy(prop.to_owned()))?;

            trace!(specifier = %self.name, property = prop, value = %resolved, overriding, "commit");
            entity.mutate_property(prop, resolved, overriding)?;
        }
        Ok(())
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} Specifier for {{", self.name)?;
        for (i, (prop, prio)) in self.priorities.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            write!(f, "{prop}: {prio}")?;
        }
        write!(f, "}}>")
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Incremental construction of a [`Specifier`].
///
/// ```
/// use specifier::{Priority, Specifier, ValueExpr};
///
/// let with_width = Specifier::builder("with width")
///     .property("width", Priority::INSTANCE, ValueExpr::concrete(4))
///     .build()
///     .unwrap();
/// assert_eq!(with_width.priority("width"), Some(Priority::INSTANCE));
/// ```
#[derive(Debug)]
pub struct SpecifierBuilder {
    name: String,
    priorities: BTreeMap<String, Priority>,
    values: BTreeMap<String, ValueExpr>,
    deps: BTreeSet<String>,
    modifiable: BTreeSet<String>,
}

impl SpecifierBuilder {
    pub fn property(
        mut self,
        prop: impl Into<String>,
        priority: Priority,
        value: impl Into<ValueExpr>,
    ) -> Self {
        let prop = prop.into();
        self.priorities.insert(prop.clone(), priority);
        self.values.insert(prop, value.into());
        self
    }

    /// Supply `prop` and combine with whatever was committed for it before.
    pub fn modifying(
        mut self,
        prop: impl Into<String>,
        priority: Priority,
        value: impl Into<ValueExpr>,
    ) -> Self {
        let prop = prop.into();
        self.modifiable.insert(prop.clone());
        self.property(prop, priority, value)
    }

    pub fn depends_on(mut self, prop: impl Into<String>) -> Self {
        self.deps.insert(prop.into());
        self
    }

    pub fn build(self) -> Result<Specifier> {
        Specifier::new(self.name, self.priorities, self.values, self.deps, self.modifiable)
    }
}
