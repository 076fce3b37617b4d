//! Class registry — the class-hierarchy collaborator.
//!
//! Ancestor-default chains are computed once, when a class is defined, so
//! resolution never walks the hierarchy. The chains are re-expanded into
//! fresh specifiers on every resolution.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::debug;

use super::PropertyDefault;
use crate::specifier::Specifier;
use crate::{Error, Result};

/// Defaults for one property, most specific first.
pub type DefaultChain = SmallVec<[PropertyDefault; 4]>;

// ============================================================================
// ClassDef
// ============================================================================

/// A class definition as produced by the front end.
#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: String,
    pub parent: Option<String>,
    pub defaults: BTreeMap<String, PropertyDefault>,
    /// Specifiers declared in the class body (class-body priority).
    pub body: Vec<Specifier>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            defaults: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Give `prop` a default. A later call for the same property replaces it.
    pub fn with_default(mut self, prop: impl Into<String>, default: PropertyDefault) -> Self {
        self.defaults.insert(prop.into(), default);
        self
    }

    pub fn with_specifier(mut self, spec: Specifier) -> Self {
        self.body.push(spec);
        self
    }
}

// ============================================================================
// ClassRegistry
// ============================================================================

struct ClassInfo {
    def: ClassDef,
    /// This class first, root last.
    ancestry: Vec<String>,
    chains: BTreeMap<String, DefaultChain>,
}

/// Registry of class definitions, shared across resolutions.
///
/// Definitions and reads may interleave from multiple threads; a defined
/// class is never mutated again.
#[derive(Default)]
pub struct ClassRegistry {
    classes: RwLock<HashMap<String, Arc<ClassInfo>>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class. Its parent must already be defined.
    ///
    /// Final-override violations are reported when the defaults are expanded;
    /// call [`ClassRegistry::validate`] to surface them eagerly.
    pub fn define(&self, def: ClassDef) -> Result<()> {
        let mut classes = self.classes.write();
        if classes.contains_key(&def.name) {
            return Err(Error::ClassRedefinition(def.name));
        }

        let (mut ancestry, mut chains) = match &def.parent {
            Some(parent) => {
                let info = classes
                    .get(parent)
                    .ok_or_else(|| Error::UnknownClass(parent.clone()))?;
                (info.ancestry.clone(), info.chains.clone())
            }
            None => (Vec::new(), BTreeMap::new()),
        };
        ancestry.insert(0, def.name.clone());

        for (prop, default) in &def.defaults {
            let mut chain = DefaultChain::new();
            chain.push(default.clone());
            if let Some(inherited) = chains.get(prop) {
                chain.extend(inherited.iter().cloned());
            }
            chains.insert(prop.clone(), chain);
        }

        debug!(class = %def.name, parent = ?def.parent, properties = chains.len(), "class defined");
        classes.insert(def.name.clone(), Arc::new(ClassInfo { def, ancestry, chains }));
        Ok(())
    }

    fn info(&self, class: &str) -> Result<Arc<ClassInfo>> {
        self.classes
            .read()
            .get(class)
            .cloned()
            .ok_or_else(|| Error::UnknownClass(class.to_owned()))
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.read().contains_key(class)
    }

    /// `class` followed by its ancestors, root last.
    pub fn ancestry(&self, class: &str) -> Result<Vec<String>> {
        Ok(self.info(class)?.ancestry.clone())
    }

    pub fn is_subclass(&self, class: &str, ancestor: &str) -> Result<bool> {
        Ok(self.info(class)?.ancestry.iter().any(|c| c == ancestor))
    }

    /// Ordered ancestor-default chain for `prop`, most specific first.
    /// Empty when no class in the hierarchy defaults the property.
    pub fn default_chain(&self, class: &str, prop: &str) -> Result<DefaultChain> {
        Ok(self.info(class)?.chains.get(prop).cloned().unwrap_or_default())
    }

    /// Properties that some class in the hierarchy defaults.
    pub fn default_properties(&self, class: &str) -> Result<BTreeSet<String>> {
        Ok(self.info(class)?.chains.keys().cloned().collect())
    }

    /// Properties locked by a final default anywhere in the hierarchy.
    pub fn final_properties(&self, class: &str) -> Result<BTreeSet<String>> {
        self.properties_where(class, PropertyDefault::is_final)
    }

    /// Properties whose nearest default is marked dynamic.
    pub fn dynamic_properties(&self, class: &str) -> Result<BTreeSet<String>> {
        let info = self.info(class)?;
        Ok(info
            .chains
            .iter()
            .filter(|(_, chain)| chain.first().is_some_and(PropertyDefault::is_dynamic))
            .map(|(prop, _)| prop.clone())
            .collect())
    }

    fn properties_where(
        &self,
        class: &str,
        pred: impl Fn(&PropertyDefault) -> bool,
    ) -> Result<BTreeSet<String>> {
        let info = self.info(class)?;
        Ok(info
            .chains
            .iter()
            .filter(|(_, chain)| chain.iter().any(&pred))
            .map(|(prop, _)| prop.clone())
            .collect())
    }

    /// Expand every default of `class` into a fresh specifier.
    pub fn default_specifiers(&self, class: &str) -> Result<Vec<Specifier>> {
        let info = self.info(class)?;
        info.chains
            .iter()
            .filter_map(|(prop, chain)| chain.split_first().map(|(head, rest)| (prop, head, rest)))
            .map(|(prop, head, rest)| head.resolve_for(prop, rest))
            .collect()
    }

    /// Class-body specifiers, root class first.
    pub fn body_specifiers(&self, class: &str) -> Result<Vec<Specifier>> {
        let info = self.info(class)?;
        let classes = self.classes.read();
        let mut specs = Vec::new();
        for name in info.ancestry.iter().rev() {
            if let Some(ancestor) = classes.get(name) {
                specs.extend(ancestor.def.body.iter().cloned());
            }
        }
        Ok(specs)
    }

    /// Expand all defaults once, surfacing final-override errors early.
    pub fn validate(&self, class: &str) -> Result<()> {
        self.default_specifiers(class).map(|_| ())
    }
}

impl std::fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let classes = self.classes.read();
        let mut names: Vec<&String> = classes.keys().collect();
        names.sort();
        f.debug_struct("ClassRegistry").field("classes", &names).finish()
    }
}
