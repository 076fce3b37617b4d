//! Resolution engine.
//!
//! Turns an ordered set of specifiers into one committed value per property:
//!
//! ```text
//! specifiers ──▶ conflict resolution ──▶ final enforcement
//!            ──▶ dependency graph (cycle check) ──▶ topological evaluation
//!            ──▶ commit (all-or-nothing)
//! ```
//!
//! Work happens on a staged copy of the entity; the caller's entity is only
//! replaced once every property is committed.

mod conflict;
mod graph;

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::model::Entity;
use crate::normalize::Normalizer;
use crate::specifier::Specifier;
use crate::{Error, Result};

use conflict::resolve_conflicts;
use graph::DependencyGraph;

/// Everything that competes for an entity's properties.
#[derive(Debug, Clone, Default)]
pub struct SpecifierSet {
    /// Most specific first: instance, class body (root to leaf), defaults.
    pub specifiers: Vec<Specifier>,
    /// Properties locked by a final default somewhere in the class chain.
    pub final_properties: BTreeSet<String>,
}

impl SpecifierSet {
    pub fn new(specifiers: Vec<Specifier>) -> Self {
        Self { specifiers, final_properties: BTreeSet::new() }
    }

    pub fn with_final(mut self, props: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.final_properties.extend(props.into_iter().map(Into::into));
        self
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Properties in the order they were committed.
    pub order: Vec<String>,
    /// Properties whose base value was recomputed by a modifying specifier.
    pub modified: Vec<String>,
}

/// Resolve every property `set` declares onto `entity`.
///
/// On error the entity is left exactly as it was.
pub fn resolve<N: Normalizer + ?Sized>(
    entity: &mut Entity,
    set: SpecifierSet,
    normalizer: &N,
    config: &EngineConfig,
) -> Result<Resolution> {
    if entity.is_resolved() {
        return Err(Error::EntityFrozen(entity.id));
    }
    let SpecifierSet { specifiers, final_properties } = set;
    debug!(entity = %entity.id, class = %entity.class, specifiers = specifiers.len(), "resolving");

    // 1. Conflict resolution
    let winners = resolve_conflicts(&specifiers)?;
    if winners.len() > config.max_properties {
        return Err(Error::TooManyProperties {
            count: winners.len(),
            limit: config.max_properties,
        });
    }

    // 2. Final enforcement
    for prop in &final_properties {
        if let Some(spec) = specifiers
            .iter()
            .find(|s| s.priority(prop).is_some_and(|p| !p.is_default()))
        {
            return Err(Error::FinalSpecification {
                property: prop.clone(),
                specifier: spec.name().to_owned(),
            });
        }
    }

    // 3. Dependency graph
    let graph = DependencyGraph::build(&specifiers, &winners)?;
    graph.check_acyclic()?;

    // 4. Topological evaluation
    let order = graph.evaluation_order()?;
    let mut staged = entity.clone();
    let mut modified = Vec::new();
    for prop in &order {
        let winner = winners.get(prop).ok_or_else(|| Error::Incomplete(prop.clone()))?;
        let base = &specifiers[winner.base];
        trace!(property = %prop, specifier = base.name(), "evaluate");
        base.apply_to(&mut staged, &[prop.as_str()], false, normalizer)?;

        if let Some(m) = winner.modifier {
            let modifier = &specifiers[m];
            trace!(property = %prop, specifier = modifier.name(), "modify");
            modifier.apply_to(&mut staged, &[prop.as_str()], true, normalizer)?;
            modified.push(prop.clone());
        }
    }

    // 5. Completion
    if let Some(missing) = winners.keys().find(|p| !staged.has(p)) {
        return Err(Error::Incomplete(missing.clone()));
    }
    if config.freeze_resolved {
        staged.freeze();
    }
    *entity = staged;

    debug!(entity = %entity.id, properties = graph.len(), "resolved");
    Ok(Resolution { order, modified })
}
