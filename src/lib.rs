//! # specifier-rs — Property Specification Resolution
//!
//! Computes one committed value per property of a scenario object from a
//! stack of competing, prioritized, dependency-bearing proposals.
//!
//! ## Design Principles
//!
//! 1. **Closed value kinds**: `ValueExpr` is `Concrete | Distribution | Delayed`,
//!    matched exhaustively, never probed
//! 2. **Declared dependencies**: every lazy value names what it reads, so the
//!    dependency graph is built without running anything
//! 3. **Precomputed hierarchy**: ancestor-default chains are fixed at class
//!    definition time
//! 4. **All-or-nothing**: a failed resolution exposes no partial state
//!
//! ## Quick Start
//!
//! ```rust
//! use specifier::{ClassDef, ClassRegistry, PropertyDefault, Resolver, Value};
//!
//! # fn example() -> specifier::Result<()> {
//! let registry = ClassRegistry::new();
//! registry.define(
//!     ClassDef::new("Foo").with_default("flubber", PropertyDefault::for_value(Value::from(-12))),
//! )?;
//! registry.define(
//!     ClassDef::new("Bar")
//!         .extends("Foo")
//!         .with_default("flubber", PropertyDefault::for_value(Value::from(7))),
//! )?;
//!
//! let resolver = Resolver::new(registry);
//! let bar = resolver.instantiate("Bar", Vec::new())?;
//! assert_eq!(bar.value("flubber"), Some(&Value::Int(7)));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Priority Levels
//!
//! | Level | Source | Beats |
//! |-------|--------|-------|
//! | `Instance` | `new Foo with x 3` | everything |
//! | `ClassBody` | specifiers inside a class body | defaults |
//! | `Default` | expanded `PropertyDefault` | nothing |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod lazy;
pub mod normalize;
pub mod specifier;
pub mod defaults;
pub mod engine;
pub mod config;
pub mod export;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{Distribution, Entity, EntityId, PropertyMap, Resolved, Value};

// ============================================================================
// Re-exports: Lazy values and specifiers
// ============================================================================

pub use lazy::{needs_lazy_evaluation, value_in_context, Context, DelayedArgument, ValueExpr};
pub use specifier::{Priority, PriorityLevel, Specifier, SpecifierBuilder};
pub use defaults::{Attribute, ClassDef, ClassRegistry, DefaultChain, PropertyDefault};

// ============================================================================
// Re-exports: Engine
// ============================================================================

pub use config::EngineConfig;
pub use engine::{Resolution, SpecifierSet};
pub use normalize::{CanonicalNormalizer, Normalizer};

// ============================================================================
// Top-level Resolver handle
// ============================================================================

/// The primary entry point. A `Resolver` wraps a class registry and a
/// normalizer and turns class instantiations into resolved entities.
///
/// Cheap to share across threads: each call builds its own entity and
/// specifier set.
pub struct Resolver<N: Normalizer = CanonicalNormalizer> {
    registry: Arc<ClassRegistry>,
    normalizer: N,
    config: EngineConfig,
    next_entity_id: AtomicU64,
}

impl Resolver<CanonicalNormalizer> {
    /// Resolver with the canonical normalizer and default configuration.
    pub fn new(registry: impl Into<Arc<ClassRegistry>>) -> Self {
        Self::with_normalizer(registry, CanonicalNormalizer)
    }
}

impl<N: Normalizer> Resolver<N> {
    pub fn with_normalizer(registry: impl Into<Arc<ClassRegistry>>, normalizer: N) -> Self {
        Self {
            registry: registry.into(),
            normalizer,
            config: EngineConfig::default(),
            next_entity_id: AtomicU64::new(1),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Instantiate `class`, applying `instance` specifiers on top of the
    /// class body and the expanded defaults.
    pub fn instantiate(&self, class: &str, instance: Vec<Specifier>) -> Result<Entity> {
        let mut specifiers = instance;
        specifiers.extend(self.registry.body_specifiers(class)?);
        specifiers.extend(self.registry.default_specifiers(class)?);

        let set = SpecifierSet {
            specifiers,
            final_properties: self.registry.final_properties(class)?,
        };

        let id = EntityId(self.next_entity_id.fetch_add(1, Ordering::Relaxed));
        let mut entity = Entity::new(id, class).with_dynamic(self.registry.dynamic_properties(class)?);
        self.resolve(&mut entity, set)?;
        Ok(entity)
    }

    /// Resolve an explicit specifier set onto `entity`.
    pub fn resolve(&self, entity: &mut Entity, set: SpecifierSet) -> Result<Resolution> {
        engine::resolve(entity, set, &self.normalizer, &self.config)
    }

    /// Access the class registry (for definitions and hierarchy queries).
    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Self dependency: specifier \"{specifier}\" for property \"{property}\" depends on itself")]
    SelfDependency { specifier: String, property: String },

    #[error("Final override: \"{property}\" property cannot be overridden")]
    FinalOverride { property: String },

    #[error("Final specification: property \"{property}\" cannot be directly specified (specified by \"{specifier}\")")]
    FinalSpecification { property: String, specifier: String },

    #[error("Duplicate specification: property \"{property}\" specified twice with the same priority (by \"{first}\" and \"{second}\")")]
    DuplicateSpecification { property: String, first: String, second: String },

    #[error("Circular dependency: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    #[error("Unknown attribute tag: {0}")]
    UnknownAttributeTag(String),

    #[error("Missing dependency: property \"{property}\" depends on \"{dependency}\", which nothing specifies")]
    MissingDependency { property: String, dependency: String },

    #[error("Undeclared dependency: property \"{0}\" was read without being declared")]
    UndeclaredDependency(String),

    #[error("Already specified: {0}")]
    AlreadySpecified(String),

    #[error("Entity frozen: entity {0} is already resolved")]
    EntityFrozen(EntityId),

    #[error("Still lazy: value for property \"{0}\" after evaluation")]
    StillLazy(String),

    #[error("Incomplete resolution: {0}")]
    Incomplete(String),

    #[error("Malformed specifier: {0}")]
    MalformedSpecifier(String),

    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    #[error("Invalid distribution: {0}")]
    InvalidDistribution(String),

    #[error("Unknown class: {0}")]
    UnknownClass(String),

    #[error("Class already defined: {0}")]
    ClassRedefinition(String),

    #[error("Too many properties: entity declares {count}, limit is {limit}")]
    TooManyProperties { count: usize, limit: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
