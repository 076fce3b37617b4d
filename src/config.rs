//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Knobs for a [`crate::Resolver`].
///
/// ```
/// use specifier::EngineConfig;
///
/// let cfg = EngineConfig::from_json(r#"{ "max_properties": 64 }"#).unwrap();
/// assert_eq!(cfg.max_properties, 64);
/// assert!(cfg.freeze_resolved);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Reject writes to an entity once it has been resolved.
    pub freeze_resolved: bool,
    /// Upper bound on the number of distinct properties one entity may declare.
    pub max_properties: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            freeze_resolved: true,
            max_properties: 4096,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_properties == 0 {
            return Err(Error::Config("max_properties must be at least 1".into()));
        }
        Ok(())
    }
}
