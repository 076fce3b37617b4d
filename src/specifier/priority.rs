//! Priority levels for competing specifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a specifier comes from. Later variants always win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriorityLevel {
    /// Expanded from a class's property default. Reserved.
    Default,
    /// Declared in a class body.
    ClassBody,
    /// Attached to a single instance.
    Instance,
}

/// Ordered precedence of a specifier for one property.
///
/// Compares by level first, then by `rank` within the level (larger wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Priority {
    pub level: PriorityLevel,
    pub rank: i32,
}

impl Priority {
    /// The reserved priority of expanded property defaults.
    pub const DEFAULT: Priority = Priority { level: PriorityLevel::Default, rank: 0 };
    pub const CLASS_BODY: Priority = Priority { level: PriorityLevel::ClassBody, rank: 0 };
    pub const INSTANCE: Priority = Priority { level: PriorityLevel::Instance, rank: 0 };

    pub fn class_body(rank: i32) -> Self {
        Self { level: PriorityLevel::ClassBody, rank }
    }

    pub fn instance(rank: i32) -> Self {
        Self { level: PriorityLevel::Instance, rank }
    }

    pub fn is_default(&self) -> bool {
        self.level == PriorityLevel::Default
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            PriorityLevel::Default => "default",
            PriorityLevel::ClassBody => "class",
            PriorityLevel::Instance => "instance",
        };
        if self.rank == 0 {
            write!(f, "{level}")
        } else {
            write!(f, "{level}:{}", self.rank)
        }
    }
}
