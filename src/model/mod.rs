//! # Property Model
//!
//! Clean DTOs that every other layer passes around: concrete values,
//! symbolic distributions, committed property maps and the entities that
//! own them.
//!
//! Design rule: no closures here. Anything lazy lives in [`crate::lazy`].
//! This module is pure data — no evaluation, no shared state.

pub mod value;
pub mod distribution;
pub mod property_map;
pub mod entity;

pub use value::Value;
pub use distribution::Distribution;
pub use property_map::{PropertyMap, Resolved};
pub use entity::{Entity, EntityId};
