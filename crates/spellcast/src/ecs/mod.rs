//! # Actor Registry
//!
//! Not a general ECS. Every actor has the same shape (a transform, tags, a
//! visual, an optional state blob and a behavior), so the store is a single
//! generational arena rather than archetype tables.
//!
//! - [`entity`]: generational handles
//! - [`tags`]: per-actor tag sets
//! - [`world`]: the registry: create, remove, tag queries, visual sync
//! - [`system`]: the `System` and `Behavior` traits and the `Schedule`

pub mod entity;
pub mod system;
pub mod tags;
pub mod world;

pub use entity::Entity;
pub use system::{Behavior, Schedule, System};
pub use tags::TagSet;
pub use world::{Actor, ActorSpec, VisualSpec, World};
