//! # Spells
//!
//! User-editable Rhai scripts that steer projectiles.
//!
//! - [`engine`]: the sandboxed Rhai engine and the `Vec3` script type.
//! - [`library`]: compiling sources into [`Spell`]s, one [`SpellInstance`]
//!   per cast.
//! - [`caster`]: the [`SpellCaster`] system and [`Projectile`] behavior.
//! - [`watch`]: recompiling spell files when they change on disk.

pub mod caster;
pub mod engine;
pub mod library;
pub mod watch;

pub use caster::{Projectile, ProjectileState, SpellCaster, cast};
pub use engine::ScriptVec;
pub use library::{Spell, SpellInstance, SpellLibrary};
pub use watch::SpellWatcher;
