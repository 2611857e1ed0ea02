//! Convenience re-exports: `use spellcast::prelude::*` for the common items.

pub use crate::behavior::{Chase, PlayerControl, Wander};
pub use crate::config::{SimConfig, tags};
pub use crate::context::{Blackboard, Context};
pub use crate::ecs::{Actor, ActorSpec, Behavior, Entity, System, TagSet, World};
pub use crate::error::{CompileError, ConfigError, ScriptError, SimError, SimResult};
pub use crate::game::Game;
pub use crate::input::{GamepadState, InputSnapshot};
pub use crate::math::{Quat, Transform, Vec2, Vec3};
pub use crate::scheduler::{FrameRequest, Scheduler, SchedulerState};
pub use crate::spawner::{KeySpawner, Spawner};
pub use crate::spell::{Projectile, ProjectileState, Spell, SpellCaster, SpellLibrary, SpellWatcher};
pub use crate::time::{Time, TickStep};
pub use crate::visual::{
    Camera, HeadlessViewport, HeadlessVisuals, ShapeDescriptor, Viewport, VisualHandle,
    VisualProvider,
};
