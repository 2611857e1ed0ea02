//! Context: everything a system or behavior can touch.
//!
//! [`Context`] bundles the [`World`], the [`Blackboard`] of shared facts, the
//! frame's [`InputSnapshot`], the [`SimConfig`], the seeded RNG and frame
//! timing. Systems and behaviors receive `&mut Context`.

use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::SimConfig;
use crate::ecs::{Entity, World};
use crate::input::InputSnapshot;
use crate::time::Time;
use crate::visual::VisualProvider;

/// Shared facts, written by whoever knows them and read by anyone.
///
/// - `player` is set when the player actor is created.
/// - `pointer` and `targeting` are refreshed by the scheduler at the start of
///   each frame from the primary pointer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blackboard {
    pub player: Option<Entity>,
    /// Pointer position in normalized device coordinates.
    pub pointer: Option<Vec2>,
    /// Point on the play plane under the pointer.
    pub targeting: Option<Vec3>,
}

/// The simulation state handed to every system and behavior.
pub struct Context {
    pub world: World,
    pub blackboard: Blackboard,
    /// Read-only during a frame.
    pub input: InputSnapshot,
    pub config: SimConfig,
    pub rng: StdRng,
    pub time: Time,
    pause_requested: bool,
}

impl Context {
    pub fn new(visuals: impl VisualProvider + 'static, config: SimConfig) -> Self {
        Self {
            world: World::new(visuals, config.scale),
            blackboard: Blackboard::default(),
            input: InputSnapshot::default(),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            time: Time::new(),
            pause_requested: false,
        }
    }

    /// The player's position, if there is a live player.
    pub fn player_position(&self) -> Option<Vec3> {
        self.world.position(self.blackboard.player?)
    }

    /// Ask the scheduler to pause once the current frame completes.
    pub fn request_pause(&mut self) {
        self.pause_requested = true;
    }

    pub(crate) fn take_pause_request(&mut self) -> bool {
        std::mem::take(&mut self.pause_requested)
    }
}
