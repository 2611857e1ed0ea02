//! Tuning constants for a simulation.
//!
//! Every speed, radius and timer used by the built-in systems lives in
//! [`SimConfig`]. It deserializes from JSON with per-field defaults, so a
//! config file only needs the values it changes:
//!
//! ```json
//! { "seed": 7, "spawner": { "max_pop": 3 } }
//! ```
//!
//! Speeds are world units per second, timers are seconds, and everything
//! spatial is multiplied by [`SimConfig::scale`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Well-known tag names.
pub mod tags {
    /// Enemies. Projectiles collide with these.
    pub const HOSTILE: &str = "hostile";
    /// Entities spawned by a spell cast.
    pub const PROJECTILE: &str = "projectile";
    /// Entities produced by a spawner den.
    pub const SPAWNED: &str = "spawned";
    /// The player-controlled entity.
    pub const PLAYER: &str = "player";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the simulation RNG (wander waypoints, spawn points).
    pub seed: u64,
    /// Global spatial scale applied to speeds and default visuals.
    pub scale: f32,
    pub player_speed: f32,
    pub chase_speed: f32,
    pub wander: WanderConfig,
    pub projectile: ProjectileConfig,
    pub spawner: SpawnerConfig,
    pub key_spawner: KeySpawnerConfig,
    pub controls: Controls,
    pub script: ScriptLimits,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            scale: 1.0,
            player_speed: 3.0,
            chase_speed: 3.0,
            wander: WanderConfig::default(),
            projectile: ProjectileConfig::default(),
            spawner: SpawnerConfig::default(),
            key_spawner: KeySpawnerConfig::default(),
            controls: Controls::default(),
            script: ScriptLimits::default(),
        }
    }
}

impl SimConfig {
    /// Load a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        log::info!("Loaded config from '{}'", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderConfig {
    pub speed: f32,
    /// Outer radius of the waypoint annulus.
    pub radius: f32,
    /// Inner radius of the waypoint annulus.
    pub inner_radius: f32,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            speed: 1.2,
            radius: 3.0,
            inner_radius: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub speed: f32,
    /// Number of ticks a projectile lives.
    pub life: u32,
    /// Side length of the projectile box.
    pub size: f32,
    /// Distance at which a projectile hits a hostile.
    pub collision_radius: f32,
    /// Seconds between casts of one caster.
    pub cooldown: f32,
    /// Pointer id whose press triggers a cast.
    pub pointer: u32,
    /// Gamepad axes `[x, y]` of the aim stick.
    pub aim_axes: [usize; 2],
    /// Stick deflection below this magnitude is ignored.
    pub deadzone: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 3.0,
            life: 500,
            size: 0.1,
            collision_radius: 0.8,
            cooldown: 0.33,
            pointer: 1,
            aim_axes: [2, 3],
            deadzone: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    pub max_pop: usize,
    /// Seconds between spawns.
    pub interval: f32,
    pub radius: f32,
    pub inner_radius: f32,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            max_pop: 10,
            interval: 1.5,
            radius: 15.0,
            inner_radius: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeySpawnerConfig {
    pub interval: f32,
    pub radius: f32,
    pub inner_radius: f32,
}

impl Default for KeySpawnerConfig {
    fn default() -> Self {
        Self {
            interval: 1.0,
            radius: 10.0,
            inner_radius: 2.0,
        }
    }
}

/// Key codes (DOM `KeyboardEvent.code` names) bound to player actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Controls {
    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,
    pub spawn: String,
    /// Gamepad axes `[x, y]` of the move stick.
    pub move_axes: [usize; 2],
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            up: "KeyW".into(),
            down: "KeyS".into(),
            left: "KeyA".into(),
            right: "KeyD".into(),
            spawn: "Space".into(),
            move_axes: [0, 1],
        }
    }
}

/// Resource limits for hosted scripts. Exceeding any of them is an error in
/// the offending script, never a hang of the frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptLimits {
    /// Operations allowed per factory run or per closure call.
    pub max_operations: u64,
    pub max_call_levels: usize,
    pub max_expr_depth: usize,
    pub max_function_expr_depth: usize,
    pub max_string_size: usize,
    pub max_array_size: usize,
    pub max_map_size: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_operations: 50_000,
            max_call_levels: 16,
            max_expr_depth: 64,
            max_function_expr_depth: 32,
            max_string_size: 1024,
            max_array_size: 256,
            max_map_size: 64,
        }
    }
}
