//! # Spellcast: Scriptable Simulation Core
//!
//! A small real-time simulation where the player's projectiles ("spells") are
//! driven by user-editable Rhai scripts, compiled and hot-swapped while the
//! simulation runs.
//!
//! Start with `use spellcast::prelude::*` and build a [`Game`](game::Game).
//! Rendering and raw input capture live outside this crate: hosts plug in a
//! [`VisualProvider`](visual::VisualProvider), a [`Viewport`](visual::Viewport)
//! and feed an [`InputSnapshot`](input::InputSnapshot) each frame.

pub mod behavior;
pub mod config;
pub mod context;
pub mod ecs;
pub mod error;
pub mod game;
pub mod input;
pub mod math;
pub mod prelude;
pub mod scheduler;
pub mod spawner;
pub mod spell;
pub mod time;
pub mod visual;
