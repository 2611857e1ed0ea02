//! Error types.
//!
//! Three classes matter to the frame loop:
//!
//! - [`CompileError`]: a spell that never became usable. Returned to whoever
//!   called [`compile`](crate::spell::SpellLibrary::compile); the simulation is
//!   untouched.
//! - [`ScriptError`]: a spell instance failing while it runs. Contained by the
//!   projectile that owns the instance and never reaches the scheduler.
//! - [`SimError`]: a failing system or behavior, or a host that could not
//!   load its config. Fatal for the frame loop: it propagates out of
//!   [`Scheduler::run_frame`](crate::scheduler::Scheduler::run_frame) and
//!   pauses the simulation.

use std::path::PathBuf;

use thiserror::Error;

/// Why a spell source failed to compile.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("syntax error: {0}")]
    Parse(String),
    #[error("setup code failed: {0}")]
    Setup(String),
    #[error("spell must evaluate to a function, got `{0}`")]
    NotCallable(String),
    #[error("spell function takes {found} parameters, expected 3 (delta, position, velocity)")]
    Arity { found: usize },
}

/// A failure inside a running spell instance.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("spell raised an error: {0}")]
    Runtime(String),
    #[error("spell exceeded its operation budget")]
    Budget,
    #[error("spell factory did not produce a function: {0}")]
    Instantiate(String),
}

/// Failure loading a [`SimConfig`](crate::config::SimConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// A fatal simulation error.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("system `{system}` failed: {reason}")]
    System { system: String, reason: String },
    #[error("behavior of {entity} failed: {reason}")]
    Behavior { entity: String, reason: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type SimResult<T> = Result<T, SimError>;
