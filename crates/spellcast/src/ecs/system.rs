//! # Systems and Behaviors
//!
//! Two kinds of per-frame code run against the [`Context`]:
//!
//! - A [`System`] runs once per frame for the whole simulation (the spell
//!   caster, the spawners).
//! - A [`Behavior`] belongs to one actor and runs once per frame with that
//!   actor's handle.
//!
//! Both are plain traits with blanket impls for closures, so
//! `|ctx, step| { ... }` is a system and `|ctx, step, me| { ... }` is a
//! behavior. Both return [`SimResult`]; an `Err` stops the frame loop.
//!
//! A [`Schedule`] holds the systems in registration order. Each entry has a
//! label so a host can swap one system out (a new spell caster, say) without
//! disturbing the order of the rest.

use super::entity::Entity;
use crate::context::Context;
use crate::error::SimResult;
use crate::time::TickStep;

/// Simulation-wide per-frame code.
pub trait System {
    fn run(&mut self, ctx: &mut Context, step: TickStep) -> SimResult<()>;
}

impl<F> System for F
where
    F: FnMut(&mut Context, TickStep) -> SimResult<()>,
{
    fn run(&mut self, ctx: &mut Context, step: TickStep) -> SimResult<()> {
        (self)(ctx, step)
    }
}

/// Per-actor per-frame code. `me` is the actor being ticked.
pub trait Behavior {
    fn tick(&mut self, ctx: &mut Context, step: TickStep, me: Entity) -> SimResult<()>;
}

impl<F> Behavior for F
where
    F: FnMut(&mut Context, TickStep, Entity) -> SimResult<()>,
{
    fn tick(&mut self, ctx: &mut Context, step: TickStep, me: Entity) -> SimResult<()> {
        (self)(ctx, step, me)
    }
}

struct LabeledSystem {
    label: String,
    system: Box<dyn System>,
}

/// Wall-clock cost of one system in the most recent run.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone)]
pub struct SystemTiming {
    pub label: String,
    pub duration_us: f64,
}

/// Systems in run order.
#[derive(Default)]
pub struct Schedule {
    systems: Vec<LabeledSystem>,
    #[cfg(feature = "diagnostics")]
    timings: Vec<SystemTiming>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a system under `label`.
    pub fn add(&mut self, label: impl Into<String>, system: impl System + 'static) {
        self.systems.push(LabeledSystem {
            label: label.into(),
            system: Box::new(system),
        });
    }

    /// Swap the system registered under `label`, keeping its position.
    /// Appends when no such label exists.
    pub fn replace(&mut self, label: &str, system: impl System + 'static) {
        match self.systems.iter_mut().find(|s| s.label == label) {
            Some(entry) => entry.system = Box::new(system),
            None => self.add(label, system),
        }
    }

    /// Remove the system under `label`. `true` if it existed.
    pub fn remove(&mut self, label: &str) -> bool {
        let before = self.systems.len();
        self.systems.retain(|s| s.label != label);
        self.systems.len() != before
    }

    pub fn contains(&self, label: &str) -> bool {
        self.systems.iter().any(|s| s.label == label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|s| s.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Run every system in order. Stops at the first error, which is
    /// returned as-is.
    pub fn run(&mut self, ctx: &mut Context, step: TickStep) -> SimResult<()> {
        #[cfg(feature = "diagnostics")]
        self.timings.clear();
        for entry in &mut self.systems {
            #[cfg(feature = "diagnostics")]
            let start = std::time::Instant::now();
            let result = entry.system.run(ctx, step);
            #[cfg(feature = "diagnostics")]
            self.timings.push(SystemTiming {
                label: entry.label.clone(),
                duration_us: start.elapsed().as_secs_f64() * 1_000_000.0,
            });
            if let Err(err) = result {
                log::debug!("System `{}` returned an error", entry.label);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Timings from the most recent [`run`](Self::run).
    #[cfg(feature = "diagnostics")]
    pub fn timings(&self) -> &[SystemTiming] {
        &self.timings
    }
}
