//! # Scheduler: the Frame Loop
//!
//! The host owns the clock and the frame callback (a `requestAnimationFrame`,
//! a winit redraw, a test loop). The [`Scheduler`] owns the decision of
//! whether a callback still counts:
//!
//! ```text
//!   Paused ──play(now)──► Running { pending: r1 }
//!                           │
//!          run_frame(r1) ───┤ issue r2 first, then run the frame
//!                           ▼
//!                         Running { pending: r2 }
//!                           │
//!                pause() ───┘──► Paused        (r2 is now stale)
//! ```
//!
//! A frame callback carries the [`FrameRequest`] it was issued for. Running a
//! request that is not the pending one does nothing, so a callback already
//! queued by the host when [`pause`](Scheduler::pause) was called never runs
//! a frame.
//!
//! Inside a frame, in order:
//!
//! 1. issue the next request;
//! 2. compute the [`TickStep`];
//! 3. refresh pointer targeting through the [`Viewport`];
//! 4. run the global systems;
//! 5. tick every live actor's behavior;
//! 6. sync visuals and render.
//!
//! An error from a system or behavior pauses the scheduler and is returned.
//! Spell failures never get this far; the projectile that owns the spell
//! contains them.

use crate::context::Context;
use crate::ecs::{Schedule, System};
use crate::error::{SimError, SimResult};
use crate::time::TickStep;
use crate::visual::Viewport;

/// Token for one scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Paused,
    Running { pending: FrameRequest },
}

pub struct Scheduler {
    state: SchedulerState,
    next_request: u64,
    /// Clock reading of the previous frame, or of `play` before the first.
    last: f32,
    schedule: Schedule,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Paused,
            next_request: 0,
            last: 0.0,
            schedule: Schedule::new(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SchedulerState::Running { .. })
    }

    /// The request the next frame callback should carry.
    pub fn pending(&self) -> Option<FrameRequest> {
        match self.state {
            SchedulerState::Running { pending } => Some(pending),
            SchedulerState::Paused => None,
        }
    }

    pub fn systems(&self) -> &Schedule {
        &self.schedule
    }

    pub fn systems_mut(&mut self) -> &mut Schedule {
        &mut self.schedule
    }

    pub fn add_system(&mut self, label: impl Into<String>, system: impl System + 'static) {
        self.schedule.add(label, system);
    }

    /// Start running. `now` (seconds) becomes the baseline for the first
    /// frame's delta. No-op when already running.
    pub fn play(&mut self, now: f32) -> FrameRequest {
        if let SchedulerState::Running { pending } = self.state {
            return pending;
        }
        self.last = now;
        let pending = self.issue();
        self.state = SchedulerState::Running { pending };
        log::info!("Simulation running");
        pending
    }

    /// Stop running. The pending request goes stale.
    pub fn pause(&mut self) {
        if self.is_running() {
            self.state = SchedulerState::Paused;
            log::info!("Simulation paused");
        }
    }

    fn issue(&mut self) -> FrameRequest {
        let request = FrameRequest(self.next_request);
        self.next_request += 1;
        request
    }

    /// Run one frame for `request` at clock reading `now` (seconds).
    ///
    /// Returns `Ok(false)` without touching anything when `request` is not
    /// the pending one. On error the scheduler is paused before returning.
    pub fn run_frame(
        &mut self,
        request: FrameRequest,
        now: f32,
        ctx: &mut Context,
        viewport: &mut dyn Viewport,
    ) -> SimResult<bool> {
        if self.pending() != Some(request) {
            log::trace!("Ignoring stale {request:?}");
            return Ok(false);
        }
        let pending = self.issue();
        self.state = SchedulerState::Running { pending };

        let step = TickStep {
            time: now,
            delta: (now - self.last).max(0.0),
        };
        self.last = now;
        ctx.time.advance(step);

        refresh_targeting(ctx, viewport);

        if let Err(err) = self.schedule.run(ctx, step) {
            return Err(self.fail(err));
        }

        for entity in ctx.world.live_entities() {
            let Some(mut behavior) = ctx.world.take_behavior(entity) else {
                continue;
            };
            let result = behavior.tick(ctx, step, entity);
            ctx.world.restore_behavior(entity, behavior);
            if let Err(err) = result {
                log::debug!("Behavior of {entity} returned an error");
                return Err(self.fail(err));
            }
        }

        ctx.world.sync_visuals();
        viewport.render(&ctx.world);

        #[cfg(feature = "diagnostics")]
        {
            let stats = ctx.world.take_stats();
            log::trace!(
                "frame {}: {} alive / {} slots, +{} -{}",
                ctx.time.frame_count(),
                stats.alive,
                stats.slots,
                stats.spawned,
                stats.despawned
            );
            for timing in self.schedule.timings() {
                log::trace!("  {}: {:.1}us", timing.label, timing.duration_us);
            }
        }

        if ctx.take_pause_request() {
            self.pause();
        }
        Ok(true)
    }

    fn fail(&mut self, err: SimError) -> SimError {
        log::error!("Frame failed, pausing: {err}");
        self.state = SchedulerState::Paused;
        err
    }
}

/// Cache the primary pointer and the play-plane point under it.
fn refresh_targeting(ctx: &mut Context, viewport: &mut dyn Viewport) {
    let pointer = ctx
        .input
        .pointer(ctx.config.projectile.pointer)
        .map(|p| p.position());
    ctx.blackboard.pointer = pointer;
    ctx.blackboard.targeting = pointer.and_then(|p| viewport.pick(p));
}
