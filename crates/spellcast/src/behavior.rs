//! Movement behaviors for actors on the play plane.
//!
//! All speeds are world units per second and are multiplied by
//! [`SimConfig::scale`](crate::config::SimConfig::scale).

use glam::{Quat, Vec2, Vec3};

use crate::context::Context;
use crate::ecs::{Behavior, Entity};
use crate::error::SimResult;
use crate::math::{flat, random_point_near};
use crate::time::TickStep;

/// Radians per second a chasing actor tumbles around its x and y axes.
const CHASE_SPIN: f32 = 0.6;

/// Walk straight at the player, stopping once within one step of it.
#[derive(Debug, Clone, Copy)]
pub struct Chase {
    pub speed: f32,
}

impl Chase {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }
}

impl Behavior for Chase {
    fn tick(&mut self, ctx: &mut Context, step: TickStep, me: Entity) -> SimResult<()> {
        let target = ctx.player_position();
        let distance = self.speed * ctx.config.scale * step.delta;
        let Some(transform) = ctx.world.transform_mut(me) else {
            return Ok(());
        };

        let spin = CHASE_SPIN * step.delta;
        transform.rotation =
            (transform.rotation * Quat::from_rotation_x(spin) * Quat::from_rotation_y(spin))
                .normalize();

        if let Some(target) = target {
            let offset = flat(target - transform.translation);
            if offset.length() > distance {
                transform.translation += offset.normalize() * distance;
            }
        }
        Ok(())
    }
}

/// Stroll between random waypoints near the current position.
#[derive(Debug, Clone, Default)]
pub struct Wander {
    waypoint: Option<Vec3>,
}

impl Wander {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waypoint(&self) -> Option<Vec3> {
        self.waypoint
    }
}

impl Behavior for Wander {
    fn tick(&mut self, ctx: &mut Context, step: TickStep, me: Entity) -> SimResult<()> {
        let cfg = &ctx.config.wander;
        let distance = cfg.speed * ctx.config.scale * step.delta;
        let Some(transform) = ctx.world.transform_mut(me) else {
            return Ok(());
        };
        let position = transform.translation;

        let waypoint = match self.waypoint {
            Some(w) if w.distance(position) > distance => w,
            _ => random_point_near(&mut ctx.rng, position, cfg.radius, cfg.inner_radius),
        };
        self.waypoint = Some(waypoint);

        transform.look_at(waypoint, Vec3::Z);
        let heading = flat(waypoint - position).normalize_or_zero();
        transform.translation += heading * distance;
        Ok(())
    }
}

/// Move the actor from the keyboard, or from the move stick when no key is
/// held.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerControl;

impl PlayerControl {
    /// Direction requested by the current input, at most unit length.
    pub fn heading(ctx: &Context) -> Vec2 {
        let controls = &ctx.config.controls;
        let input = &ctx.input;
        let mut keys = Vec2::ZERO;
        if input.pressed(&controls.up) {
            keys.y += 1.0;
        }
        if input.pressed(&controls.down) {
            keys.y -= 1.0;
        }
        if input.pressed(&controls.left) {
            keys.x -= 1.0;
        }
        if input.pressed(&controls.right) {
            keys.x += 1.0;
        }
        if keys != Vec2::ZERO {
            return keys.normalize();
        }
        input
            .stick(controls.move_axes, ctx.config.projectile.deadzone)
            .map_or(Vec2::ZERO, |stick| stick.clamp_length_max(1.0))
    }
}

impl Behavior for PlayerControl {
    fn tick(&mut self, ctx: &mut Context, step: TickStep, me: Entity) -> SimResult<()> {
        let heading = Self::heading(ctx);
        if heading == Vec2::ZERO {
            return Ok(());
        }
        let distance = ctx.config.player_speed * ctx.config.scale * step.delta;
        if let Some(transform) = ctx.world.transform_mut(me) {
            transform.translation += heading.extend(0.0) * distance;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::ecs::ActorSpec;
    use crate::input::GamepadState;
    use crate::visual::HeadlessVisuals;

    fn context() -> Context {
        Context::new(HeadlessVisuals::new(), SimConfig::default())
    }

    fn step(delta: f32) -> TickStep {
        TickStep { time: 0.0, delta }
    }

    fn player(ctx: &mut Context, position: Vec3) -> Entity {
        let player = ctx.world.create(ActorSpec::at(position));
        ctx.blackboard.player = Some(player);
        player
    }

    #[test]
    fn chase_steps_toward_player() {
        let mut ctx = context();
        player(&mut ctx, Vec3::new(10.0, 0.0, 0.0));
        let me = ctx.world.create(ActorSpec::default());
        Chase::new(2.0).tick(&mut ctx, step(0.5), me).unwrap();
        let position = ctx.world.position(me).unwrap();
        assert!(position.distance(Vec3::new(1.0, 0.0, 0.0)) < 1e-5);
    }

    #[test]
    fn chase_stops_within_one_step() {
        let mut ctx = context();
        player(&mut ctx, Vec3::new(0.5, 0.0, 0.0));
        let me = ctx.world.create(ActorSpec::default());
        Chase::new(2.0).tick(&mut ctx, step(0.5), me).unwrap();
        assert_eq!(ctx.world.position(me).unwrap(), Vec3::ZERO);
    }

    #[test]
    fn chase_without_player_only_spins() {
        let mut ctx = context();
        let me = ctx.world.create(ActorSpec::default());
        Chase::new(2.0).tick(&mut ctx, step(0.5), me).unwrap();
        let actor = ctx.world.get(me).unwrap();
        assert_eq!(actor.position(), Vec3::ZERO);
        assert_ne!(actor.transform.rotation, Quat::IDENTITY);
    }

    #[test]
    fn wander_keeps_waypoint_until_reached() {
        let mut ctx = context();
        let me = ctx.world.create(ActorSpec::default());
        let mut wander = Wander::new();
        wander.tick(&mut ctx, step(0.1), me).unwrap();
        let first = wander.waypoint().unwrap();
        let d = first.length();
        assert!((1.0..3.0).contains(&d), "waypoint at {d}");

        wander.tick(&mut ctx, step(0.1), me).unwrap();
        assert_eq!(wander.waypoint(), Some(first));
        let moved = ctx.world.position(me).unwrap();
        assert!((moved.length() - 2.0 * 1.2 * 0.1).abs() < 1e-4);
        assert_eq!(moved.z, 0.0);
    }

    #[test]
    fn wander_picks_new_waypoint_on_arrival() {
        let mut ctx = context();
        let me = ctx.world.create(ActorSpec::default());
        let mut wander = Wander::new();
        wander.tick(&mut ctx, step(0.1), me).unwrap();
        let first = wander.waypoint().unwrap();
        ctx.world.transform_mut(me).unwrap().translation = first;
        wander.tick(&mut ctx, step(0.1), me).unwrap();
        assert_ne!(wander.waypoint(), Some(first));
    }

    #[test]
    fn keys_move_player_diagonally_at_player_speed() {
        let mut ctx = context();
        let me = player(&mut ctx, Vec3::ZERO);
        ctx.input.press("KeyW", 0.0);
        ctx.input.press("KeyD", 0.0);
        PlayerControl.tick(&mut ctx, step(1.0), me).unwrap();
        let position = ctx.world.position(me).unwrap();
        assert!((position.length() - 3.0).abs() < 1e-5);
        assert!((position.x - position.y).abs() < 1e-5);
    }

    #[test]
    fn opposite_keys_cancel_and_stick_takes_over() {
        let mut ctx = context();
        let me = player(&mut ctx, Vec3::ZERO);
        ctx.input.press("KeyA", 0.0);
        ctx.input.press("KeyD", 0.0);
        ctx.input.gamepads.push(GamepadState {
            axes: vec![0.0, 0.5],
            buttons: Vec::new(),
            connected: true,
        });
        PlayerControl.tick(&mut ctx, step(1.0), me).unwrap();
        let position = ctx.world.position(me).unwrap();
        assert!(position.distance(Vec3::new(0.0, -1.5, 0.0)) < 1e-5);
    }

    #[test]
    fn stick_inside_deadzone_is_ignored() {
        let mut ctx = context();
        let me = player(&mut ctx, Vec3::ZERO);
        ctx.input.gamepads.push(GamepadState {
            axes: vec![0.1, 0.1],
            buttons: Vec::new(),
            connected: true,
        });
        PlayerControl.tick(&mut ctx, step(1.0), me).unwrap();
        assert_eq!(ctx.world.position(me).unwrap(), Vec3::ZERO);
    }
}
