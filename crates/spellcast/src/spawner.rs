//! Systems that populate the world with hostiles.

use glam::Vec3;

use crate::behavior::{Chase, Wander};
use crate::config::tags;
use crate::context::Context;
use crate::ecs::{ActorSpec, Entity, System};
use crate::error::SimResult;
use crate::math::random_point_near;
use crate::time::TickStep;
use crate::visual::{ShapeDescriptor, colors};

/// A red hostile box at `position`, without behavior.
pub fn hostile(position: Vec3) -> ActorSpec {
    ActorSpec::at(position)
        .named("hostile")
        .tag(tags::HOSTILE)
        .shape(ShapeDescriptor::cube(1.0, colors::RED))
}

/// Keeps a den populated with wandering hostiles.
///
/// The den is an inert actor. Everything it spawns carries the den's own tag,
/// so the population is whatever is still alive with that tag.
pub struct Spawner {
    den: Entity,
    den_tag: String,
    last_spawn: Option<f32>,
}

impl Spawner {
    /// Create the den at `position`.
    pub fn new(ctx: &mut Context, position: Vec3) -> Self {
        let den = ctx.world.create(ActorSpec::at(position).named("den"));
        let den_tag = format!("den:{den}");
        log::info!("Spawner den {den} at {position}");
        Self {
            den,
            den_tag,
            last_spawn: None,
        }
    }

    pub fn den(&self) -> Entity {
        self.den
    }

    pub fn den_tag(&self) -> &str {
        &self.den_tag
    }
}

impl System for Spawner {
    fn run(&mut self, ctx: &mut Context, step: TickStep) -> SimResult<()> {
        let cfg = &ctx.config.spawner;
        if self.last_spawn.is_some_and(|last| step.time - last < cfg.interval) {
            return Ok(());
        }
        let population = ctx.world.get_by_tags(&[self.den_tag.as_str()]).len();
        if population >= cfg.max_pop {
            return Ok(());
        }
        // Nothing spawns once the den itself is gone.
        let Some(origin) = ctx.world.position(self.den) else {
            return Ok(());
        };
        let at = random_point_near(&mut ctx.rng, origin, cfg.radius, cfg.inner_radius);
        let spawned = ctx.world.create(
            hostile(at)
                .tags([tags::SPAWNED, self.den_tag.as_str()])
                .behavior(Wander::new()),
        );
        log::debug!("Den {} spawned {spawned} ({} alive)", self.den, population + 1);
        self.last_spawn = Some(step.time);
        Ok(())
    }
}

/// While the spawn key is held, drops a chasing hostile near the player at
/// most once per interval.
#[derive(Debug, Default)]
pub struct KeySpawner {
    last_spawn: Option<f32>,
}

impl KeySpawner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl System for KeySpawner {
    fn run(&mut self, ctx: &mut Context, step: TickStep) -> SimResult<()> {
        if !ctx.input.pressed(&ctx.config.controls.spawn) {
            return Ok(());
        }
        let cfg = &ctx.config.key_spawner;
        if self.last_spawn.is_some_and(|last| step.time - last < cfg.interval) {
            return Ok(());
        }
        let origin = ctx.player_position().unwrap_or(Vec3::ZERO);
        let at = random_point_near(&mut ctx.rng, origin, cfg.radius, cfg.inner_radius);
        let spawned = ctx
            .world
            .create(hostile(at).behavior(Chase::new(ctx.config.chase_speed)));
        log::debug!("Spawned {spawned} near the player");
        self.last_spawn = Some(step.time);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::visual::HeadlessVisuals;

    fn context() -> Context {
        let mut config = SimConfig::default();
        config.spawner.max_pop = 3;
        config.spawner.interval = 1.0;
        Context::new(HeadlessVisuals::new(), config)
    }

    fn at(time: f32) -> TickStep {
        TickStep { time, delta: 0.1 }
    }

    #[test]
    fn spawner_respects_interval_and_max_pop() {
        let mut ctx = context();
        let mut spawner = Spawner::new(&mut ctx, Vec3::ZERO);
        let tag = spawner.den_tag().to_string();

        spawner.run(&mut ctx, at(0.0)).unwrap();
        assert_eq!(ctx.world.get_by_tags(&[&tag]).len(), 1);
        spawner.run(&mut ctx, at(0.5)).unwrap();
        assert_eq!(ctx.world.get_by_tags(&[&tag]).len(), 1);

        for t in 1..10 {
            spawner.run(&mut ctx, at(t as f32)).unwrap();
        }
        assert_eq!(ctx.world.get_by_tags(&[&tag]).len(), 3);
    }

    #[test]
    fn spawner_refills_after_removal() {
        let mut ctx = context();
        let mut spawner = Spawner::new(&mut ctx, Vec3::ZERO);
        for t in 0..5 {
            spawner.run(&mut ctx, at(t as f32)).unwrap();
        }
        let tag = spawner.den_tag().to_string();
        let pop = ctx.world.get_by_tags(&[&tag]);
        assert_eq!(pop.len(), 3);
        ctx.world.remove(pop[0]);
        spawner.run(&mut ctx, at(10.0)).unwrap();
        assert_eq!(ctx.world.get_by_tags(&[&tag]).len(), 3);
    }

    #[test]
    fn spawned_hostiles_are_tagged_and_placed_in_annulus() {
        let mut ctx = context();
        let mut spawner = Spawner::new(&mut ctx, Vec3::new(5.0, 5.0, 0.0));
        spawner.run(&mut ctx, at(0.0)).unwrap();
        let spawned = ctx.world.get_by_tags(&[spawner.den_tag()])[0];
        let actor = ctx.world.get(spawned).unwrap();
        assert!(actor.tags().contains(tags::HOSTILE));
        assert!(actor.tags().contains(tags::SPAWNED));
        let d = actor.position().distance(Vec3::new(5.0, 5.0, 0.0));
        assert!((3.0..15.0).contains(&d), "spawned at distance {d}");
        assert!(!ctx.world.get(spawner.den()).unwrap().tags().contains(tags::HOSTILE));
    }

    #[test]
    fn dens_do_not_share_population() {
        let mut ctx = context();
        let mut a = Spawner::new(&mut ctx, Vec3::ZERO);
        let mut b = Spawner::new(&mut ctx, Vec3::ZERO);
        assert_ne!(a.den_tag(), b.den_tag());
        for t in 0..5 {
            a.run(&mut ctx, at(t as f32)).unwrap();
        }
        b.run(&mut ctx, at(5.0)).unwrap();
        assert_eq!(ctx.world.get_by_tags(&[a.den_tag()]).len(), 3);
        assert_eq!(ctx.world.get_by_tags(&[b.den_tag()]).len(), 1);
    }

    #[test]
    fn key_spawner_only_while_key_held() {
        let mut ctx = context();
        let mut spawner = KeySpawner::new();
        spawner.run(&mut ctx, at(0.0)).unwrap();
        assert!(ctx.world.get_by_tags(&[tags::HOSTILE]).is_empty());

        ctx.input.press("Space", 0.0);
        spawner.run(&mut ctx, at(0.0)).unwrap();
        spawner.run(&mut ctx, at(0.5)).unwrap();
        assert_eq!(ctx.world.get_by_tags(&[tags::HOSTILE]).len(), 1);
        spawner.run(&mut ctx, at(1.0)).unwrap();
        assert_eq!(ctx.world.get_by_tags(&[tags::HOSTILE]).len(), 2);

        ctx.input.release("Space", 1.0);
        spawner.run(&mut ctx, at(5.0)).unwrap();
        assert_eq!(ctx.world.get_by_tags(&[tags::HOSTILE]).len(), 2);
    }
}
