//! Casting spells: the [`SpellCaster`] system and the [`Projectile`] behavior
//! every cast creates.

use glam::Vec3;

use super::library::{Spell, SpellInstance};
use crate::config::tags;
use crate::context::Context;
use crate::ecs::{ActorSpec, Behavior, Entity, System};
use crate::error::{ScriptError, SimError, SimResult};
use crate::math::flat;
use crate::time::TickStep;
use crate::visual::{ShapeDescriptor, colors};

/// State of a cast projectile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileState {
    pub velocity: Vec3,
    /// Ticks left to live.
    pub life: u32,
}

/// Drives a projectile with its own [`SpellInstance`].
///
/// Each tick: spend one unit of life and vanish at zero; otherwise run the
/// spell, then remove the projectile together with the nearest hostile in
/// range. A failing spell is logged and the projectile removed on its next
/// tick.
pub struct Projectile {
    instance: SpellInstance,
}

impl Projectile {
    pub fn new(instance: SpellInstance) -> Self {
        Self { instance }
    }
}

impl Behavior for Projectile {
    fn tick(&mut self, ctx: &mut Context, step: TickStep, me: Entity) -> SimResult<()> {
        let Some(state) = ctx.world.state_mut::<ProjectileState>(me) else {
            return Err(SimError::Behavior {
                entity: me.to_string(),
                reason: "projectile has no ProjectileState".into(),
            });
        };
        state.life = state.life.saturating_sub(1);
        if state.life == 0 {
            ctx.world.remove(me);
            return Ok(());
        }
        let mut velocity = state.velocity;

        let Some(actor) = ctx.world.get_mut(me) else {
            return Ok(());
        };
        let mut position = actor.transform.translation;
        if let Err(err) = self.instance.invoke(step.delta, &mut position, &mut velocity) {
            log::warn!("Spell in projectile {me} failed: {err}");
            if let Some(state) = ctx.world.state_mut::<ProjectileState>(me) {
                state.life = 0;
            }
            return Ok(());
        }
        actor.transform.translation = position;
        if let Some(state) = ctx.world.state_mut::<ProjectileState>(me) {
            state.velocity = velocity;
        }

        let radius = ctx.config.projectile.collision_radius;
        let hit = ctx
            .world
            .get_by_tags(&[tags::HOSTILE])
            .into_iter()
            .filter_map(|e| Some((e, ctx.world.position(e)?.distance(position))))
            .filter(|&(_, d)| d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((hostile, _)) = hit {
            log::debug!("Projectile {me} hit {hostile}");
            ctx.world.remove_all([hostile, me]);
        }
        Ok(())
    }
}

/// Create a projectile at `origin` driven by a fresh instance of `spell`.
pub fn cast(
    ctx: &mut Context,
    spell: &Spell,
    origin: Vec3,
    velocity: Vec3,
) -> Result<Entity, ScriptError> {
    let instance = spell.instantiate()?;
    let cfg = &ctx.config.projectile;
    let spec = ActorSpec::at(origin)
        .named(format!("{} projectile", spell.name()))
        .tag(tags::PROJECTILE)
        .state(ProjectileState {
            velocity,
            life: cfg.life,
        })
        .shape(ShapeDescriptor::cube(cfg.size, colors::RED))
        .behavior(Projectile::new(instance));
    Ok(ctx.world.create(spec))
}

/// Casts the active spell from the player toward the pointer target while
/// the trigger is held, at most once per cooldown.
///
/// The trigger is the configured pointer being down, or the aim stick of a
/// connected gamepad deflected past the deadzone. A pointer-driven cast aims
/// at the targeted point; a stick-driven one flies along the stick.
pub struct SpellCaster {
    spell: Spell,
    last_cast: Option<f32>,
}

impl SpellCaster {
    pub fn new(spell: Spell) -> Self {
        Self {
            spell,
            last_cast: None,
        }
    }

    pub fn spell(&self) -> &Spell {
        &self.spell
    }
}

impl System for SpellCaster {
    fn run(&mut self, ctx: &mut Context, step: TickStep) -> SimResult<()> {
        let Some(target) = ctx.blackboard.targeting else {
            return Ok(());
        };
        let Some(origin) = ctx.player_position() else {
            return Ok(());
        };
        let cfg = ctx.config.projectile.clone();
        let pointer_down = ctx.input.pointer_down(cfg.pointer);
        let stick = ctx.input.stick(cfg.aim_axes, cfg.deadzone);
        let direction = match (pointer_down, stick) {
            (true, _) => flat(target) - flat(origin),
            (false, Some(stick)) => stick.extend(0.0),
            (false, None) => return Ok(()),
        };
        if self.last_cast.is_some_and(|last| step.time - last < cfg.cooldown) {
            return Ok(());
        }

        let velocity = direction.normalize_or_zero() * cfg.speed * ctx.config.scale;
        match cast(ctx, &self.spell, origin, velocity) {
            Ok(projectile) => {
                log::debug!("Cast '{}' as {projectile}", self.spell.name());
                self.last_cast = Some(step.time);
            }
            Err(err) => log::warn!("Could not cast '{}': {err}", self.spell.name()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::config::{ScriptLimits, SimConfig};
    use crate::input::GamepadState;
    use crate::scheduler::Scheduler;
    use crate::spell::SpellLibrary;
    use crate::visual::{HeadlessViewport, HeadlessVisuals};

    const STEP: &str = "return |d, p, v| { p.x += v.x * d; p.y += v.y * d; };";

    struct Sim {
        scheduler: Scheduler,
        ctx: Context,
        viewport: HeadlessViewport,
        library: SpellLibrary,
        now: f32,
    }

    impl Sim {
        fn new() -> Self {
            let mut scheduler = Scheduler::new();
            scheduler.play(0.0);
            Self {
                scheduler,
                ctx: Context::new(HeadlessVisuals::new(), SimConfig::default()),
                viewport: HeadlessViewport::default(),
                library: SpellLibrary::new(&ScriptLimits::default(), 3),
                now: 0.0,
            }
        }

        fn spell(&self, source: &str) -> Spell {
            self.library.compile(source).unwrap()
        }

        fn frame(&mut self, dt: f32) {
            self.now += dt;
            let request = self.scheduler.pending().unwrap();
            self.scheduler
                .run_frame(request, self.now, &mut self.ctx, &mut self.viewport)
                .unwrap();
        }

        fn player_at(&mut self, x: f32, y: f32) -> Entity {
            let player = self.ctx.world.create(ActorSpec::at(Vec3::new(x, y, 0.0)).tag(tags::PLAYER));
            self.ctx.blackboard.player = Some(player);
            player
        }

        fn projectiles(&self) -> Vec<Entity> {
            self.ctx.world.get_by_tags(&[tags::PROJECTILE])
        }
    }

    #[test]
    fn pointer_cast_aims_at_target() {
        let mut sim = Sim::new();
        let spell = sim.spell(STEP);
        sim.scheduler.add_system("caster", SpellCaster::new(spell));
        sim.player_at(-2.0, 0.0);
        sim.ctx.input.set_pointer(1, Vec2::ZERO, true, 0.0);
        sim.frame(0.1);

        let shots = sim.projectiles();
        assert_eq!(shots.len(), 1);
        let state = sim.ctx.world.state::<ProjectileState>(shots[0]).unwrap();
        assert!(state.velocity.distance(Vec3::new(3.0, 0.0, 0.0)) < 1e-4);
    }

    #[test]
    fn no_cast_without_player_target_or_trigger() {
        let mut sim = Sim::new();
        let spell = sim.spell(STEP);
        sim.scheduler.add_system("caster", SpellCaster::new(spell));

        sim.ctx.input.set_pointer(1, Vec2::ZERO, true, 0.0);
        sim.frame(0.1);
        assert!(sim.projectiles().is_empty(), "no player");

        sim.player_at(1.0, 0.0);
        sim.ctx.input.set_pointer(1, Vec2::ZERO, false, 0.0);
        sim.frame(0.1);
        assert!(sim.projectiles().is_empty(), "pointer up");

        sim.ctx.input.pointers.clear();
        sim.ctx.input.gamepads.push(GamepadState {
            axes: vec![0.0, 0.0, 1.0, 0.0],
            buttons: Vec::new(),
            connected: true,
        });
        sim.frame(0.1);
        assert!(sim.projectiles().is_empty(), "no target");
    }

    #[test]
    fn cooldown_limits_cast_rate() {
        let mut sim = Sim::new();
        let spell = sim.spell(STEP);
        sim.scheduler.add_system("caster", SpellCaster::new(spell));
        sim.player_at(-2.0, 0.0);
        sim.ctx.input.set_pointer(1, Vec2::ZERO, true, 0.0);

        sim.frame(0.1);
        sim.frame(0.1);
        sim.frame(0.1);
        assert_eq!(sim.projectiles().len(), 1);
        sim.frame(0.2);
        assert_eq!(sim.projectiles().len(), 2);
    }

    #[test]
    fn stick_cast_follows_stick() {
        let mut sim = Sim::new();
        let spell = sim.spell(STEP);
        sim.scheduler.add_system("caster", SpellCaster::new(spell));
        sim.player_at(0.0, 0.0);
        sim.ctx.input.set_pointer(1, Vec2::new(0.5, 0.5), false, 0.0);
        sim.ctx.input.gamepads.push(GamepadState {
            axes: vec![0.0, 0.0, 0.0, -1.0],
            buttons: Vec::new(),
            connected: true,
        });
        sim.frame(0.1);

        let shots = sim.projectiles();
        assert_eq!(shots.len(), 1);
        let state = sim.ctx.world.state::<ProjectileState>(shots[0]).unwrap();
        assert!(state.velocity.distance(Vec3::new(0.0, 3.0, 0.0)) < 1e-4);
    }

    #[test]
    fn projectile_expires_after_life_ticks() {
        let mut sim = Sim::new();
        sim.ctx.config.projectile.life = 3;
        let spell = sim.spell(STEP);
        let shot = cast(&mut sim.ctx, &spell, Vec3::ZERO, Vec3::X).unwrap();
        sim.frame(0.1);
        sim.frame(0.1);
        assert!(sim.ctx.world.is_alive(shot));
        sim.frame(0.1);
        assert!(!sim.ctx.world.is_alive(shot));
    }

    #[test]
    fn projectile_moves_by_velocity_times_delta() {
        let mut sim = Sim::new();
        let spell = sim.spell("return |d, p, v| { p.x += v.x * d; };");
        let shot = cast(&mut sim.ctx, &spell, Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)).unwrap();
        sim.frame(0.25);
        assert!((sim.ctx.world.position(shot).unwrap().x - 0.5).abs() < 1e-5);
        sim.frame(0.5);
        assert!((sim.ctx.world.position(shot).unwrap().x - 1.5).abs() < 1e-5);
    }

    #[test]
    fn velocity_changes_persist() {
        let mut sim = Sim::new();
        let spell = sim.spell("|d, p, v| { v.scale(2); }");
        let shot = cast(&mut sim.ctx, &spell, Vec3::ZERO, Vec3::X).unwrap();
        sim.frame(0.1);
        sim.frame(0.1);
        let state = sim.ctx.world.state::<ProjectileState>(shot).unwrap();
        assert_eq!(state.velocity, Vec3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn failing_spell_is_removed_on_next_tick() {
        let mut sim = Sim::new();
        let bad = sim.spell(r#"|d, p, v| { throw "fizzle"; }"#);
        let good = sim.spell(STEP);
        let broken = cast(&mut sim.ctx, &bad, Vec3::ZERO, Vec3::X).unwrap();
        let fine = cast(&mut sim.ctx, &good, Vec3::ZERO, Vec3::X).unwrap();

        sim.frame(0.1);
        assert!(sim.ctx.world.is_alive(broken));
        assert_eq!(sim.ctx.world.state::<ProjectileState>(broken).unwrap().life, 0);
        assert!(sim.ctx.world.position(fine).unwrap().x > 0.0);

        sim.frame(0.1);
        assert!(!sim.ctx.world.is_alive(broken));
        assert!(sim.ctx.world.is_alive(fine));
        assert!(sim.scheduler.is_running());
    }

    #[test]
    fn hit_removes_nearest_hostile_and_projectile() {
        let mut sim = Sim::new();
        let near = sim.ctx.world.create(ActorSpec::at(Vec3::new(0.3, 0.0, 0.0)).tag(tags::HOSTILE));
        let far = sim.ctx.world.create(ActorSpec::at(Vec3::new(0.7, 0.0, 0.0)).tag(tags::HOSTILE));
        let bystander = sim.ctx.world.create(ActorSpec::at(Vec3::new(0.1, 0.0, 0.0)).tag("other"));
        let spell = sim.spell(STEP);
        let shot = cast(&mut sim.ctx, &spell, Vec3::ZERO, Vec3::ZERO).unwrap();

        sim.frame(0.1);
        assert!(!sim.ctx.world.is_alive(shot));
        assert!(!sim.ctx.world.is_alive(near));
        assert!(sim.ctx.world.is_alive(far));
        assert!(sim.ctx.world.is_alive(bystander));
    }

    #[test]
    fn casts_do_not_share_captured_state() {
        let mut sim = Sim::new();
        let spell = sim.spell("let n = 0; |d, p, v| { n += 1; p.y = n; }");
        let first = cast(&mut sim.ctx, &spell, Vec3::ZERO, Vec3::ZERO).unwrap();
        sim.frame(0.1);
        sim.frame(0.1);
        let second = cast(&mut sim.ctx, &spell, Vec3::ZERO, Vec3::ZERO).unwrap();
        sim.frame(0.1);
        assert_eq!(sim.ctx.world.position(first).unwrap().y, 3.0);
        assert_eq!(sim.ctx.world.position(second).unwrap().y, 1.0);
    }
}
