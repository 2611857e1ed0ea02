//! The control surface a host drives.
//!
//! [`Game`] owns the simulation [`Context`], the [`Scheduler`], the host's
//! [`Viewport`] and the [`SpellLibrary`]. A host builds one, starts it with
//! [`play`](Game::play), then calls [`frame`](Game::frame) from its frame
//! callback with the current clock reading.
//!
//! # Example
//!
//! ```ignore
//! use spellcast::prelude::*;
//!
//! let mut game = Game::new(HeadlessVisuals::new(), HeadlessViewport::default(), SimConfig::default());
//! game.play(0.0);
//! let spell = game.compile("|d, p, v| { p.add_scaled(v, d); }")?;
//! game.set_spell(spell);
//! loop {
//!     game.set_input(capture_input());
//!     game.frame(clock_secs())?;
//! }
//! ```

use std::path::Path;

use glam::Vec3;

use crate::behavior::{Chase, PlayerControl};
use crate::config::{SimConfig, tags};
use crate::context::Context;
use crate::ecs::{ActorSpec, World};
use crate::error::{CompileError, SimResult};
use crate::input::InputSnapshot;
use crate::scheduler::{FrameRequest, Scheduler};
use crate::spawner::{KeySpawner, Spawner, hostile};
use crate::spell::{Spell, SpellCaster, SpellLibrary, SpellWatcher};
use crate::visual::{Viewport, VisualProvider};

/// Schedule label of the system casting the active spell.
pub const SPELL_CASTER: &str = "spell-caster";

/// Spell active after construction and after [`Game::reset_spell`].
pub const DEFAULT_SPELL: &str = "straight";

pub struct Game {
    ctx: Context,
    scheduler: Scheduler,
    viewport: Box<dyn Viewport>,
    library: SpellLibrary,
    spell: Option<Spell>,
    watcher: Option<SpellWatcher>,
}

impl Game {
    /// Build the starting scene: a player, one chasing hostile, a spawner
    /// den and the default spell. The game starts paused.
    pub fn new(
        visuals: impl VisualProvider + 'static,
        viewport: impl Viewport + 'static,
        config: SimConfig,
    ) -> Self {
        let library = SpellLibrary::with_builtins(&config.script, config.seed);
        let mut game = Self {
            ctx: Context::new(visuals, config),
            scheduler: Scheduler::new(),
            viewport: Box::new(viewport),
            library,
            spell: None,
            watcher: None,
        };
        game.setup_scene();
        game.reset_spell();
        game
    }

    fn setup_scene(&mut self) {
        let ctx = &mut self.ctx;
        let player = ctx.world.create(
            ActorSpec::at(Vec3::new(1.0, 1.0, 0.0))
                .named("player")
                .tag(tags::PLAYER)
                .behavior(PlayerControl),
        );
        ctx.blackboard.player = Some(player);

        ctx.world
            .create(hostile(Vec3::new(-1.0, -1.0, 0.0)).behavior(Chase::new(ctx.config.chase_speed)));

        let spawner = Spawner::new(ctx, Vec3::ZERO);
        self.scheduler.add_system("key-spawner", KeySpawner::new());
        self.scheduler.add_system("spawner", spawner);
        log::info!("Scene ready: {} actors", self.ctx.world.entity_count());
    }

    // ── Frame loop ───────────────────────────────────────────────────

    /// Start running. Returns the request the next frame should carry.
    pub fn play(&mut self, now: f32) -> FrameRequest {
        self.scheduler.play(now)
    }

    pub fn pause(&mut self) {
        self.scheduler.pause();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn pending_frame(&self) -> Option<FrameRequest> {
        self.scheduler.pending()
    }

    /// Pick up reloaded spells, then run the pending frame at `now`
    /// (seconds). Returns `Ok(false)` when paused.
    pub fn frame(&mut self, now: f32) -> SimResult<bool> {
        self.poll_watcher();
        match self.scheduler.pending() {
            Some(request) => self.run_frame(request, now),
            None => Ok(false),
        }
    }

    /// Run the frame `request` was issued for. Stale requests do nothing.
    pub fn run_frame(&mut self, request: FrameRequest, now: f32) -> SimResult<bool> {
        self.scheduler
            .run_frame(request, now, &mut self.ctx, self.viewport.as_mut())
    }

    // ── Spells ───────────────────────────────────────────────────────

    /// Compile a spell without activating it. Nothing in the running
    /// simulation changes, whatever the outcome.
    pub fn compile(&self, source: &str) -> Result<Spell, CompileError> {
        self.library.compile(source)
    }

    /// Make `spell` the one cast from now on. Projectiles already in flight
    /// keep the spell they were cast with.
    pub fn set_spell(&mut self, spell: Spell) {
        log::info!("Active spell is now '{}'", spell.name());
        self.scheduler
            .systems_mut()
            .replace(SPELL_CASTER, SpellCaster::new(spell.clone()));
        self.spell = Some(spell);
    }

    /// Go back to the built-in default spell.
    pub fn reset_spell(&mut self) {
        match self.library.get(DEFAULT_SPELL).cloned() {
            Some(spell) => self.set_spell(spell),
            None => log::error!("Built-in spell '{DEFAULT_SPELL}' is missing"),
        }
    }

    pub fn spell(&self) -> Option<&Spell> {
        self.spell.as_ref()
    }

    pub fn library(&self) -> &SpellLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut SpellLibrary {
        &mut self.library
    }

    /// Load the spell at `path` now and keep reloading it whenever the file
    /// changes. A version that fails to compile is logged and the active
    /// spell stays.
    pub fn watch_spell_file(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map_or_else(|| "watched".to_string(), |s| s.to_string_lossy().into_owned());
        let watcher = self.watcher.get_or_insert_with(SpellWatcher::new);
        if !watcher.watch(path, name) {
            return false;
        }
        if let Some(spell) = watcher.load_all(&self.library).pop() {
            self.set_spell(spell);
        }
        true
    }

    fn poll_watcher(&mut self) {
        let Some(watcher) = &mut self.watcher else {
            return;
        };
        if let Some(spell) = watcher.reload(&self.library).pop() {
            self.set_spell(spell);
        }
    }

    // ── World & input ────────────────────────────────────────────────

    /// Remove every actor carrying all of `tags`. Returns how many went.
    pub fn remove_by_tags<S: AsRef<str>>(&mut self, tags: &[S]) -> usize {
        let removed = self.ctx.world.remove_by_tags(tags);
        log::info!("Removed {removed} actors by tag");
        removed
    }

    /// Replace the input the next frame sees.
    pub fn set_input(&mut self, input: InputSnapshot) {
        self.ctx.input = input;
    }

    pub fn input_mut(&mut self) -> &mut InputSnapshot {
        &mut self.ctx.input
    }

    pub fn world(&self) -> &World {
        &self.ctx.world
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::visual::{HeadlessViewport, HeadlessVisuals};

    fn game() -> Game {
        Game::new(HeadlessVisuals::new(), HeadlessViewport::default(), SimConfig::default())
    }

    #[test]
    fn starts_paused_with_scene() {
        let mut game = game();
        assert!(!game.is_running());
        assert!(game.context().blackboard.player.is_some());
        assert_eq!(game.world().get_by_tags(&[tags::HOSTILE]).len(), 1);
        assert_eq!(game.spell().unwrap().name(), DEFAULT_SPELL);
        assert_eq!(
            game.scheduler().systems().labels().collect::<Vec<_>>(),
            ["key-spawner", "spawner", SPELL_CASTER]
        );
        assert!(!game.frame(0.1).unwrap());
    }

    #[test]
    fn frames_run_only_while_playing() {
        let mut game = game();
        game.play(0.0);
        assert!(game.frame(0.1).unwrap());
        assert!(game.frame(0.2).unwrap());
        game.pause();
        assert!(!game.frame(0.3).unwrap());
        assert_eq!(game.context().time.frame_count(), 2);
    }

    #[test]
    fn stale_request_is_ignored() {
        let mut game = game();
        let first = game.play(0.0);
        assert!(game.run_frame(first, 0.1).unwrap());
        assert!(!game.run_frame(first, 0.2).unwrap());
    }

    #[test]
    fn failed_compile_keeps_active_spell() {
        let mut game = game();
        assert!(game.compile("not valid syntax {{{").is_err());
        assert_eq!(game.spell().unwrap().name(), DEFAULT_SPELL);
    }

    #[test]
    fn set_spell_replaces_caster_in_place() {
        let mut game = game();
        let spell = game.compile("|d, p, v| { p.y += d; }").unwrap();
        game.set_spell(spell);
        assert_eq!(game.spell().unwrap().name(), "untitled");
        assert_eq!(game.scheduler().systems().len(), 3);
        game.reset_spell();
        assert_eq!(game.spell().unwrap().name(), DEFAULT_SPELL);
    }

    #[test]
    fn clicking_casts_active_spell() {
        let mut game = game();
        game.play(0.0);
        game.input_mut().set_pointer(1, Vec2::ZERO, true, 0.0);
        game.frame(0.1).unwrap();
        let shots = game.world().get_by_tags(&[tags::PROJECTILE]);
        assert_eq!(shots.len(), 1);
        assert_eq!(game.world().get(shots[0]).unwrap().name, "straight projectile");
    }

    #[test]
    fn remove_by_tags_clears_hostiles() {
        let mut game = game();
        assert_eq!(game.remove_by_tags(&[tags::HOSTILE]), 1);
        assert!(game.world().get_by_tags(&[tags::HOSTILE]).is_empty());
        assert!(game.context().player_position().is_some());
    }
}
