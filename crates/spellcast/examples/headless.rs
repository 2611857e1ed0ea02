//! Headless run: the full simulation without a renderer.
//!
//! Plays 20 seconds at 60 fps with scripted input: the player strafes side to side,
//! holds the pointer to cast at the center of the view and taps Space now and
//! then to drop extra hostiles.
//!
//! ```text
//! RUST_LOG=info cargo run --example headless -- [config.json] [spell.rhai]
//! ```
//!
//! With a spell file, edit and save it while the example runs to watch the
//! new version take over.

use spellcast::prelude::*;

const FPS: f32 = 60.0;
const FRAMES: u32 = 20 * 60;

fn main() -> SimResult<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    let visuals = HeadlessVisuals::new();
    let ledger = visuals.ledger();
    let mut game = Game::new(visuals, HeadlessViewport::default(), config);
    if let Some(path) = args.next() {
        if !game.watch_spell_file(&path) {
            log::warn!("Could not watch '{path}', casting the default spell");
        }
    }

    game.play(0.0);
    for frame in 1..=FRAMES {
        let now = frame as f32 / FPS;
        scripted_input(game.input_mut(), frame, now);
        game.frame(now)?;
        if frame % 120 == 0 {
            let world = game.world();
            log::info!(
                "t={now:>5.1}s  hostiles={:<3} projectiles={:<3} actors={}",
                world.get_by_tags(&[tags::HOSTILE]).len(),
                world.get_by_tags(&[tags::PROJECTILE]).len(),
                world.entity_count()
            );
        }
    }
    game.pause();

    let ledger = ledger.borrow();
    log::info!(
        "Done: {} visuals created, {} disposed, {} still live",
        ledger.created(),
        ledger.disposed(),
        ledger.live()
    );
    Ok(())
}

fn scripted_input(input: &mut InputSnapshot, frame: u32, now: f32) {
    let at = f64::from(now) * 1000.0;
    let sway = (now * 0.5).sin();
    if sway > 0.0 {
        input.release("KeyA", at);
        input.press("KeyD", at);
    } else {
        input.release("KeyD", at);
        input.press("KeyA", at);
    }
    if frame % 300 < 10 {
        input.press("Space", at);
    } else {
        input.release("Space", at);
    }
    let aim = Vec2::new(sway * 0.3, 0.2);
    input.set_pointer(1, aim, frame > 30, at);
}
