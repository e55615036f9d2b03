//! Entry point and game loop.

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::{execute, terminal};

use ritz::ui::input::InputState;
use ritz::ui::renderer::Renderer;
use ritz::ui::sound::SoundEngine;
use ritz::{load_levels, step, GameConfig, GameEvent, WorldState};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    let levels = match load_levels(&config) {
        Ok(levels) => levels,
        Err(e) => {
            eprintln!("Could not load levels: {e}");
            std::process::exit(1);
        }
    };
    let mut world = match WorldState::new(levels, config) {
        Ok(world) => world,
        Err(e) => {
            eprintln!("Invalid level: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }
    let enhanced = enable_release_events();

    let sound = SoundEngine::new();
    let mut input = InputState::new();
    input.honor_release = enhanced;

    let result = game_loop(&mut world, &mut renderer, &mut input, sound.as_ref());

    if enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Ritz!");
    println!("Final Score: {}", world.score);
}

/// Ask the terminal for key Release events. Returns whether it agreed.
fn enable_release_events() -> bool {
    if !terminal::supports_keyboard_enhancement().unwrap_or(false) {
        return false;
    }
    execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok()
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    input: &mut InputState,
    sound: Option<&SoundEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick_rate = Duration::from_millis(world.config.physics.tick_rate_ms);
    let mut last_tick = Instant::now();

    loop {
        input.drain_events();
        if input.quit_requested() {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            if world.is_running() {
                let controls = input.take_controls();
                let mut events = step(world, &controls);
                events.extend(world.apply_signal()?);
                play_cues(sound, &events);
            }
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn play_cues(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let Some(sfx) = sound else { return };
    for cue in events.iter().filter_map(GameEvent::cue) {
        sfx.play(cue);
    }
}
