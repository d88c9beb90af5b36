/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use log::{error, info, warn};

use config::GameConfig;
use domain::player::MoveDir;
use sim::event::GameEvent;
use sim::level::LevelCatalog;
use sim::step;
use sim::world::{Phase, WorldState};
use ui::assets::AssetManager;
use ui::gamepad::{GamepadState, PadAction};
use ui::hud::ButtonAction;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{Sfx, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);
/// Longest stretch of simulation caught up in one frame.
const MAX_CATCH_UP_STEPS: u32 = 5;
const MESSAGE_SECS: f32 = 2.0;
const VOLUME_STEP: f32 = 0.1;

fn main() {
    let config = GameConfig::load();
    init_logging(&config);
    info!("config loaded; levels from {}", config.levels_dir.display());

    if let Err(e) = run(&config) {
        error!("fatal: {e:#}");
        eprintln!("Game error: {e:#}");
        std::process::exit(1);
    }
}

/// The terminal is in raw alternate-screen mode, so logs go to a file.
fn init_logging(config: &GameConfig) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match File::create(&config.log_file) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("Cannot open log file {}: {e}; logging disabled", config.log_file.display());
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

fn run(config: &GameConfig) -> Result<()> {
    let catalog = LevelCatalog::load(&config.levels_dir);
    let mut world = WorldState::new(config, catalog);

    let mut renderer = Renderer::new(AssetManager::with_defaults(), config.display.tile_size);
    renderer.init().context("terminal init failed")?;

    let mut sound = SoundEngine::new(config.audio.music_volume);
    if sound.is_none() {
        warn!("no audio output; playing silently");
    }

    let result = game_loop(&mut world, &mut renderer, &mut sound, config);

    if let Some(s) = sound.as_mut() {
        s.stop_music();
    }
    renderer.cleanup().context("terminal cleanup failed")?;
    result?;

    println!();
    println!("Thanks for playing The Floor Is a Lie!");
    Ok(())
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: &mut Option<SoundEngine>,
    config: &GameConfig,
) -> Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.key_releases();
    let mut gp = GamepadState::new(&config.gamepad);
    let mut music_volume = config.audio.music_volume;

    let dt = config.frame_time();
    let step_len = Duration::from_secs_f32(dt);
    let mut accumulator = Duration::ZERO;
    let mut last = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.letter_pressed('q') {
            info!("quit requested");
            break;
        }

        let events = handle_input(world, renderer, sound, &kb, &gp, config, &mut music_volume);
        process_sound_events(sound, &events);

        let now = Instant::now();
        accumulator = (accumulator + (now - last)).min(step_len * MAX_CATCH_UP_STEPS);
        last = now;

        while accumulator >= step_len {
            let movement = match world.phase {
                Phase::Playing => detect_movement(&kb, &gp),
                _ => None,
            };
            let events = step::step(world, movement, dt);
            process_sound_events(sound, &events);
            accumulator -= step_len;
        }

        renderer.render(world).context("render failed")?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn detect_movement(kb: &InputState, gp: &GamepadState) -> Option<MoveDir> {
    kb.movement().or_else(|| gp.movement())
}

fn process_sound_events(sound: &mut Option<SoundEngine>, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::LevelComplete { stars } => info!("level complete: {stars} star(s)"),
            GameEvent::GameOver => info!("game over"),
            _ => {}
        }
    }

    let Some(sfx) = sound.as_mut() else { return };
    for event in events {
        match event {
            GameEvent::LevelStarted { .. } => {
                sfx.stop_music();
                sfx.play(Sfx::ReachTheExit);
            }
            GameEvent::MusicStart => sfx.start_music(),
            GameEvent::MaskActivated => sfx.play(Sfx::MaskActivate),
            GameEvent::MaskRecharging => sfx.play(Sfx::MaskRecharging),
            GameEvent::MaskReady => sfx.play(Sfx::MaskReady),
            GameEvent::FakeTileFall => {
                sfx.play(Sfx::FakeTileFall);
                sfx.play(Sfx::FakeTileFallThump);
            }
            GameEvent::PlayerFell => sfx.play(Sfx::FakeTileFallThump),
            GameEvent::LevelComplete { .. } => sfx.play(Sfx::LevelComplete),
            GameEvent::MaskUnavailable | GameEvent::GameOver => {}
        }
    }
}

// ── Key Constants ──

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_VOLUME_UP: &[KeyCode] = &[KeyCode::Char('+'), KeyCode::Char('=')];
const KEYS_VOLUME_DOWN: &[KeyCode] = &[KeyCode::Char('-'), KeyCode::Char('_')];

fn handle_input(
    world: &mut WorldState,
    renderer: &Renderer,
    sound: &mut Option<SoundEngine>,
    kb: &InputState,
    gp: &GamepadState,
    config: &GameConfig,
    music_volume: &mut f32,
) -> Vec<GameEvent> {
    // Clicks are hit-tested against what the last frame drew.
    for &(col, row) in &kb.clicks {
        if let Some(action) = renderer.hit(col, row) {
            return apply_button(world, action, config);
        }
        if world.phase == Phase::Editor {
            if let Some(pos) = renderer.grid_cell(col, row) {
                world.editor.paint(&mut world.level, pos);
            }
        }
    }

    match world.phase {
        // ── Title Screen ──
        Phase::Menu => {
            if kb.any_key_pressed() || gp.pressed(PadAction::Confirm) {
                return step::start_game(world, config);
            }
        }

        // ── In Game ──
        Phase::Playing => {
            if kb.letter_pressed('m') || gp.pressed(PadAction::Mask) {
                return step::toggle_mask(world).into_iter().collect();
            }
            if kb.letter_pressed('r') || gp.pressed(PadAction::Restart) {
                return step::restart_level(world, config);
            }
            if kb.letter_pressed('e') || gp.pressed(PadAction::Editor) {
                step::enter_editor(world);
                return vec![];
            }
            if kb.letter_pressed('c') && step::cheat_teleport_to_exit(world, config) {
                world.set_message("Cheat: warped to exit", MESSAGE_SECS);
            }
            handle_audio_keys(world, sound, kb, music_volume);
        }

        Phase::Dying => {}

        // ── Results ──
        Phase::LevelClear => {
            if kb.letter_pressed('r') || gp.pressed(PadAction::Restart) {
                return step::restart_level(world, config);
            }
            if kb.letter_pressed('e') || gp.pressed(PadAction::Editor) {
                step::enter_editor(world);
                return vec![];
            }
            if kb.any_key_pressed() || gp.pressed(PadAction::Confirm) {
                return step::continue_to_next_level(world, config);
            }
        }

        Phase::GameOver => {
            if kb.letter_pressed('r') || kb.any_pressed(KEYS_CONFIRM)
                || gp.pressed(PadAction::Restart) || gp.pressed(PadAction::Confirm)
            {
                return step::restart_level(world, config);
            }
            if kb.was_pressed(KeyCode::Char('1')) {
                return step::restart_from_level_one(world, config);
            }
            if kb.letter_pressed('e') || gp.pressed(PadAction::Editor) {
                step::enter_editor(world);
                return vec![];
            }
        }

        // ── Level Editor ──
        Phase::Editor => {
            if kb.was_pressed(KeyCode::Esc) || gp.pressed(PadAction::Cancel) {
                return step::exit_editor(world, config);
            }
            if let Some(slot) = kb.digit_pressed() {
                world.editor.select_slot(slot);
            }
            if let Some(dir) = kb.movement_pressed().or_else(|| gp.movement_pressed()) {
                world.editor.move_cursor(dir, &world.level);
            }
            if kb.any_pressed(KEYS_CONFIRM) || gp.pressed(PadAction::Confirm) {
                world.editor.paint_at_cursor(&mut world.level);
            }
            if kb.ctrl_pressed('s') {
                editor_save(world, config);
            }
            if kb.letter_pressed('l') {
                editor_load(world, config);
            }
        }
    }

    vec![]
}

fn apply_button(world: &mut WorldState, action: ButtonAction, config: &GameConfig) -> Vec<GameEvent> {
    match action {
        ButtonAction::Continue => step::continue_to_next_level(world, config),
        ButtonAction::Restart => step::restart_level(world, config),
        ButtonAction::LevelOne => step::restart_from_level_one(world, config),
        ButtonAction::Editor => {
            step::enter_editor(world);
            vec![]
        }
        ButtonAction::SelectTile(kind) => {
            world.editor.select(kind);
            vec![]
        }
        ButtonAction::SaveLevel => {
            editor_save(world, config);
            vec![]
        }
        ButtonAction::LoadLevel => {
            editor_load(world, config);
            vec![]
        }
        ButtonAction::BackToGame => step::exit_editor(world, config),
    }
}

fn editor_save(world: &mut WorldState, config: &GameConfig) {
    match world.editor.save(&world.level, &config.levels_dir) {
        Ok(path) => {
            info!("level saved to {}", path.display());
            world.set_message(&format!("Saved {}", path.display()), MESSAGE_SECS);
        }
        Err(e) => {
            error!("saving '{}' failed: {e}", world.level.name);
            world.set_message("Save failed!", MESSAGE_SECS);
        }
    }
}

fn editor_load(world: &mut WorldState, config: &GameConfig) {
    match world.editor.load(&mut world.level, &config.levels_dir, config) {
        Ok(true) => world.set_message("Level loaded", MESSAGE_SECS),
        Ok(false) => world.set_message("No saved copy of this level", MESSAGE_SECS),
        Err(e) => {
            error!("loading '{}' failed: {e}", world.level.name);
            world.set_message("Load failed!", MESSAGE_SECS);
        }
    }
}

/// B: pause music, U: mute music, X: mute effects, +/-: music volume.
fn handle_audio_keys(
    world: &mut WorldState,
    sound: &mut Option<SoundEngine>,
    kb: &InputState,
    music_volume: &mut f32,
) {
    let Some(sfx) = sound.as_mut() else { return };

    if kb.letter_pressed('b') {
        let paused = sfx.toggle_music_pause();
        world.set_message(if paused { "Music paused" } else { "Music resumed" }, MESSAGE_SECS);
    }
    if kb.letter_pressed('u') {
        let muted = sfx.toggle_music_mute();
        world.set_message(if muted { "Music muted" } else { "Music unmuted" }, MESSAGE_SECS);
    }
    if kb.letter_pressed('x') {
        let muted = sfx.toggle_sfx_mute();
        world.set_message(if muted { "Sound effects muted" } else { "Sound effects on" }, MESSAGE_SECS);
    }

    let delta = if kb.any_pressed(KEYS_VOLUME_UP) {
        VOLUME_STEP
    } else if kb.any_pressed(KEYS_VOLUME_DOWN) {
        -VOLUME_STEP
    } else {
        return;
    };
    *music_volume = (*music_volume + delta).clamp(0.0, 1.0);
    sfx.set_music_volume(*music_volume);
    world.set_message(&format!("Music volume {:.0}%", *music_volume * 100.0), MESSAGE_SECS);
}
