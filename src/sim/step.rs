/// The step function: advances the world by one fixed timestep.
///
/// Processing order while playing:
///   1. Player input (held direction → next target)
///   2. Player update (movement, animation, mask timers)
///   3. Score clock
///   4. Tile check under the player: exit → win, void / unmasked fake → death
///
/// Death does not end the attempt immediately: the death animation runs in
/// `Phase::Dying` and `Phase::GameOver` follows once it completes.
///
/// Phase transitions triggered by the player (restart, continue, editor) are
/// the `pub fn`s at the bottom; each returns the events it produced.

use log::{debug, info, warn};

use crate::config::GameConfig;
use crate::domain::player::{MaskChange, MaskToggle, MoveDir};
use super::event::GameEvent;
use super::world::{DeathCause, Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, movement: Option<MoveDir>, dt: f32) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();

    world.tick = world.tick.wrapping_add(1);
    world.tick_message(dt);
    resolve_music(world, dt, &mut events);

    match world.phase {
        Phase::Playing => update_playing(world, movement, dt, &mut events),
        Phase::Dying => update_dying(world, dt, &mut events),
        _ => {}
    }

    events
}

fn resolve_music(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    if let Some(remaining) = world.music_countdown.as_mut() {
        *remaining -= dt;
        if *remaining <= 0.0 {
            world.music_countdown = None;
            events.push(GameEvent::MusicStart);
        }
    }
}

pub fn update_playing(world: &mut WorldState, movement: Option<MoveDir>, dt: f32, events: &mut Vec<GameEvent>) {
    world.player.handle_input(movement, Some(&world.level));
    match world.player.update(dt) {
        Some(MaskChange::Expired) => events.push(GameEvent::MaskRecharging),
        Some(MaskChange::Recharged) => events.push(GameEvent::MaskReady),
        None => {}
    }
    world.score.update(dt);

    let pos = world.player.grid_position();
    if world.level.is_exit_tile(pos) {
        resolve_win(world, events);
    } else if !world.level.is_valid_position(pos) || world.level.is_empty_tile(pos) {
        warn!("player fell into the void at {:?}", pos);
        events.push(GameEvent::PlayerFell);
        player_die(world, DeathCause::Void);
    } else if world.level.is_fake_tile(pos) && !world.player.mask_active {
        warn!("player stepped on a fake tile at {:?}", pos);
        events.push(GameEvent::FakeTileFall);
        player_die(world, DeathCause::FakeTile);
    }
}

fn update_dying(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    world.player.update_animation(dt);
    if world.player.is_death_animation_complete() {
        info!("game over on level {}", world.level_index + 1);
        world.phase = Phase::GameOver;
        events.push(GameEvent::GameOver);
    }
}

fn resolve_win(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    world.score.complete_level();
    let stars = world.score.stars;
    info!(
        "level {} complete in {} with {} mask use(s): {} star(s)",
        world.level_index + 1,
        world.score.time_formatted(Some(world.score.final_time)),
        world.score.final_mask_uses,
        stars,
    );
    debug!("final stats: {:?}", world.score.current_stats());
    world.phase = Phase::LevelClear;
    events.push(GameEvent::LevelComplete { stars });
}

fn player_die(world: &mut WorldState, cause: DeathCause) {
    world.player.start_death_animation();
    world.death_cause = Some(cause);
    world.phase = Phase::Dying;
}

// ══════════════════════════════════════════════════════════════
// Player actions
// ══════════════════════════════════════════════════════════════

pub fn toggle_mask(world: &mut WorldState) -> Option<GameEvent> {
    if world.phase != Phase::Playing {
        return None;
    }
    match world.player.toggle_mask() {
        MaskToggle::Activated => {
            world.score.add_mask_use();
            info!("mask use counted: {} total", world.score.mask_uses);
            Some(GameEvent::MaskActivated)
        }
        MaskToggle::Deactivated => Some(GameEvent::MaskRecharging),
        MaskToggle::Unavailable => Some(GameEvent::MaskUnavailable),
    }
}

/// Debug shortcut: drop the player on the exit. Off unless `[general] cheats = true`.
pub fn cheat_teleport_to_exit(world: &mut WorldState, config: &GameConfig) -> bool {
    if !config.cheats || world.phase != Phase::Playing {
        return false;
    }
    let (x, y) = world.level.exit_pos;
    info!("cheat: teleporting to exit {:?}", (x, y));
    world.player.teleport(x, y);
    true
}

// ══════════════════════════════════════════════════════════════
// Phase transitions
// ══════════════════════════════════════════════════════════════

/// Menu → first level.
pub fn start_game(world: &mut WorldState, config: &GameConfig) -> Vec<GameEvent> {
    info!("starting game");
    start_level(world, 0, config)
}

/// Retry the current level. Editor changes are kept.
pub fn restart_level(world: &mut WorldState, config: &GameConfig) -> Vec<GameEvent> {
    info!("restarting level {}", world.level_index + 1);
    world.reset_attempt();
    begin_play(world, config)
}

/// Next level; after the last one, back to level 1.
pub fn continue_to_next_level(world: &mut WorldState, config: &GameConfig) -> Vec<GameEvent> {
    let next = world.catalog.next_index(world.level_index);
    if next == 0 {
        info!("all levels completed; back to level 1");
    }
    start_level(world, next, config)
}

pub fn restart_from_level_one(world: &mut WorldState, config: &GameConfig) -> Vec<GameEvent> {
    info!("restarting from level 1");
    start_level(world, 0, config)
}

pub fn start_level(world: &mut WorldState, index: usize, config: &GameConfig) -> Vec<GameEvent> {
    let level = world.catalog.load_level(index, config);
    world.install_level(index, level);
    begin_play(world, config)
}

fn begin_play(world: &mut WorldState, config: &GameConfig) -> Vec<GameEvent> {
    world.phase = Phase::Playing;
    world.music_countdown = Some(config.audio.music_delay_secs);
    let name = world.level.name.clone();
    world.set_message(&name, 2.0);
    vec![GameEvent::LevelStarted { index: world.level_index }]
}

pub fn enter_editor(world: &mut WorldState) {
    let resumable = world.phase == Phase::Playing;
    world.editor.enter(&world.level, resumable);
    world.phase = Phase::Editor;
}

/// Edited levels restart on the edited copy; otherwise resume or retry.
pub fn exit_editor(world: &mut WorldState, config: &GameConfig) -> Vec<GameEvent> {
    if world.editor.modified || !world.editor.resumable {
        if world.editor.modified {
            info!("level was modified; restarting on the edited copy");
        }
        return restart_level(world, config);
    }
    world.phase = Phase::Playing;
    vec![]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::TileType;
    use crate::sim::level::{Level, LevelCatalog};

    const DT: f32 = 1.0 / 60.0;

    fn cfg() -> GameConfig {
        GameConfig::default()
    }

    /// `S` start, `X` exit, `#` real, `f` fake, `.` void.
    fn world_with(rows: &[&str]) -> WorldState {
        let cfg = cfg();
        let dir = std::env::temp_dir().join("floor_is_a_lie_step_no_levels");
        let mut world = WorldState::new(&cfg, LevelCatalog::load(&dir));
        let types = rows.iter().map(|r| r.chars().map(|c| match c {
            'S' => TileType::Start,
            'X' => TileType::Exit,
            '#' => TileType::Real,
            'f' => TileType::Fake,
            _ => TileType::Empty,
        }).collect()).collect();
        let level = Level::from_types("Test", types, &cfg).unwrap();
        world.install_level(0, level);
        world.phase = Phase::Playing;
        world
    }

    /// Hold a direction for up to `frames` frames, collecting events.
    fn hold(world: &mut WorldState, dir: Option<MoveDir>, frames: usize) -> Vec<GameEvent> {
        let mut all = vec![];
        for _ in 0..frames {
            all.extend(step(world, dir, DT));
        }
        all
    }

    #[test]
    fn reaching_exit_wins() {
        let mut w = world_with(&["S#X"]);
        let events = hold(&mut w, Some(MoveDir::Right), 60);
        assert_eq!(w.phase, Phase::LevelClear);
        assert!(events.contains(&GameEvent::LevelComplete { stars: 3 }));
        assert!(w.score.completed);
    }

    #[test]
    fn fake_tile_kills_without_mask() {
        let mut w = world_with(&["S#fX"]);
        let events = hold(&mut w, Some(MoveDir::Right), 60);
        assert_eq!(w.phase, Phase::Dying);
        assert_eq!(w.death_cause, Some(DeathCause::FakeTile));
        assert!(events.contains(&GameEvent::FakeTileFall));

        let events = hold(&mut w, None, 4 * 60);
        assert_eq!(w.phase, Phase::GameOver);
        assert_eq!(events.iter().filter(|e| **e == GameEvent::GameOver).count(), 1);
    }

    #[test]
    fn mask_protects_on_fake_tile() {
        let mut w = world_with(&["S#fX"]);
        assert_eq!(toggle_mask(&mut w), Some(GameEvent::MaskActivated));
        assert_eq!(w.score.mask_uses, 1);
        hold(&mut w, Some(MoveDir::Right), 60);
        assert_eq!(w.phase, Phase::LevelClear);
        assert_eq!(w.score.final_mask_uses, 1);
    }

    #[test]
    fn void_under_player_is_a_fall() {
        let mut w = world_with(&["S.X"]);
        // Void is not walkable, so only a teleport can land there.
        hold(&mut w, Some(MoveDir::Right), 30);
        assert_eq!(w.phase, Phase::Playing);
        w.player.teleport(1, 0);
        let events = step(&mut w, None, DT);
        assert!(events.contains(&GameEvent::PlayerFell));
        assert_eq!(w.death_cause, Some(DeathCause::Void));
    }

    #[test]
    fn mask_toggle_events() {
        let mut w = world_with(&["S#X"]);
        assert_eq!(toggle_mask(&mut w), Some(GameEvent::MaskActivated));
        assert_eq!(toggle_mask(&mut w), Some(GameEvent::MaskRecharging));
        assert_eq!(toggle_mask(&mut w), Some(GameEvent::MaskUnavailable));
        assert_eq!(w.score.mask_uses, 1);

        let events = hold(&mut w, None, 5 * 60 + 2);
        assert!(events.contains(&GameEvent::MaskReady));
    }

    #[test]
    fn mask_ignored_outside_play() {
        let mut w = world_with(&["S#X"]);
        w.phase = Phase::Menu;
        assert_eq!(toggle_mask(&mut w), None);
        assert_eq!(w.score.mask_uses, 0);
    }

    #[test]
    fn expiry_emits_recharging() {
        let mut w = world_with(&["S#X"]);
        toggle_mask(&mut w);
        let events = hold(&mut w, None, 2 * 60 + 2);
        assert!(events.contains(&GameEvent::MaskRecharging));
        assert!(!w.player.mask_active);
    }

    #[test]
    fn restart_keeps_edited_level_and_schedules_music() {
        let mut w = world_with(&["S#fX"]);
        hold(&mut w, Some(MoveDir::Right), 60);
        assert_eq!(w.phase, Phase::Dying);

        let events = restart_level(&mut w, &cfg());
        assert_eq!(events, vec![GameEvent::LevelStarted { index: 0 }]);
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.level.name, "Test");
        assert_eq!(w.player.grid_position(), (0, 0));
        assert_eq!(w.score.elapsed_time, 0.0);
        assert!(w.music_countdown.is_some());

        let events = hold(&mut w, None, 3 * 60);
        assert!(events.contains(&GameEvent::MusicStart));
        assert!(w.music_countdown.is_none());
    }

    #[test]
    fn continue_after_last_level_wraps() {
        let mut w = world_with(&["S#X"]);
        hold(&mut w, Some(MoveDir::Right), 60);
        let events = continue_to_next_level(&mut w, &cfg());
        assert_eq!(events, vec![GameEvent::LevelStarted { index: 0 }]);
        assert_eq!(w.level_index, 0);
        // No catalog on disk: the built-in level is loaded.
        assert_eq!(w.level.name, "Default Level");
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn cheat_is_config_gated() {
        let mut w = world_with(&["S##X"]);
        let mut config = cfg();
        assert!(!cheat_teleport_to_exit(&mut w, &config));
        config.cheats = true;
        assert!(cheat_teleport_to_exit(&mut w, &config));
        step(&mut w, None, DT);
        assert_eq!(w.phase, Phase::LevelClear);
    }

    #[test]
    fn editor_round_trip() {
        let mut w = world_with(&["S#X"]);
        enter_editor(&mut w);
        assert_eq!(w.phase, Phase::Editor);
        assert!(exit_editor(&mut w, &cfg()).is_empty(), "unmodified: resume");
        assert_eq!(w.phase, Phase::Playing);

        enter_editor(&mut w);
        w.editor.select(TileType::Fake);
        w.editor.paint(&mut w.level, (1, 0));
        let events = exit_editor(&mut w, &cfg());
        assert_eq!(events, vec![GameEvent::LevelStarted { index: 0 }]);
        assert!(w.level.is_fake_tile((1, 0)));
    }

    #[test]
    fn nothing_moves_outside_play() {
        let mut w = world_with(&["S#X"]);
        w.phase = Phase::LevelClear;
        hold(&mut w, Some(MoveDir::Right), 30);
        assert_eq!(w.player.grid_position(), (0, 0));
    }
}
