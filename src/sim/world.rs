/// WorldState: the complete snapshot of a running game.
///
/// The active `level` is a working copy. The editor mutates it in place, and
/// restarting keeps playing that copy; only changing level index reloads
/// from disk.

use log::{debug, info};

use crate::config::GameConfig;
use crate::domain::player::Player;
use crate::domain::score::ScoreSystem;
use crate::sim::editor::Editor;
use crate::sim::level::{Level, LevelCatalog};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Menu,
    Playing,
    /// Death animation running; input ignored.
    Dying,
    LevelClear,
    GameOver,
    Editor,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeathCause {
    Void,
    FakeTile,
}

pub struct WorldState {
    pub phase: Phase,
    pub level: Level,
    pub catalog: LevelCatalog,
    pub level_index: usize,

    pub player: Player,
    pub score: ScoreSystem,
    pub editor: Editor,
    pub death_cause: Option<DeathCause>,

    // ── Timers ──
    /// Seconds until the background track starts; `None` once started.
    pub music_countdown: Option<f32>,
    pub tick: u64,

    // ── UI ──
    pub message: String,
    pub message_timer: f32,
}

impl WorldState {
    /// Loads the first level and waits on the menu.
    pub fn new(config: &GameConfig, catalog: LevelCatalog) -> Self {
        let level = catalog.load_level(0, config);
        let player = Player::new(config, level.start_pos);
        let score = ScoreSystem::new(&config.scoring);
        let mut world = WorldState {
            phase: Phase::Menu,
            level,
            catalog,
            level_index: 0,
            player,
            score,
            editor: Editor::new(),
            death_cause: None,
            music_countdown: None,
            tick: 0,
            message: String::new(),
            message_timer: 0.0,
        };
        world.apply_level_tunables();
        world
    }

    /// Replace the active level and reset the attempt.
    pub fn install_level(&mut self, index: usize, level: Level) {
        info!("level {} '{}' ({}×{})", index + 1, level.name, level.width(), level.height());
        debug!("{:?}", level.info());
        self.level_index = index;
        self.level = level;
        self.reset_attempt();
    }

    /// Player back on start, score cleared, level tunables re-applied.
    pub fn reset_attempt(&mut self) {
        self.player.reset(self.level.start_pos);
        self.score.reset();
        self.apply_level_tunables();
        self.death_cause = None;
        self.tick = 0;
    }

    fn apply_level_tunables(&mut self) {
        self.player.set_config(Some(self.level.mask_duration), Some(self.level.mask_cooldown));
        self.score.set_config(Some(&self.level.time_thresholds), Some(self.level.mask_threshold));
    }

    pub fn set_message(&mut self, msg: &str, seconds: f32) {
        self.message = msg.to_string();
        self.message_timer = seconds;
    }

    pub fn tick_message(&mut self, dt: f32) {
        if self.message_timer > 0.0 {
            self.message_timer -= dt;
            if self.message_timer <= 0.0 {
                self.message.clear();
                self.message_timer = 0.0;
            }
        }
    }

    pub fn level_count(&self) -> usize {
        self.catalog.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::TileType;

    fn world() -> WorldState {
        let cfg = GameConfig::default();
        let dir = std::env::temp_dir().join("floor_is_a_lie_world_no_levels");
        WorldState::new(&cfg, LevelCatalog::load(&dir))
    }

    #[test]
    fn starts_on_menu_with_fallback_level() {
        let w = world();
        assert_eq!(w.phase, Phase::Menu);
        assert_eq!(w.level_index, 0);
        assert_eq!(w.player.grid_position(), w.level.start_pos);
        assert_eq!(w.level_count(), 1);
    }

    #[test]
    fn install_level_applies_tunables() {
        let mut w = world();
        let cfg = GameConfig::default();
        let mut level = Level::from_types("Tiny", vec![vec![TileType::Start, TileType::Exit]], &cfg).unwrap();
        level.mask_duration = 1.0;
        level.mask_cooldown = 3.0;
        level.time_thresholds = vec![1.0, 2.0, 3.0];
        level.mask_threshold = 0;
        w.install_level(0, level);

        assert!((w.player.mask_duration - 1.0).abs() < f32::EPSILON);
        assert!((w.player.mask_cooldown - 3.0).abs() < f32::EPSILON);
        assert_eq!(w.score.time_thresholds, vec![1.0, 2.0, 3.0]);
        assert_eq!(w.score.mask_threshold, 0);
        assert_eq!(w.player.grid_position(), (0, 0));
    }

    #[test]
    fn message_expires() {
        let mut w = world();
        w.set_message("Saved", 0.5);
        w.tick_message(0.3);
        assert_eq!(w.message, "Saved");
        w.tick_message(0.3);
        assert!(w.message.is_empty());
    }
}
