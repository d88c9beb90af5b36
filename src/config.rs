/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to the built-in constants if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub display: DisplayConfig,
    pub player: PlayerConfig,
    pub mask: MaskConfig,
    pub scoring: ScoringConfig,
    pub audio: AudioConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    pub log_file: PathBuf,
    pub cheats: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Pixel units per grid cell. Player movement is interpolated in these units.
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    #[serde(default = "default_grid_width")]
    pub grid_width: usize,
    #[serde(default = "default_grid_height")]
    pub grid_height: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PlayerConfig {
    /// Pixels per second.
    #[serde(default = "default_player_speed")]
    pub speed: f32,
}

/// Global mask defaults; a level may override both.
#[derive(Clone, Debug, Deserialize)]
pub struct MaskConfig {
    #[serde(default = "default_mask_duration")]
    pub duration: f32,
    #[serde(default = "default_mask_cooldown")]
    pub cooldown: f32,
}

/// Global scoring defaults; a level may override both.
#[derive(Clone, Debug, Deserialize)]
pub struct ScoringConfig {
    /// Seconds for 3, 2, 1 stars.
    #[serde(default = "default_time_thresholds")]
    pub time_thresholds: Vec<f32>,
    /// Mask uses allowed before the star penalty.
    #[serde(default = "default_mask_threshold")]
    pub mask_threshold: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_music_volume")]
    pub music_volume: f32,
    /// Delay between the intro jingle and the background track.
    #[serde(default = "default_music_delay")]
    pub music_delay_secs: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GamepadConfig {
    #[serde(default = "default_pad_mask")]
    pub mask: Vec<String>,
    #[serde(default = "default_pad_confirm")]
    pub confirm: Vec<String>,
    #[serde(default = "default_pad_cancel")]
    pub cancel: Vec<String>,
    #[serde(default = "default_pad_restart")]
    pub restart: Vec<String>,
    #[serde(default = "default_pad_editor")]
    pub editor: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    display: DisplayConfig,
    #[serde(default)]
    player: PlayerConfig,
    #[serde(default)]
    mask: MaskConfig,
    #[serde(default)]
    scoring: ScoringConfig,
    #[serde(default)]
    audio: AudioConfig,
    #[serde(default)]
    gamepad: GamepadConfig,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default)]
    cheats: bool,
}

// ── Defaults ──

fn default_fps() -> u32 { 60 }
fn default_tile_size() -> f32 { 40.0 }
fn default_grid_width() -> usize { 11 }
fn default_grid_height() -> usize { 10 }
fn default_player_speed() -> f32 { 200.0 }
fn default_mask_duration() -> f32 { 2.0 }
fn default_mask_cooldown() -> f32 { 5.0 }
fn default_time_thresholds() -> Vec<f32> { vec![30.0, 60.0, 120.0] }
fn default_mask_threshold() -> u32 { 5 }
fn default_music_volume() -> f32 { 0.5 }
fn default_music_delay() -> f32 { 2.85 } // intro jingle length

fn default_pad_mask() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_pad_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_pad_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_pad_restart() -> Vec<String> { vec!["Y".into()] }
fn default_pad_editor() -> Vec<String> { vec!["L1".into()] }
fn default_levels_dir() -> String { "levels".into() }
fn default_log_file() -> String { "floor_is_a_lie.log".into() }

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            fps: default_fps(),
            tile_size: default_tile_size(),
            grid_width: default_grid_width(),
            grid_height: default_grid_height(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig { speed: default_player_speed() }
    }
}

impl Default for MaskConfig {
    fn default() -> Self {
        MaskConfig { duration: default_mask_duration(), cooldown: default_mask_cooldown() }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            time_thresholds: default_time_thresholds(),
            mask_threshold: default_mask_threshold(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig {
            music_volume: default_music_volume(),
            music_delay_secs: default_music_delay(),
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        GamepadConfig {
            mask: default_pad_mask(),
            confirm: default_pad_confirm(),
            cancel: default_pad_cancel(),
            restart: default_pad_restart(),
            editor: default_pad_editor(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            log_file: default_log_file(),
            cheats: false,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_dir_str = &cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            display: cfg.display,
            player: cfg.player,
            mask: cfg.mask,
            scoring: cfg.scoring,
            audio: cfg.audio,
            gamepad: cfg.gamepad,
            levels_dir,
            log_file: PathBuf::from(cfg.general.log_file),
            cheats: cfg.general.cheats,
        }
    }

    /// Seconds per simulation step.
    pub fn frame_time(&self) -> f32 {
        1.0 / self.display.fps.max(1) as f32
    }

    /// Top-left pixel of a grid cell.
    pub fn grid_to_screen(&self, gx: i32, gy: i32) -> (f32, f32) {
        let t = self.display.tile_size;
        (gx as f32 * t, gy as f32 * t)
    }

    /// Centre pixel of a grid cell.
    pub fn grid_center(&self, gx: i32, gy: i32) -> (f32, f32) {
        let (x, y) = self.grid_to_screen(gx, gy);
        let half = self.display.tile_size / 2.0;
        (x + half, y + half)
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() { continue; }
        match std::fs::read_to_string(&path) {
            Ok(text) => return parse_toml(&text),
            Err(e) => log::warn!("could not read {}: {e}", path.display()),
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("config.toml parse error: {e}; using default settings");
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_builtin_constants() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.display.fps, 60);
        assert_eq!(cfg.display.grid_width, 11);
        assert_eq!(cfg.display.grid_height, 10);
        assert_eq!(cfg.scoring.time_thresholds, vec![30.0, 60.0, 120.0]);
        assert_eq!(cfg.scoring.mask_threshold, 5);
        assert!(!cfg.cheats);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg = parse_toml("[mask]\nduration = 3.5\n[general]\ncheats = true\n");
        assert!((cfg.mask.duration - 3.5).abs() < f32::EPSILON);
        assert!((cfg.mask.cooldown - 5.0).abs() < f32::EPSILON);
        assert!(cfg.general.cheats);
        assert_eq!(cfg.general.levels_dir, "levels");
    }

    #[test]
    fn player_section_only_sets_speed() {
        // older files may still carry `size`; it is ignored
        let cfg = parse_toml("[player]\nspeed = 150.0\nsize = 32.0\n");
        assert!((cfg.player.speed - 150.0).abs() < f32::EPSILON);
        assert!((cfg.mask.duration - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn malformed_toml_falls_back() {
        let cfg = parse_toml("[mask\nduration = ");
        assert!((cfg.mask.duration - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn grid_conversions() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.grid_to_screen(2, 3), (80.0, 120.0));
        assert_eq!(cfg.grid_center(0, 0), (20.0, 20.0));
    }
}
