/// Level data and the level list.
///
/// ## Level file (JSON):
///   ```json
///   {
///     "name": "Level 1",
///     "grid": [["start", "real", "fake"], ["empty", "real", "exit"]],
///     "config": {"mask_duration": 2.0, "mask_cooldown": 5.0,
///                "time_thresholds": [30, 60, 120], "mask_threshold": 5}
///   }
///   ```
///   Tile strings are case-insensitive (`empty real fake start exit`, or
///   `.`, `#`, `■`, `▫`). Missing config keys use the global defaults.
///
/// ## Level list (`levels_config.json`):
///   `{"levels": [{"name": "Level 1", "file": "level1.json"}, ...]}`
///   with files resolved relative to the levels directory.
///
/// ## Fallback order when a level cannot be loaded:
///   1. `default_level.json` in the levels directory
///   2. The built-in level below

use std::path::{Path, PathBuf};

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GameConfig;
use crate::domain::tile::{Tile, TileQuery, TileType};

pub const CATALOG_FILE: &str = "levels_config.json";
pub const DEFAULT_LEVEL_FILE: &str = "default_level.json";

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("level JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("level grid has no tiles")]
    EmptyGrid,
    #[error("level grid row {row} has {len} tiles, expected {width}")]
    RaggedRow { row: usize, len: usize, width: usize },
    #[error("no level at index {0}")]
    NotFound(usize),
}

// ── JSON Schema ──

#[derive(Serialize, Deserialize, Debug)]
struct LevelFile {
    #[serde(default = "default_level_name")]
    name: String,
    grid: Vec<Vec<String>>,
    #[serde(default)]
    config: LevelFileConfig,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct LevelFileConfig {
    mask_duration: Option<f32>,
    mask_cooldown: Option<f32>,
    time_thresholds: Option<Vec<f32>>,
    mask_threshold: Option<u32>,
}

fn default_level_name() -> String { "Unnamed Level".into() }

#[derive(Deserialize, Debug)]
struct CatalogFile {
    #[serde(default)]
    levels: Vec<CatalogEntry>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CatalogEntry {
    pub name: String,
    pub file: String,
}

// ── Built-in Level ──

/// `S` start, `X` exit, `#` real, `f` fake, `.` void.
const BUILTIN_ROWS: [&str; 10] = [
    "...........",
    ".S##f###...",
    ".#..#..#...",
    ".#..f..#...",
    ".###f#f##..",
    "...#...#...",
    "...#...##X.",
    "...###.....",
    "...........",
    "...........",
];

// ══════════════════════════════════════════════════════════════
// Level
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Level {
    pub name: String,
    grid: Vec<Vec<Tile>>,
    pub start_pos: (i32, i32),
    pub exit_pos: (i32, i32),
    pub mask_duration: f32,
    pub mask_cooldown: f32,
    pub time_thresholds: Vec<f32>,
    pub mask_threshold: u32,
}

/// Snapshot for logging and the editor status line.
#[derive(Clone, PartialEq, Debug)]
pub struct LevelInfo {
    pub name: String,
    pub dimensions: (usize, usize),
    pub start_pos: (i32, i32),
    pub exit_pos: (i32, i32),
    pub mask_duration: f32,
    pub mask_cooldown: f32,
    pub time_thresholds: Vec<f32>,
    pub mask_threshold: u32,
}

impl Level {
    /// Build from tile types. Start and exit are the last ones in row-major order.
    pub fn from_types(name: &str, rows: Vec<Vec<TileType>>, config: &GameConfig) -> Result<Self, LevelError> {
        let width = rows.first().map_or(0, |r| r.len());
        if width == 0 {
            return Err(LevelError::EmptyGrid);
        }
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(LevelError::RaggedRow { row, len: r.len(), width });
        }

        let mut start_pos = (0, 0);
        let mut exit_pos = (0, 0);
        let mut grid = Vec::with_capacity(rows.len());
        for (y, row) in rows.into_iter().enumerate() {
            let mut tiles = Vec::with_capacity(row.len());
            for (x, kind) in row.into_iter().enumerate() {
                match kind {
                    TileType::Start => start_pos = (x as i32, y as i32),
                    TileType::Exit => exit_pos = (x as i32, y as i32),
                    _ => {}
                }
                tiles.push(Tile::new(kind, x, y));
            }
            grid.push(tiles);
        }

        Ok(Level {
            name: name.to_string(),
            grid,
            start_pos,
            exit_pos,
            mask_duration: config.mask.duration,
            mask_cooldown: config.mask.cooldown,
            time_thresholds: config.scoring.time_thresholds.clone(),
            mask_threshold: config.scoring.mask_threshold,
        })
    }

    pub fn from_json(text: &str, config: &GameConfig) -> Result<Self, LevelError> {
        let file: LevelFile = serde_json::from_str(text)?;
        let rows = file.grid.iter()
            .map(|row| row.iter().map(|s| TileType::parse(s)).collect())
            .collect();

        let mut level = Level::from_types(&file.name, rows, config)?;
        let c = file.config;
        if let Some(d) = c.mask_duration { level.mask_duration = d; }
        if let Some(d) = c.mask_cooldown { level.mask_cooldown = d; }
        if let Some(t) = c.time_thresholds { level.time_thresholds = t; }
        if let Some(m) = c.mask_threshold { level.mask_threshold = m; }
        Ok(level)
    }

    pub fn load(path: &Path, config: &GameConfig) -> Result<Self, LevelError> {
        let text = std::fs::read_to_string(path)?;
        let level = Level::from_json(&text, config)?;
        if !level.is_start_tile(level.start_pos) {
            warn!("level '{}' has no start tile; spawning at {:?}", level.name, level.start_pos);
        }
        info!("loaded level '{}' from {}", level.name, path.display());
        Ok(level)
    }

    pub fn builtin(config: &GameConfig) -> Self {
        let rows = BUILTIN_ROWS.iter().map(|row| row.chars().map(|c| match c {
            'S' => TileType::Start,
            'X' => TileType::Exit,
            '#' => TileType::Real,
            'f' => TileType::Fake,
            _ => TileType::Empty,
        }).collect()).collect();

        match Level::from_types("Default Level", rows, config) {
            Ok(level) => level,
            Err(_) => unreachable!("built-in level grid is rectangular"),
        }
    }

    pub fn to_json(&self) -> Result<String, LevelError> {
        let file = LevelFile {
            name: self.name.clone(),
            grid: self.grid.iter()
                .map(|row| row.iter().map(|t| t.kind.as_str().to_string()).collect())
                .collect(),
            config: LevelFileConfig {
                mask_duration: Some(self.mask_duration),
                mask_cooldown: Some(self.mask_cooldown),
                time_thresholds: Some(self.time_thresholds.clone()),
                mask_threshold: Some(self.mask_threshold),
            },
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), LevelError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json()?)?;
        info!("saved level '{}' to {}", self.name, path.display());
        Ok(())
    }

    // ── Queries ──

    pub fn width(&self) -> usize {
        self.grid.first().map_or(0, |r| r.len())
    }

    pub fn height(&self) -> usize {
        self.grid.len()
    }

    pub fn is_valid_position(&self, (x, y): (i32, i32)) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width() && (y as usize) < self.height()
    }

    pub fn tile(&self, (x, y): (i32, i32)) -> Option<&Tile> {
        if !self.is_valid_position((x, y)) {
            return None;
        }
        self.grid.get(y as usize)?.get(x as usize)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.grid.iter().flatten()
    }

    pub fn is_walkable(&self, pos: (i32, i32), mask_active: bool) -> bool {
        self.tile(pos).is_some_and(|t| t.is_walkable(mask_active))
    }

    pub fn is_safe(&self, pos: (i32, i32), mask_active: bool) -> bool {
        self.tile(pos).is_some_and(|t| t.is_safe(mask_active))
    }

    fn is_kind(&self, pos: (i32, i32), kind: TileType) -> bool {
        self.tile(pos).is_some_and(|t| t.kind == kind)
    }

    pub fn is_empty_tile(&self, pos: (i32, i32)) -> bool {
        self.is_kind(pos, TileType::Empty)
    }

    pub fn is_fake_tile(&self, pos: (i32, i32)) -> bool {
        self.is_kind(pos, TileType::Fake)
    }

    /// Only the active exit counts, not every exit-typed tile.
    pub fn is_exit_tile(&self, pos: (i32, i32)) -> bool {
        pos == self.exit_pos && self.is_kind(pos, TileType::Exit)
    }

    pub fn is_start_tile(&self, pos: (i32, i32)) -> bool {
        pos == self.start_pos && self.is_kind(pos, TileType::Start)
    }

    // ── Editing ──

    pub fn set_tile_type(&mut self, pos: (i32, i32), kind: TileType) {
        if !self.is_valid_position(pos) {
            return;
        }
        let (x, y) = (pos.0 as usize, pos.1 as usize);
        let Some(old) = self.grid.get(y).and_then(|r| r.get(x)).map(|t| t.kind) else { return };

        if old == TileType::Start && kind != TileType::Start && self.start_pos == pos {
            self.start_pos = (0, 0);
        }
        if old == TileType::Exit && kind != TileType::Exit && self.exit_pos == pos {
            self.exit_pos = (0, 0);
        }
        match kind {
            TileType::Start => self.start_pos = pos,
            TileType::Exit => self.exit_pos = pos,
            _ => {}
        }

        if let Some(tile) = self.grid.get_mut(y).and_then(|r| r.get_mut(x)) {
            *tile = Tile::new(kind, x, y);
        }
    }

    pub fn info(&self) -> LevelInfo {
        LevelInfo {
            name: self.name.clone(),
            dimensions: (self.width(), self.height()),
            start_pos: self.start_pos,
            exit_pos: self.exit_pos,
            mask_duration: self.mask_duration,
            mask_cooldown: self.mask_cooldown,
            time_thresholds: self.time_thresholds.clone(),
            mask_threshold: self.mask_threshold,
        }
    }
}

impl TileQuery for Level {
    fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    fn tile_type(&self, x: i32, y: i32) -> Option<TileType> {
        self.tile((x, y)).map(|t| t.kind)
    }
}

/// `"My Level 2"` → `"my_level_2.json"`.
pub fn save_file_name(name: &str) -> String {
    format!("{}.json", name.to_lowercase().replace(' ', "_"))
}

// ══════════════════════════════════════════════════════════════
// Level list
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct LevelCatalog {
    pub dir: PathBuf,
    pub entries: Vec<CatalogEntry>,
}

impl LevelCatalog {
    /// A missing or malformed list yields an empty catalog.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(CATALOG_FILE);
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<CatalogFile>(&text) {
                Ok(cat) => cat.levels,
                Err(e) => {
                    warn!("{} is malformed: {e}", path.display());
                    vec![]
                }
            },
            Err(e) => {
                warn!("could not read {}: {e}", path.display());
                vec![]
            }
        };
        info!("level catalog: {} level(s) in {}", entries.len(), dir.display());
        LevelCatalog { dir: dir.to_path_buf(), entries }
    }

    /// Number of playable levels (at least one: the fallback).
    pub fn len(&self) -> usize {
        self.entries.len().max(1)
    }

    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.len()
    }

    pub fn path_of(&self, index: usize) -> Option<PathBuf> {
        self.entries.get(index).map(|e| self.dir.join(&e.file))
    }

    pub fn try_load(&self, index: usize, config: &GameConfig) -> Result<Level, LevelError> {
        let path = self.path_of(index).ok_or(LevelError::NotFound(index))?;
        Level::load(&path, config)
    }

    /// Never fails: falls back to `default_level.json`, then the built-in level.
    pub fn load_level(&self, index: usize, config: &GameConfig) -> Level {
        match self.try_load(index, config) {
            Ok(level) => level,
            Err(e) => {
                error!("level {} failed to load: {e}", index + 1);
                self.fallback(config)
            }
        }
    }

    fn fallback(&self, config: &GameConfig) -> Level {
        let path = self.dir.join(DEFAULT_LEVEL_FILE);
        match Level::load(&path, config) {
            Ok(level) => level,
            Err(e) => {
                warn!("{} unavailable ({e}); using built-in level", path.display());
                Level::builtin(config)
            }
        }
    }
}
