/// Glyph sprite sheets for the terminal renderer.
///
/// A sheet is a `rows × cols` grid of frames; each frame is a small block of
/// characters with colours. Player sheets are 2×2 characters per frame, tile
/// sheets fill a whole cell (`CELL_W × CELL_H`). Everything is generated once
/// at startup and looked up by id; a missing id makes the renderer fall back
/// to a flat coloured block.

use std::collections::HashMap;

use crossterm::style::Color;

use crate::domain::player::{
    SHEET_DEATH, SHEET_IDLE, SHEET_MASK, SHEET_RUNNING, SHEET_TRANSITION, SHEET_WALK_BACKWARD,
    SHEET_WALK_FORWARD,
};
use crate::domain::tile::TileType;

/// Terminal columns per grid cell.
pub const CELL_W: usize = 4;
/// Terminal rows per grid cell.
pub const CELL_H: usize = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct SpriteFrame {
    pub lines: Vec<Vec<char>>,
    pub fg: Color,
    /// `None` keeps whatever is underneath.
    pub bg: Option<Color>,
}

impl SpriteFrame {
    fn new(lines: &[&str], fg: Color, bg: Option<Color>) -> Self {
        SpriteFrame { lines: lines.iter().map(|l| l.chars().collect()).collect(), fg, bg }
    }

    pub fn width(&self) -> usize {
        self.lines.iter().map(|l| l.len()).max().unwrap_or(0)
    }

    /// Horizontal flip for left-facing sprites.
    pub fn mirrored(&self) -> SpriteFrame {
        let lines = self.lines.iter()
            .map(|l| l.iter().rev().map(|&c| mirror_char(c)).collect())
            .collect();
        SpriteFrame { lines, fg: self.fg, bg: self.bg }
    }
}

fn mirror_char(c: char) -> char {
    match c {
        '╱' => '╲',
        '╲' => '╱',
        '▌' => '▐',
        '▐' => '▌',
        '>' => '<',
        '<' => '>',
        '◐' => '◑',
        '◑' => '◐',
        other => other,
    }
}

#[derive(Clone, Debug)]
pub struct SpriteSheet {
    pub rows: usize,
    pub cols: usize,
    frames: Vec<SpriteFrame>,
}

impl SpriteSheet {
    /// `frame_fn(i)` is called for every index in the sheet.
    pub fn generate(rows: usize, cols: usize, frame_fn: impl Fn(usize) -> SpriteFrame) -> Self {
        SpriteSheet { rows, cols, frames: (0..rows * cols).map(frame_fn).collect() }
    }

    pub fn frame(&self, index: usize) -> Option<&SpriteFrame> {
        self.frames.get(index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

pub struct AssetManager {
    sheets: HashMap<String, SpriteSheet>,
}

impl AssetManager {
    pub fn new() -> Self {
        Self { sheets: HashMap::new() }
    }

    /// Every sheet the game references.
    pub fn with_defaults() -> Self {
        let mut assets = Self::new();
        assets.insert(SHEET_IDLE, SpriteSheet::generate(6, 6, idle_frame));
        assets.insert(SHEET_TRANSITION, SpriteSheet::generate(4, 4, transition_frame));
        assets.insert(SHEET_RUNNING, SpriteSheet::generate(6, 6, running_frame));
        assets.insert(SHEET_WALK_FORWARD, SpriteSheet::generate(6, 6, |i| walk_frame(i, "oo")));
        assets.insert(SHEET_WALK_BACKWARD, SpriteSheet::generate(6, 6, |i| walk_frame(i, "▀▀")));
        assets.insert(SHEET_MASK, SpriteSheet::generate(6, 6, mask_frame));
        assets.insert(SHEET_DEATH, SpriteSheet::generate(6, 6, death_frame));
        for kind in [TileType::Real, TileType::Fake, TileType::Empty, TileType::Start, TileType::Exit] {
            assets.insert(tile_sheet_id(kind), SpriteSheet::generate(1, 1, |_| tile_frame(kind)));
        }
        log::debug!("generated {} sprite sheets", assets.sheets.len());
        assets
    }

    pub fn insert(&mut self, id: &str, sheet: SpriteSheet) {
        self.sheets.insert(id.to_string(), sheet);
    }

    pub fn sheet(&self, id: &str) -> Option<&SpriteSheet> {
        self.sheets.get(id)
    }

    pub fn has_sheet(&self, id: &str) -> bool {
        self.sheets.contains_key(id)
    }

    pub fn frame(&self, id: &str, index: usize) -> Option<&SpriteFrame> {
        self.sheet(id)?.frame(index)
    }

    pub fn tile(&self, kind: TileType) -> Option<&SpriteFrame> {
        self.frame(tile_sheet_id(kind), 0)
    }
}

impl Default for AssetManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}

pub fn tile_sheet_id(kind: TileType) -> &'static str {
    match kind {
        TileType::Empty => "tile_empty",
        TileType::Real => "tile_real",
        TileType::Fake => "tile_fake",
        TileType::Start => "tile_start",
        TileType::Exit => "tile_exit",
    }
}

/// Flat colour for tiles (also the fallback when a sheet is missing).
pub fn tile_color(kind: TileType) -> Color {
    match kind {
        TileType::Empty => Color::Rgb { r: 50, g: 50, b: 70 },
        TileType::Real => Color::Rgb { r: 100, g: 150, b: 100 },
        TileType::Fake => Color::Rgb { r: 150, g: 100, b: 100 },
        TileType::Start => Color::Rgb { r: 100, g: 100, b: 200 },
        TileType::Exit => Color::Rgb { r: 200, g: 200, b: 100 },
    }
}

pub const PLAYER_COLOR: Color = Color::Rgb { r: 255, g: 255, b: 255 };
/// Mask HUD line and overlay tint.
pub const MASK_COLOR: Color = Color::Rgb { r: 190, g: 130, b: 255 };

// ── Frame generators ──

/// Scale white by `f` (0..1).
fn grey(f: f32) -> Color {
    let v = (255.0 * f.clamp(0.0, 1.0)) as u8;
    Color::Rgb { r: v, g: v, b: v }
}

fn lerp_color(a: (u8, u8, u8), b: (u8, u8, u8), t: f32) -> Color {
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t.clamp(0.0, 1.0)) as u8;
    Color::Rgb { r: mix(a.0, b.0), g: mix(a.1, b.1), b: mix(a.2, b.2) }
}

fn idle_frame(i: usize) -> SpriteFrame {
    let eyes = if i % 12 == 11 { "--" } else { "oo" };
    // slow breathing pulse over the 36 frames
    let pulse = 0.86 + 0.14 * (i as f32 / 36.0 * std::f32::consts::TAU).cos();
    SpriteFrame::new(&[eyes, "▐▌"], grey(pulse), None)
}

fn transition_frame(i: usize) -> SpriteFrame {
    let body = match i {
        0..=5 => "▐▌",
        6..=11 => "▐╲",
        _ => "╱╲",
    };
    SpriteFrame::new(&["o>", body], PLAYER_COLOR, None)
}

fn running_frame(i: usize) -> SpriteFrame {
    let legs = if (i / 3) % 2 == 0 { "╱╲" } else { "▐▌" };
    SpriteFrame::new(&["o>", legs], PLAYER_COLOR, None)
}

fn walk_frame(i: usize, face: &str) -> SpriteFrame {
    let legs = if (i / 3) % 2 == 0 { "▐ " } else { " ▌" };
    SpriteFrame::new(&[face, legs], PLAYER_COLOR, None)
}

fn mask_frame(i: usize) -> SpriteFrame {
    let face = match i {
        0..=11 => "oo",
        12..=23 => "◐◑",
        _ => "◆◆",
    };
    let fg = lerp_color((255, 255, 255), (190, 130, 255), i as f32 / 35.0);
    SpriteFrame::new(&[face, "▐▌"], fg, None)
}

fn death_frame(i: usize) -> SpriteFrame {
    let (lines, fade): ([&str; 2], f32) = match i {
        0..=5 => (["xx", "▐▌"], 1.0),
        6..=11 => (["xx", "▓▓"], 0.9),
        12..=17 => (["▓▓", "▓▓"], 0.75),
        18..=23 => (["▒▒", "▒▒"], 0.6),
        24..=29 => (["░░", "░░"], 0.45),
        30..=34 => (["··", "  "], 0.3),
        _ => (["  ", "  "], 0.0),
    };
    SpriteFrame::new(&lines, grey(fade), None)
}

fn tile_frame(kind: TileType) -> SpriteFrame {
    let bg = Some(tile_color(kind));
    let shade = Color::Rgb { r: 20, g: 20, b: 30 };
    match kind {
        TileType::Real => SpriteFrame::new(&["▗  ▖", "▝  ▘"], Color::Rgb { r: 70, g: 120, b: 70 }, bg),
        TileType::Fake => SpriteFrame::new(&["╲╱╲╱", "╱╲╱╲"], Color::Rgb { r: 120, g: 70, b: 70 }, bg),
        TileType::Empty => SpriteFrame::new(&["    ", "    "], shade, bg),
        TileType::Start => SpriteFrame::new(&["▛▀▀▜", "▙▄▄▟"], Color::Rgb { r: 70, g: 70, b: 160 }, bg),
        TileType::Exit => SpriteFrame::new(&["EXIT", "▔▔▔▔"], shade, bg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::animation::Animation;

    #[test]
    fn every_player_clip_has_a_full_sheet() {
        let assets = AssetManager::with_defaults();
        for (id, rows, cols) in [
            (SHEET_IDLE, 6, 6),
            (SHEET_TRANSITION, 4, 4),
            (SHEET_RUNNING, 6, 6),
            (SHEET_WALK_FORWARD, 6, 6),
            (SHEET_WALK_BACKWARD, 6, 6),
            (SHEET_MASK, 6, 6),
            (SHEET_DEATH, 6, 6),
        ] {
            let sheet = assets.sheet(id).unwrap_or_else(|| panic!("missing {id}"));
            assert_eq!(sheet.len(), rows * cols, "{id}");
            let clip = Animation::new(id, rows, cols, None, 0.1, false);
            assert!(assets.frame(id, clip.sheet_frame().unwrap()).is_some());
        }
    }

    #[test]
    fn player_frames_are_two_by_two() {
        let assets = AssetManager::with_defaults();
        for i in 0..36 {
            let f = assets.frame(SHEET_RUNNING, i).unwrap();
            assert_eq!(f.lines.len(), 2);
            assert_eq!(f.width(), 2);
        }
    }

    #[test]
    fn tiles_fill_a_cell() {
        let assets = AssetManager::with_defaults();
        for kind in [TileType::Real, TileType::Fake, TileType::Empty, TileType::Start, TileType::Exit] {
            let f = assets.tile(kind).unwrap();
            assert_eq!(f.lines.len(), CELL_H);
            assert_eq!(f.width(), CELL_W);
            assert_eq!(f.bg, Some(tile_color(kind)));
        }
    }

    #[test]
    fn missing_sheet_is_none() {
        let assets = AssetManager::new();
        assert!(!assets.has_sheet(SHEET_IDLE));
        assert!(assets.frame(SHEET_IDLE, 0).is_none());
        assert!(assets.tile(TileType::Real).is_none());
    }

    #[test]
    fn mirror_flips_direction_glyphs() {
        let f = running_frame(0).mirrored();
        assert_eq!(f.lines[0], vec!['<', 'o']);
        assert_eq!(f.lines[1], vec!['╱', '╲']);
    }

    #[test]
    fn death_ends_blank() {
        let last = death_frame(35);
        assert!(last.lines.iter().flatten().all(|&c| c == ' '));
    }
}
