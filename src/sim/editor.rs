/// Level editor state. Edits go straight into the active level.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::GameConfig;
use crate::domain::player::MoveDir;
use crate::domain::tile::{TileType, PALETTE};
use crate::sim::level::{save_file_name, Level, LevelError};

#[derive(Clone, Debug)]
pub struct Editor {
    pub selected: TileType,
    pub cursor: (i32, i32),
    /// Set by any paint; cleared when the editor is (re)entered.
    pub modified: bool,
    /// Entered from live play, so leaving without edits resumes it.
    pub resumable: bool,
}

impl Editor {
    pub fn new() -> Self {
        Editor { selected: TileType::Real, cursor: (0, 0), modified: false, resumable: false }
    }

    pub fn enter(&mut self, level: &Level, resumable: bool) {
        self.modified = false;
        self.resumable = resumable;
        self.cursor = clamp_to(level, self.cursor);
        info!("editing '{}'", level.name);
    }

    pub fn select(&mut self, kind: TileType) {
        debug!("editor tile: {}", kind.label());
        self.selected = kind;
    }

    /// 0-based palette slot (the 1..5 hotkeys).
    pub fn select_slot(&mut self, slot: usize) {
        if let Some(&kind) = PALETTE.get(slot) {
            self.select(kind);
        }
    }

    pub fn move_cursor(&mut self, dir: MoveDir, level: &Level) {
        let (dx, dy) = dir.delta();
        self.cursor = clamp_to(level, (self.cursor.0 + dx, self.cursor.1 + dy));
    }

    /// Paint the selected type. Returns false for positions off the grid.
    pub fn paint(&mut self, level: &mut Level, pos: (i32, i32)) -> bool {
        if !level.is_valid_position(pos) {
            return false;
        }
        level.set_tile_type(pos, self.selected);
        self.cursor = pos;
        self.modified = true;
        true
    }

    pub fn paint_at_cursor(&mut self, level: &mut Level) -> bool {
        let pos = self.cursor;
        self.paint(level, pos)
    }

    pub fn save(&self, level: &Level, levels_dir: &Path) -> Result<PathBuf, LevelError> {
        let path = levels_dir.join(save_file_name(&level.name));
        level.save(&path)?;
        Ok(path)
    }

    /// Replace the level with its saved copy. `Ok(false)` when nothing was saved yet.
    pub fn load(&mut self, level: &mut Level, levels_dir: &Path, config: &GameConfig) -> Result<bool, LevelError> {
        let path = levels_dir.join(save_file_name(&level.name));
        if !path.exists() {
            warn!("no saved copy at {}", path.display());
            return Ok(false);
        }
        *level = Level::load(&path, config)?;
        self.cursor = clamp_to(level, self.cursor);
        self.modified = true;
        Ok(true)
    }
}

impl Default for Editor {
    fn default() -> Self {
        Editor::new()
    }
}

fn clamp_to(level: &Level, (x, y): (i32, i32)) -> (i32, i32) {
    let max_x = level.width().saturating_sub(1) as i32;
    let max_y = level.height().saturating_sub(1) as i32;
    (x.clamp(0, max_x), y.clamp(0, max_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level() -> Level {
        let cfg = GameConfig::default();
        Level::from_types("Edit Me", vec![
            vec![TileType::Start, TileType::Real, TileType::Real],
            vec![TileType::Empty, TileType::Fake, TileType::Exit],
        ], &cfg).unwrap()
    }

    #[test]
    fn paint_marks_modified() {
        let mut ed = Editor::new();
        let mut l = level();
        ed.select(TileType::Fake);
        assert!(ed.paint(&mut l, (1, 0)));
        assert!(l.is_fake_tile((1, 0)));
        assert!(ed.modified);
        assert_eq!(ed.cursor, (1, 0));
    }

    #[test]
    fn paint_outside_grid_is_ignored() {
        let mut ed = Editor::new();
        let mut l = level();
        assert!(!ed.paint(&mut l, (3, 0)));
        assert!(!ed.paint(&mut l, (-1, 1)));
        assert!(!ed.modified);
    }

    #[test]
    fn slots_follow_palette() {
        let mut ed = Editor::new();
        ed.select_slot(2);
        assert_eq!(ed.selected, TileType::Empty);
        ed.select_slot(4);
        assert_eq!(ed.selected, TileType::Exit);
        ed.select_slot(9);
        assert_eq!(ed.selected, TileType::Exit);
    }

    #[test]
    fn cursor_stays_on_grid() {
        let mut ed = Editor::new();
        let l = level();
        ed.move_cursor(MoveDir::Left, &l);
        assert_eq!(ed.cursor, (0, 0));
        for _ in 0..5 {
            ed.move_cursor(MoveDir::Right, &l);
            ed.move_cursor(MoveDir::Down, &l);
        }
        assert_eq!(ed.cursor, (2, 1));
    }

    #[test]
    fn painting_start_moves_marker() {
        let mut ed = Editor::new();
        let mut l = level();
        ed.select(TileType::Start);
        ed.cursor = (2, 0);
        ed.paint_at_cursor(&mut l);
        assert_eq!(l.start_pos, (2, 0));
    }

    #[test]
    fn save_then_load_restores_edits() {
        let dir = std::env::temp_dir().join(format!("floor_is_a_lie_{}_editor", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let cfg = GameConfig::default();
        let mut ed = Editor::new();
        let mut l = level();

        assert!(!ed.load(&mut l, &dir, &cfg).unwrap(), "nothing saved yet");

        ed.select(TileType::Real);
        ed.paint(&mut l, (0, 1));
        let path = ed.save(&l, &dir).unwrap();
        assert!(path.ends_with("edit_me.json"));

        ed.select(TileType::Empty);
        ed.paint(&mut l, (0, 1));
        assert!(l.is_empty_tile((0, 1)));

        assert!(ed.load(&mut l, &dir, &cfg).unwrap());
        assert!(!l.is_empty_tile((0, 1)));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
