/// Retained UI model: HUD labels, result panels, the editor toolbar and the
/// screen layout they sit in.
///
/// Panels and buttons are plain rectangles in terminal cells. The renderer
/// draws whatever the current frame's model holds, and mouse clicks are
/// hit-tested against the same model, so what is clicked is always what
/// was drawn.

use crate::domain::player::MaskStatus;
use crate::domain::score::ScoreSystem;
use crate::domain::tile::{TileType, PALETTE};
use crate::sim::level::LevelInfo;
use super::assets::{CELL_H, CELL_W};

pub const INSTRUCTIONS: &str = "M: Toggle Mask | Arrow Keys: Move | Reach the yellow exit!";
pub const EDITOR_HELP: &str = "1-5: Tile | Arrows: Cursor | Space: Paint | Ctrl+S: Save | L: Load | Esc: Back";

/// Width of the right-hand editor toolbar (terminal columns).
pub const TOOLBAR_W: u16 = 18;
/// Rows reserved above the board for the HUD.
const HUD_ROWS: u16 = 3;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ButtonAction {
    Continue,
    Restart,
    LevelOne,
    Editor,
    SelectTile(TileType),
    SaveLevel,
    LoadLevel,
    BackToGame,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

impl Rect {
    pub fn contains(&self, col: u16, row: u16) -> bool {
        col >= self.x && col < self.x + self.w && row >= self.y && row < self.y + self.h
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
    pub rect: Rect,
    /// Drawn highlighted (selected tile in the toolbar).
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    pub title: String,
    pub subtitle: Option<String>,
    pub lines: Vec<String>,
    pub buttons: Vec<Button>,
    pub rect: Rect,
}

impl Panel {
    fn new(title: &str, subtitle: Option<&str>, lines: Vec<String>, buttons: &[(&str, ButtonAction)]) -> Self {
        Panel {
            title: title.to_string(),
            subtitle: subtitle.map(str::to_string),
            lines,
            buttons: buttons.iter().map(|&(label, action)| Button {
                label: label.to_string(),
                action,
                rect: Rect::default(),
                selected: false,
            }).collect(),
            rect: Rect::default(),
        }
    }

    /// Centre the panel on screen and lay buttons out in one row at the bottom.
    pub fn layout(&mut self, screen_w: u16, screen_h: u16) {
        let text_w = self.lines.iter().map(|l| l.chars().count())
            .chain(std::iter::once(self.title.chars().count()))
            .chain(self.subtitle.iter().map(|s| s.chars().count()))
            .max()
            .unwrap_or(0) as u16;
        let buttons_w: u16 = self.buttons.iter().map(|b| button_width(&b.label) + 2).sum();
        let w = text_w.max(buttons_w).max(30) + 4;
        let body = 2 + self.subtitle.is_some() as u16 + self.lines.len() as u16;
        let h = body + 5;

        self.rect = Rect {
            x: screen_w.saturating_sub(w) / 2,
            y: screen_h.saturating_sub(h) / 2,
            w,
            h,
        };

        let row = self.rect.y + h - 3;
        let mut col = self.rect.x + (w - buttons_w.min(w)) / 2 + 1;
        for b in &mut self.buttons {
            let bw = button_width(&b.label);
            b.rect = Rect { x: col, y: row, w: bw, h: 1 };
            col += bw + 2;
        }
    }

    pub fn hit(&self, col: u16, row: u16) -> Option<ButtonAction> {
        hit_test(&self.buttons, col, row)
    }
}

/// `[ label ]`
pub fn button_width(label: &str) -> u16 {
    label.chars().count() as u16 + 4
}

pub fn hit_test(buttons: &[Button], col: u16, row: u16) -> Option<ButtonAction> {
    buttons.iter().find(|b| b.rect.contains(col, row)).map(|b| b.action)
}

// ══════════════════════════════════════════════════════════════
// HUD labels
// ══════════════════════════════════════════════════════════════

pub fn time_label(score: &ScoreSystem) -> String {
    format!("Time: {}", score.time_formatted(None))
}

pub fn mask_label(status: &MaskStatus) -> String {
    if status.active {
        format!("Mask: Active ({:.1}s)", status.timer.max(0.0))
    } else if !status.available {
        format!("Mask: Loading ({:.1}s)", status.recharge_timer.max(0.0))
    } else {
        "Mask: Ready".to_string()
    }
}

pub fn uses_label(score: &ScoreSystem) -> String {
    format!("Mask Uses: {}", score.mask_uses)
}

/// Right side of the editor header.
pub fn editor_status(info: &LevelInfo) -> String {
    let (w, h) = info.dimensions;
    format!(
        "{w}x{h} | Start ({},{}) | Exit ({},{}) | Mask {:.1}s/{:.1}s ",
        info.start_pos.0, info.start_pos.1, info.exit_pos.0, info.exit_pos.1,
        info.mask_duration, info.mask_cooldown,
    )
}

// ══════════════════════════════════════════════════════════════
// Result panels
// ══════════════════════════════════════════════════════════════

pub fn win_panel(score: &ScoreSystem) -> Panel {
    let summary = score.summary();
    Panel::new(
        "LEVEL COMPLETE!",
        None,
        vec![
            format!("Time: {}", summary.time),
            format!("Mask Uses: {}", summary.mask_uses),
            format!("Stars: {}", summary.stars),
            format!("Rating: {}", summary.rating),
        ],
        &[
            ("Continue", ButtonAction::Continue),
            ("Restart (R)", ButtonAction::Restart),
            ("Editor (E)", ButtonAction::Editor),
        ],
    )
}

pub fn game_over_panel(score: &ScoreSystem) -> Panel {
    Panel::new(
        "GAME OVER",
        Some("You fell into the void!"),
        vec![
            format!("Time: {}", score.time_formatted(None)),
            format!("Mask Uses: {}", score.mask_uses),
        ],
        &[
            ("Try Again (R)", ButtonAction::Restart),
            ("Level 1", ButtonAction::LevelOne),
            ("Editor (E)", ButtonAction::Editor),
        ],
    )
}

// ══════════════════════════════════════════════════════════════
// Screen layout
// ══════════════════════════════════════════════════════════════

/// Where the board (and toolbar, in the editor) sit on the terminal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Layout {
    pub board_x: u16,
    pub board_y: u16,
    pub cols: usize,
    pub rows: usize,
    /// Set in the editor.
    pub toolbar: Option<Rect>,
}

impl Layout {
    pub fn compute(screen_w: u16, screen_h: u16, cols: usize, rows: usize, with_toolbar: bool) -> Self {
        let board_w = (cols * CELL_W) as u16;
        let board_h = (rows * CELL_H) as u16;
        let total_w = board_w + if with_toolbar { TOOLBAR_W + 2 } else { 0 };
        let board_x = screen_w.saturating_sub(total_w) / 2;
        let board_y = (HUD_ROWS + screen_h.saturating_sub(board_h + HUD_ROWS + 2) / 2).min(screen_h);
        let toolbar = with_toolbar.then(|| Rect {
            x: board_x + board_w + 2,
            y: board_y,
            w: TOOLBAR_W,
            h: board_h.max(toolbar_height()),
        });
        Layout { board_x, board_y, cols, rows, toolbar }
    }

    /// Grid cell under a terminal position. Toolbar and margins are `None`.
    pub fn cell_at(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        if self.toolbar.is_some_and(|t| t.contains(col, row)) {
            return None;
        }
        if col < self.board_x || row < self.board_y {
            return None;
        }
        let gx = (col - self.board_x) as usize / CELL_W;
        let gy = (row - self.board_y) as usize / CELL_H;
        (gx < self.cols && gy < self.rows).then_some((gx as i32, gy as i32))
    }

    /// Terminal position of a cell's top-left corner.
    pub fn cell_origin(&self, gx: i32, gy: i32) -> (i32, i32) {
        (
            self.board_x as i32 + gx * CELL_W as i32,
            self.board_y as i32 + gy * CELL_H as i32,
        )
    }
}

// ══════════════════════════════════════════════════════════════
// Editor toolbar
// ══════════════════════════════════════════════════════════════

fn toolbar_height() -> u16 {
    // title + tiles + gap + 3 commands, two rows each
    (1 + PALETTE.len() + 1 + 3) as u16 * 2
}

pub fn editor_toolbar(area: Rect, selected: TileType) -> Vec<Button> {
    let mut buttons = Vec::with_capacity(PALETTE.len() + 3);
    let mut row = area.y + 2;
    let width = area.w.saturating_sub(2);

    for (i, kind) in PALETTE.iter().enumerate() {
        buttons.push(Button {
            label: format!("{} {}", i + 1, kind.label()),
            action: ButtonAction::SelectTile(*kind),
            rect: Rect { x: area.x + 1, y: row, w: width, h: 1 },
            selected: *kind == selected,
        });
        row += 2;
    }
    row += 1;
    for (label, action) in [
        ("Save Level", ButtonAction::SaveLevel),
        ("Load Level", ButtonAction::LoadLevel),
        ("Back to Game", ButtonAction::BackToGame),
    ] {
        buttons.push(Button {
            label: label.to_string(),
            action,
            rect: Rect { x: area.x + 1, y: row, w: width, h: 1 },
            selected: false,
        });
        row += 2;
    }
    buttons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;

    fn status(active: bool, available: bool, timer: f32, recharge: f32) -> MaskStatus {
        MaskStatus {
            active,
            timer,
            duration: 2.0,
            recharge_timer: recharge,
            cooldown: 5.0,
            available,
            uses: 0,
        }
    }

    fn finished(time: f32, uses: u32) -> ScoreSystem {
        let mut s = ScoreSystem::new(&ScoringConfig::default());
        s.update(time);
        for _ in 0..uses {
            s.add_mask_use();
        }
        s.complete_level();
        s
    }

    #[test]
    fn mask_labels() {
        assert_eq!(mask_label(&status(true, false, 1.23, 0.0)), "Mask: Active (1.2s)");
        assert_eq!(mask_label(&status(false, false, 0.0, 3.44)), "Mask: Loading (3.4s)");
        assert_eq!(mask_label(&status(false, true, 0.0, 0.0)), "Mask: Ready");
    }

    #[test]
    fn time_and_uses_labels() {
        let mut s = ScoreSystem::new(&ScoringConfig::default());
        s.update(75.0);
        s.add_mask_use();
        assert_eq!(time_label(&s), "Time: 01:15");
        assert_eq!(uses_label(&s), "Mask Uses: 1");
    }

    #[test]
    fn editor_status_summarises_level() {
        let info = LevelInfo {
            name: "Tiny".into(),
            dimensions: (3, 2),
            start_pos: (0, 0),
            exit_pos: (2, 1),
            mask_duration: 3.0,
            mask_cooldown: 4.5,
            time_thresholds: vec![20.0, 40.0, 80.0],
            mask_threshold: 3,
        };
        assert_eq!(editor_status(&info), "3x2 | Start (0,0) | Exit (2,1) | Mask 3.0s/4.5s ");
    }

    #[test]
    fn win_panel_contents() {
        let p = win_panel(&finished(40.0, 2));
        assert_eq!(p.title, "LEVEL COMPLETE!");
        assert_eq!(p.lines, vec!["Time: 00:40", "Mask Uses: 2", "Stars: ★★☆", "Rating: Good!"]);
        let actions: Vec<_> = p.buttons.iter().map(|b| b.action).collect();
        assert_eq!(actions, vec![ButtonAction::Continue, ButtonAction::Restart, ButtonAction::Editor]);
    }

    #[test]
    fn game_over_panel_contents() {
        let mut s = ScoreSystem::new(&ScoringConfig::default());
        s.update(12.0);
        let p = game_over_panel(&s);
        assert_eq!(p.title, "GAME OVER");
        assert_eq!(p.subtitle.as_deref(), Some("You fell into the void!"));
        assert_eq!(p.lines[0], "Time: 00:12");
        assert_eq!(p.buttons[1].action, ButtonAction::LevelOne);
    }

    #[test]
    fn panel_buttons_hit_test_after_layout() {
        let mut p = win_panel(&finished(10.0, 0));
        p.layout(100, 40);
        assert!(p.rect.x + p.rect.w <= 100);
        for b in &p.buttons {
            assert!(p.rect.contains(b.rect.x, b.rect.y));
            assert_eq!(p.hit(b.rect.x, b.rect.y), Some(b.action));
            assert_eq!(p.hit(b.rect.x + b.rect.w - 1, b.rect.y), Some(b.action));
        }
        assert_eq!(p.hit(p.rect.x, p.rect.y), None);
        // buttons don't overlap
        assert!(p.buttons[0].rect.x + p.buttons[0].rect.w < p.buttons[1].rect.x);
    }

    #[test]
    fn layout_maps_cells() {
        let l = Layout::compute(80, 30, 11, 10, false);
        let (ox, oy) = l.cell_origin(0, 0);
        assert_eq!(l.cell_at(ox as u16, oy as u16), Some((0, 0)));
        let (x3, y2) = l.cell_origin(3, 2);
        assert_eq!(l.cell_at(x3 as u16 + 3, y2 as u16 + 1), Some((3, 2)));
        assert_eq!(l.cell_at(l.board_x + 11 * CELL_W as u16, l.board_y), None);
        assert_eq!(l.cell_at(0, 0), None);
    }

    #[test]
    fn toolbar_clicks_never_paint() {
        let l = Layout::compute(120, 40, 11, 10, true);
        let tb = l.toolbar.unwrap();
        assert_eq!(l.cell_at(tb.x, tb.y), None);
        assert!(tb.x >= l.board_x + 11 * CELL_W as u16);

        let buttons = editor_toolbar(tb, TileType::Fake);
        assert_eq!(buttons.len(), 8);
        assert!(buttons.iter().all(|b| tb.contains(b.rect.x, b.rect.y)));
        assert!(buttons[1].selected && !buttons[0].selected);
        assert_eq!(hit_test(&buttons, buttons[6].rect.x, buttons[6].rect.y), Some(ButtonAction::LoadLevel));
        assert_eq!(hit_test(&buttons, buttons[2].rect.x + 2, buttons[2].rect.y), Some(ButtonAction::SelectTile(TileType::Empty)));
    }
}
