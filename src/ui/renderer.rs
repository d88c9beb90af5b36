/// Terminal renderer for the board, HUD, result panels and editor.
///
/// Each frame is composed into `front`, compared cell by cell with `back`
/// (what the terminal currently shows), and only the differences are queued
/// and flushed in one write. The buffers then swap roles.
///
/// The panel and toolbar drawn in the last frame are kept so mouse clicks
/// can be hit-tested against exactly what is on screen.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use log::{debug, warn};

use crate::domain::player::{
    ClipId, SHEET_DEATH, SHEET_IDLE, SHEET_MASK, SHEET_RUNNING, SHEET_TRANSITION,
    SHEET_WALK_BACKWARD, SHEET_WALK_FORWARD,
};
use crate::domain::tile::TileType;
use crate::sim::world::{DeathCause, Phase, WorldState};
use super::assets::{tile_color, AssetManager, SpriteFrame, CELL_H, CELL_W, MASK_COLOR, PLAYER_COLOR};
use super::hud::{self, Button, ButtonAction, Layout, Panel, Rect};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, also used
    /// for every Clear so row gaps match the cells.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer; differs from any real cell.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    /// Signed coordinates so sprites may hang off the edge.
    fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.cells[y as usize * self.width + x as usize] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn bg_at(&self, x: i32, y: i32) -> Color {
        if x < 0 || y < 0 {
            return Cell::BASE_BG;
        }
        self.get(x as usize, y as usize).bg
    }

    fn put_str(&mut self, x: i32, y: i32, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i as i32, y, Cell::new(ch, fg, bg));
        }
    }

    /// Centre a string on row `y` of the whole buffer.
    fn put_centered(&mut self, y: i32, s: &str, fg: Color, bg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x as i32, y, s, fg, bg);
    }

    fn fill(&mut self, r: Rect, bg: Color) {
        for y in r.y..r.y + r.h {
            for x in r.x..r.x + r.w {
                self.set(x as i32, y as i32, Cell::new(' ', Color::White, bg));
            }
        }
    }

    /// `bg: None` keeps the background already under each glyph.
    fn blit(&mut self, x: i32, y: i32, frame: &SpriteFrame) {
        for (dy, line) in frame.lines.iter().enumerate() {
            for (dx, &ch) in line.iter().enumerate() {
                let (cx, cy) = (x + dx as i32, y + dy as i32);
                let bg = frame.bg.unwrap_or_else(|| self.bg_at(cx, cy));
                self.set(cx, cy, Cell::new(ch, frame.fg, bg));
            }
        }
    }
}

// ── Palette ──

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 45 };
const TITLE_FG: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const TEXT_FG: Color = Color::Rgb { r: 220, g: 220, b: 220 };
const DIM_FG: Color = Color::Rgb { r: 120, g: 120, b: 140 };
const PANEL_BG: Color = Color::Rgb { r: 35, g: 35, b: 55 };
const BUTTON_BG: Color = Color::Rgb { r: 60, g: 60, b: 90 };
const BUTTON_SEL_BG: Color = Color::Rgb { r: 110, g: 110, b: 170 };
const DANGER_FG: Color = Color::Rgb { r: 255, g: 90, b: 90 };
const CURSOR_FG: Color = Color::Rgb { r: 255, g: 255, b: 255 };

/// Mix `base` toward `tint` by `t`. Non-RGB colours pass through.
fn blend(base: Color, tint: Color, t: f32) -> Color {
    match (base, tint) {
        (Color::Rgb { r, g, b }, Color::Rgb { r: tr, g: tg, b: tb }) => {
            let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t) as u8;
            Color::Rgb { r: mix(r, tr), g: mix(g, tg), b: mix(b, tb) }
        }
        _ => base,
    }
}

// ── Renderer ──

const PLAYER_SHEETS: [&str; 7] = [
    SHEET_IDLE, SHEET_TRANSITION, SHEET_RUNNING, SHEET_WALK_FORWARD,
    SHEET_WALK_BACKWARD, SHEET_MASK, SHEET_DEATH,
];

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    /// Terminal accepted the keyboard enhancement flags and reports key releases.
    key_releases: bool,

    assets: AssetManager,
    /// Pixel units per cell, to place the interpolated player.
    tile_size: f32,

    // Retained from the last composed frame for hit-testing.
    layout: Option<Layout>,
    panel: Option<Panel>,
    toolbar: Vec<Button>,
}

impl Renderer {
    pub fn new(assets: AssetManager, tile_size: f32) -> Self {
        for id in PLAYER_SHEETS {
            if !assets.has_sheet(id) {
                warn!("sprite sheet '{id}' missing; drawing a placeholder");
            }
        }
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            key_releases: false,
            assets,
            tile_size,
            layout: None,
            panel: None,
            toolbar: Vec::new(),
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.key_releases = true;
        }
        debug!("key release events: {}", self.key_releases);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn key_releases(&self) -> bool {
        self.key_releases
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_releases {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.compose(world);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Hit-testing against the last frame ──

    /// Button under a click: the result panel first, then the editor toolbar.
    pub fn hit(&self, col: u16, row: u16) -> Option<ButtonAction> {
        self.panel.as_ref()
            .and_then(|p| p.hit(col, row))
            .or_else(|| hud::hit_test(&self.toolbar, col, row))
    }

    /// Grid cell under a click; `None` over the toolbar, panel or margins.
    pub fn grid_cell(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        if self.panel.as_ref().is_some_and(|p| p.rect.contains(col, row)) {
            return None;
        }
        self.layout?.cell_at(col, row)
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colours, never ResetColor (terminal default may differ from BASE_BG).
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ══════════════════════════════════════════════════════════
    // Compose: build front buffer content
    // ══════════════════════════════════════════════════════════

    fn compose(&mut self, w: &WorldState) {
        self.front.clear();
        self.layout = None;
        self.panel = None;
        self.toolbar.clear();

        match w.phase {
            Phase::Menu => self.compose_menu(w),
            Phase::Playing | Phase::Dying => self.compose_game(w),
            Phase::LevelClear => {
                self.compose_game(w);
                self.compose_panel(hud::win_panel(&w.score), TITLE_FG);
            }
            Phase::GameOver => {
                self.compose_game(w);
                let mut panel = hud::game_over_panel(&w.score);
                if w.death_cause == Some(DeathCause::FakeTile) {
                    panel.subtitle = Some("The floor was a lie!".to_string());
                }
                self.compose_panel(panel, DANGER_FG);
            }
            Phase::Editor => self.compose_editor(w),
        }
    }

    fn compose_menu(&mut self, w: &WorldState) {
        let mid = (self.front.height / 2) as i32;
        let art = [
            "╔══════════════════════════════╗",
            "║     THE  FLOOR  IS  A  LIE   ║",
            "╚══════════════════════════════╝",
        ];
        for (i, l) in art.iter().enumerate() {
            self.front.put_centered(mid - 8 + i as i32, l, TITLE_FG, Color::Reset);
        }
        self.front.put_centered(mid - 3, "Some tiles are not what they seem.", TEXT_FG, Color::Reset);
        self.front.put_centered(mid - 2, "Wear the mask to see the truth, but not for long.", TEXT_FG, Color::Reset);

        let levels = format!("{} level(s) loaded", w.level_count());
        self.front.put_centered(mid, &levels, DIM_FG, Color::Reset);

        let blink = (w.tick / 30) % 2 == 0;
        if blink {
            self.front.put_centered(mid + 2, "▸ Press any key to start ◂", Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);
        }
        self.front.put_centered(mid + 4, hud::INSTRUCTIONS, DIM_FG, Color::Reset);
        self.front.put_centered(mid + 5, "E: Editor | R: Restart | B/U: Music | X: Sound | Q: Quit", DIM_FG, Color::Reset);
    }

    /// Board, player and HUD. Also the backdrop for the result panels.
    fn compose_game(&mut self, w: &WorldState) {
        let layout = Layout::compute(
            self.term_w as u16, self.term_h as u16,
            w.level.width(), w.level.height(), false,
        );
        self.layout = Some(layout);

        let mask = w.player.mask_active;
        self.compose_board(w, &layout, mask, mask);
        self.compose_player(w, &layout);
        self.compose_hud(w, &layout);
    }

    fn compose_hud(&mut self, w: &WorldState, layout: &Layout) {
        for x in 0..self.front.width {
            self.front.set(x as i32, 0, Cell::new(' ', Color::White, HUD_BG));
        }
        let status = w.player.mask_status();
        let time = hud::time_label(&w.score);
        let mask = hud::mask_label(&status);
        let uses = hud::uses_label(&w.score);
        let mask_fg = if status.active { MASK_COLOR } else if status.available { TEXT_FG } else { DIM_FG };

        let mut x = 1;
        self.front.put_str(x, 0, &time, TEXT_FG, HUD_BG);
        x += time.chars().count() as i32 + 3;
        self.front.put_str(x, 0, &mask, mask_fg, HUD_BG);
        x += mask.chars().count() as i32 + 3;
        self.front.put_str(x, 0, &uses, TEXT_FG, HUD_BG);

        let name = format!("{} ", w.level.name);
        let nx = self.front.width.saturating_sub(name.chars().count()) as i32;
        self.front.put_str(nx, 0, &name, TITLE_FG, HUD_BG);

        self.front.put_centered(1, hud::INSTRUCTIONS, DIM_FG, Color::Reset);

        let below = layout.board_y as i32 + (layout.rows * CELL_H) as i32 + 1;
        if !w.message.is_empty() {
            self.front.put_centered(below, &w.message, TITLE_FG, Color::Reset);
        }
    }

    /// `reveal`: draw fakes as fakes. `tint`: the mask overlay.
    fn compose_board(&mut self, w: &WorldState, layout: &Layout, reveal: bool, tint: bool) {
        for tile in w.level.tiles() {
            let kind = tile.kind.display_type(reveal);
            let (cx, cy) = layout.cell_origin(tile.x as i32, tile.y as i32);
            self.compose_tile(cx, cy, kind, tint);
        }
    }

    fn compose_tile(&mut self, cx: i32, cy: i32, kind: TileType, tint: bool) {
        match self.assets.tile(kind) {
            Some(frame) if !tint => self.front.blit(cx, cy, frame),
            Some(frame) => {
                let mut tinted = frame.clone();
                tinted.fg = blend(frame.fg, MASK_COLOR, 0.3);
                tinted.bg = frame.bg.map(|bg| blend(bg, MASK_COLOR, 0.25));
                self.front.blit(cx, cy, &tinted);
            }
            None => {
                let mut bg = tile_color(kind);
                if tint {
                    bg = blend(bg, MASK_COLOR, 0.25);
                }
                for dy in 0..CELL_H as i32 {
                    for dx in 0..CELL_W as i32 {
                        self.front.set(cx + dx, cy + dy, Cell::new(' ', Color::White, bg));
                    }
                }
            }
        }
    }

    fn compose_player(&mut self, w: &WorldState, layout: &Layout) {
        let p = &w.player;
        let (px, py) = p.screen_position();
        // Interpolated pixel centre → terminal cell, sprite is 2×2 around it.
        let col = layout.board_x as f32 + px / self.tile_size * CELL_W as f32;
        let row = layout.board_y as f32 + py / self.tile_size * CELL_H as f32;
        let (x, y) = (col.round() as i32 - 1, row.round() as i32 - 1);

        let clip = p.current_clip();
        let frame = clip.sheet_frame().and_then(|i| self.assets.frame(clip.sheet, i));
        match frame {
            Some(f) if p.facing_right => self.front.blit(x, y, f),
            Some(f) => {
                let f = f.mirrored();
                self.front.blit(x, y, &f);
            }
            None => {
                let fg = if p.current_clip_id() == ClipId::Death {
                    DIM_FG
                } else if p.mask_active {
                    MASK_COLOR
                } else {
                    PLAYER_COLOR
                };
                for dy in 0..2 {
                    for dx in 0..2 {
                        let bg = self.front.bg_at(x + dx, y + dy);
                        self.front.set(x + dx, y + dy, Cell::new('█', fg, bg));
                    }
                }
            }
        }
    }

    fn compose_panel(&mut self, mut panel: Panel, title_fg: Color) {
        panel.layout(self.term_w as u16, self.term_h as u16);
        let r = panel.rect;
        self.front.fill(r, PANEL_BG);

        // Border
        let (x0, y0) = (r.x as i32, r.y as i32);
        let (x1, y1) = (x0 + r.w as i32 - 1, y0 + r.h as i32 - 1);
        for x in x0 + 1..x1 {
            self.front.set(x, y0, Cell::new('─', title_fg, PANEL_BG));
            self.front.set(x, y1, Cell::new('─', title_fg, PANEL_BG));
        }
        for y in y0 + 1..y1 {
            self.front.set(x0, y, Cell::new('│', title_fg, PANEL_BG));
            self.front.set(x1, y, Cell::new('│', title_fg, PANEL_BG));
        }
        for (x, y, c) in [(x0, y0, '┌'), (x1, y0, '┐'), (x0, y1, '└'), (x1, y1, '┘')] {
            self.front.set(x, y, Cell::new(c, title_fg, PANEL_BG));
        }

        let center = |s: &str| x0 + (r.w as i32 - s.chars().count() as i32) / 2;
        let mut y = y0 + 1;
        self.front.put_str(center(&panel.title), y, &panel.title, title_fg, PANEL_BG);
        y += 1;
        if let Some(sub) = &panel.subtitle {
            self.front.put_str(center(sub), y, sub, DANGER_FG, PANEL_BG);
            y += 1;
        }
        y += 1;
        for line in &panel.lines {
            self.front.put_str(center(line), y, line, TEXT_FG, PANEL_BG);
            y += 1;
        }

        for b in &panel.buttons {
            self.compose_button(b);
        }
        self.panel = Some(panel);
    }

    fn compose_button(&mut self, b: &Button) {
        let bg = if b.selected { BUTTON_SEL_BG } else { BUTTON_BG };
        self.front.fill(b.rect, bg);
        let text = format!("[ {} ]", b.label);
        let x = b.rect.x as i32 + (b.rect.w as i32 - text.chars().count() as i32).max(0) / 2;
        self.front.put_str(x, b.rect.y as i32, &text, Color::White, bg);
    }

    // ── Editor ──

    fn compose_editor(&mut self, w: &WorldState) {
        let layout = Layout::compute(
            self.term_w as u16, self.term_h as u16,
            w.level.width(), w.level.height(), true,
        );
        self.layout = Some(layout);

        for x in 0..self.front.width {
            self.front.set(x as i32, 0, Cell::new(' ', Color::White, HUD_BG));
        }
        let title = format!(" LEVEL EDITOR: {}{}", w.level.name, if w.editor.modified { " *" } else { "" });
        self.front.put_str(0, 0, &title, TITLE_FG, HUD_BG);
        let status = hud::editor_status(&w.level.info());
        let sx = self.front.width.saturating_sub(status.chars().count()) as i32;
        self.front.put_str(sx.max(title.chars().count() as i32 + 1), 0, &status, DIM_FG, HUD_BG);
        self.front.put_centered(1, hud::EDITOR_HELP, DIM_FG, Color::Reset);

        // Mask forced on: fakes are always visible while editing.
        self.compose_board(w, &layout, true, false);

        // Preview of the selected type under the cursor.
        let (gx, gy) = w.editor.cursor;
        if w.level.is_valid_position((gx, gy)) {
            let (cx, cy) = layout.cell_origin(gx, gy);
            self.compose_tile(cx, cy, w.editor.selected, false);
            let (x1, y1) = (cx + CELL_W as i32 - 1, cy + CELL_H as i32 - 1);
            for (x, y, c) in [(cx, cy, '┌'), (x1, cy, '┐'), (cx, y1, '└'), (x1, y1, '┘')] {
                let bg = self.front.bg_at(x, y);
                self.front.set(x, y, Cell::new(c, CURSOR_FG, bg));
            }
        }

        if let Some(area) = layout.toolbar {
            self.front.fill(area, PANEL_BG);
            self.front.put_str(area.x as i32 + 1, area.y as i32, "Tiles", TITLE_FG, PANEL_BG);
            self.toolbar = hud::editor_toolbar(area, w.editor.selected);
            let buttons = std::mem::take(&mut self.toolbar);
            for b in &buttons {
                self.compose_button(b);
                if let ButtonAction::SelectTile(kind) = b.action {
                    // colour swatch at the right edge
                    let sx = (b.rect.x + b.rect.w) as i32 - 2;
                    self.front.set(sx, b.rect.y as i32, Cell::new(' ', Color::White, tile_color(kind)));
                }
            }
            self.toolbar = buttons;
        }

        let below = layout.board_y as i32 + (layout.rows * CELL_H) as i32 + 1;
        if !w.message.is_empty() {
            self.front.put_centered(below, &w.message, TITLE_FG, Color::Reset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::level::LevelCatalog;
    use crate::sim::step;

    fn setup() -> (Renderer, WorldState, GameConfig) {
        let config = GameConfig::default();
        let dir = std::env::temp_dir().join("floor_is_a_lie_renderer_none");
        let world = WorldState::new(&config, LevelCatalog::load(&dir));
        let mut r = Renderer::new(AssetManager::with_defaults(), config.display.tile_size);
        r.resize(120, 40);
        (r, world, config)
    }

    fn row_text(r: &Renderer, y: usize) -> String {
        (0..r.front.width).map(|x| r.front.get(x, y).ch).collect()
    }

    #[test]
    fn menu_has_title() {
        let (mut r, world, _) = setup();
        r.compose(&world);
        assert!((0..r.front.height).any(|y| row_text(&r, y).contains("THE  FLOOR  IS  A  LIE")));
        assert!(r.layout.is_none());
    }

    #[test]
    fn hud_shows_time_and_mask() {
        let (mut r, mut world, config) = setup();
        step::start_game(&mut world, &config);
        r.compose(&world);
        let hud = row_text(&r, 0);
        assert!(hud.contains("Time: 00:00"));
        assert!(hud.contains("Mask: Ready"));
        assert!(hud.contains("Mask Uses: 0"));
    }

    #[test]
    fn result_panel_buttons_are_clickable() {
        let (mut r, mut world, config) = setup();
        step::start_game(&mut world, &config);
        world.score.complete_level();
        world.phase = Phase::LevelClear;
        r.compose(&world);
        let panel = r.panel.clone().unwrap();
        let cont = &panel.buttons[0];
        assert_eq!(r.hit(cont.rect.x, cont.rect.y), Some(ButtonAction::Continue));
        assert_eq!(r.grid_cell(cont.rect.x, cont.rect.y), None);
    }

    #[test]
    fn editor_toolbar_is_retained() {
        let (mut r, mut world, _) = setup();
        step::enter_editor(&mut world);
        r.compose(&world);
        assert_eq!(r.toolbar.len(), 8);
        let back = &r.toolbar[7];
        assert_eq!(r.hit(back.rect.x, back.rect.y), Some(ButtonAction::BackToGame));
        assert_eq!(r.grid_cell(back.rect.x, back.rect.y), None);

        let layout = r.layout.unwrap();
        let (cx, cy) = layout.cell_origin(2, 3);
        assert_eq!(r.grid_cell(cx as u16, cy as u16), Some((2, 3)));
    }

    #[test]
    fn editor_header_shows_level_info() {
        let (mut r, mut world, _) = setup();
        step::enter_editor(&mut world);
        r.compose(&world);
        let header = row_text(&r, 0);
        assert!(header.contains("LEVEL EDITOR: Default Level"));
        assert!(header.contains("11x10 | Start (1,1) | Exit (9,6)"));
    }

    #[test]
    fn editor_reveals_fakes() {
        let (mut r, mut world, _) = setup();
        world.level.set_tile_type((1, 1), TileType::Fake);
        step::enter_editor(&mut world);
        world.editor.cursor = (0, 0);
        r.compose(&world);
        let (cx, cy) = r.layout.unwrap().cell_origin(1, 1);
        assert_eq!(r.front.get(cx as usize + 1, cy as usize + 1).bg, tile_color(TileType::Fake));
    }

    #[test]
    fn fakes_look_real_without_mask() {
        let (mut r, mut world, config) = setup();
        step::start_game(&mut world, &config);
        world.level.set_tile_type((1, 1), TileType::Fake);
        r.compose(&world);
        let (cx, cy) = r.layout.unwrap().cell_origin(1, 1);
        assert_eq!(r.front.get(cx as usize + 1, cy as usize).bg, tile_color(TileType::Real));
    }

    #[test]
    fn blend_moves_toward_tint() {
        let c = blend(Color::Rgb { r: 0, g: 0, b: 0 }, Color::Rgb { r: 200, g: 100, b: 0 }, 0.5);
        assert_eq!(c, Color::Rgb { r: 100, g: 50, b: 0 });
        assert_eq!(blend(Color::White, MASK_COLOR, 0.5), Color::White);
    }
}
