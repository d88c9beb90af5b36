/// Keyboard and mouse state for one frame.
///
/// Arrow/WASD keys are level-triggered (held keys keep the player walking);
/// commands such as mask or restart are edge-triggered. Terminals that never
/// send key releases are handled by letting a key lapse when no press or
/// repeat has arrived for `HOLD_TIMEOUT`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

use crate::domain::player::MoveDir;

/// A key with no press or repeat for this long counts as released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// Checked in this order; the first held one wins.
const MOVE_KEYS: [(MoveDir, [KeyCode; 3]); 4] = [
    (MoveDir::Left, [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')]),
    (MoveDir::Right, [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')]),
    (MoveDir::Up, [KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')]),
    (MoveDir::Down, [KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')]),
];

pub struct InputState {
    held_since: HashMap<KeyCode, Instant>,

    /// Keys that went down during the last drain.
    pressed_now: Vec<KeyCode>,

    /// Every key event of the last drain; Ctrl chords are read from here.
    pub chords: Vec<KeyEvent>,

    /// Left-button presses as terminal (column, row).
    pub clicks: Vec<(u16, u16)>,

    /// Trust Release events (set once the terminal reports them).
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            held_since: HashMap::new(),
            pressed_now: Vec::new(),
            chords: Vec::new(),
            clicks: Vec::new(),
            honor_release: false,
        }
    }

    /// Once per frame, before stepping the world.
    pub fn drain_events(&mut self) {
        self.pressed_now.clear();
        self.chords.clear();
        self.clicks.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.on_key(key),
                Ok(Event::Mouse(m)) => {
                    if let MouseEventKind::Down(MouseButton::Left) = m.kind {
                        self.clicks.push((m.column, m.row));
                    }
                }
                _ => {}
            }
        }

        // lapse keys the terminal never released
        if !self.honor_release {
            let now = Instant::now();
            self.held_since.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        self.chords.push(key);
        // Ctrl chords are commands, never held movement
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return;
        }
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.held_since.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held(key.code);
                self.held_since.insert(key.code, Instant::now());
                if !was_held {
                    self.pressed_now.push(key.code);
                }
            }
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held_since.get(&code)
            .is_some_and(|t| self.honor_release || t.elapsed() < HOLD_TIMEOUT)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().copied().any(|c| self.is_held(c))
    }

    /// Edge-triggered.
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.pressed_now.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().copied().any(|c| self.was_pressed(c))
    }

    /// Case-insensitive letter press without Ctrl.
    pub fn letter_pressed(&self, c: char) -> bool {
        self.was_pressed(KeyCode::Char(c.to_ascii_lowercase()))
            || self.was_pressed(KeyCode::Char(c.to_ascii_uppercase()))
    }

    /// Any fresh key press at all (menu, level clear).
    pub fn any_key_pressed(&self) -> bool {
        !self.pressed_now.is_empty()
    }

    /// Ctrl + letter, edge-triggered by event.
    pub fn ctrl_pressed(&self, c: char) -> bool {
        self.chords.iter().any(|k| {
            k.kind != KeyEventKind::Release
                && k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char(ch) if ch.eq_ignore_ascii_case(&c))
        })
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.ctrl_pressed('c')
    }

    /// Currently held movement direction, if any.
    pub fn movement(&self) -> Option<MoveDir> {
        MOVE_KEYS.iter()
            .find(|(_, keys)| self.any_held(keys))
            .map(|(dir, _)| *dir)
    }

    /// Movement keys pressed this frame (editor cursor).
    pub fn movement_pressed(&self) -> Option<MoveDir> {
        MOVE_KEYS.iter()
            .find(|(_, keys)| self.any_pressed(keys))
            .map(|(dir, _)| *dir)
    }

    /// Digit 1..=9 pressed this frame, as 0-based slot.
    pub fn digit_pressed(&self) -> Option<usize> {
        (1..=9u32).find_map(|d| {
            let ch = char::from_digit(d, 10)?;
            self.was_pressed(KeyCode::Char(ch)).then_some(d as usize - 1)
        })
    }

    #[cfg(test)]
    fn inject(&mut self, key: KeyEvent) {
        self.on_key(key);
    }
}
