/// Gamepad input tracker using gilrs.
///
/// Button mapping comes from the `[gamepad]` section of config.toml.
/// Default mapping:
///   D-pad / Left Stick    →  Movement (editor cursor)
///   A / X                 →  Toggle mask
///   Start / A             →  Confirm (start, continue, paint in editor)
///   Select                →  Back / leave editor
///   Y                     →  Restart level
///   L1                    →  Open editor

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::player::MoveDir;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Same order as keyboard movement priority.
const DIRS: [MoveDir; 4] = [MoveDir::Left, MoveDir::Right, MoveDir::Up, MoveDir::Down];

/// Logical button identifiers (one per physical face/shoulder button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "L2" | "LT" => Some(Btn::L2),
            "R2" | "RT" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2 => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Things a pad button can be bound to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PadAction {
    Mask,
    Confirm,
    Cancel,
    Restart,
    Editor,
}

/// Per-input state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

impl BtnState {
    fn set(&mut self, held: bool) {
        if held && !self.held {
            self.just_pressed = true;
        }
        self.held = held;
    }
}

fn parse_list(names: &[String]) -> Vec<Btn> {
    names.iter().filter_map(|s| Btn::from_name(s)).collect()
}

fn dir_index(dir: MoveDir) -> usize {
    match dir {
        MoveDir::Left => 0,
        MoveDir::Right => 1,
        MoveDir::Up => 2,
        MoveDir::Down => 3,
    }
}

/// Stick position → held flags in `DIRS` order. Positive Y is up.
fn stick_dirs(x: f32, y: f32) -> [bool; 4] {
    [x < -STICK_DEADZONE, x > STICK_DEADZONE, y > STICK_DEADZONE, y < -STICK_DEADZONE]
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; 10],
    dpad: [BtnState; 4],
    stick: [BtnState; 4],
    stick_x: f32,
    stick_y: f32,

    /// Indexed by `PadAction as usize`.
    bindings: [Vec<Btn>; 5],

    pub connected: bool,
}

impl GamepadState {
    pub fn new(cfg: &GamepadConfig) -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                if has_pad {
                    log::info!("gamepad connected");
                }
                (Some(g), has_pad)
            }
            Err(e) => {
                log::warn!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs,
            buttons: [BtnState::default(); 10],
            dpad: [BtnState::default(); 4],
            stick: [BtnState::default(); 4],
            stick_x: 0.0,
            stick_y: 0.0,
            bindings: [
                parse_list(&cfg.mask),
                parse_list(&cfg.confirm),
                parse_list(&cfg.cancel),
                parse_list(&cfg.restart),
                parse_list(&cfg.editor),
            ],
            connected,
        }
    }

    pub fn update(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            b.just_pressed = false;
        }

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();

        let held = stick_dirs(self.stick_x, self.stick_y);
        for (state, h) in self.stick.iter_mut().zip(held) {
            state.set(h);
        }
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let Some(gilrs) = &mut self.gilrs else { return };
        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => self.set_button(btn, false),
                EventType::AxisChanged(Axis::LeftStickX, v, _) => self.stick_x = v,
                EventType::AxisChanged(Axis::LeftStickY, v, _) => self.stick_y = v,
                EventType::Connected => self.connected = true,
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, btn: Button, held: bool) {
        let dpad = match btn {
            Button::DPadLeft => Some(MoveDir::Left),
            Button::DPadRight => Some(MoveDir::Right),
            Button::DPadUp => Some(MoveDir::Up),
            Button::DPadDown => Some(MoveDir::Down),
            _ => None,
        };
        if let Some(dir) = dpad {
            self.dpad[dir_index(dir)].set(held);
        } else if let Some(b) = Btn::from_gilrs(btn) {
            self.buttons[b as usize].set(held);
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            *b = BtnState::default();
        }
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }

    // ── Queries ──

    pub fn pressed(&self, action: PadAction) -> bool {
        self.bindings[action as usize].iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    /// Held direction from d-pad or stick.
    pub fn movement(&self) -> Option<MoveDir> {
        DIRS.into_iter().find(|&d| {
            let i = dir_index(d);
            self.dpad[i].held || self.stick[i].held
        })
    }

    pub fn movement_pressed(&self) -> Option<MoveDir> {
        DIRS.into_iter().find(|&d| {
            let i = dir_index(d);
            self.dpad[i].just_pressed || self.stick[i].just_pressed
        })
    }
}
