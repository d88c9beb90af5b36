/// Player: grid-locked movement, the mask ability, and the sprite state machine.
///
/// Position is kept in two forms:
///   - `x, y`           : continuous pixel position (centre of the sprite)
///   - `grid_x, grid_y` : the cell under that position
///
/// A move sets `target` to a neighbouring cell; `update` slides the pixel
/// position toward its centre and recomputes the grid cell every frame, so
/// hazards trigger as soon as the player is halfway across a tile edge.
///
/// Animation state machine:
///
/// ```text
///   Idle ──move──▶ TransitioningToRun ──done──▶ Running
///    ▲                  │ stop                    │ stop
///    │                  ▼                         ▼
///    └──────done── TransitioningToIdle ◀──────────┘
///
///   Idle ──mask on──▶ MaskActivating ──done──▶ MaskActive
///                                                │ mask off
///   Idle ◀──────done── MaskDeactivating ◀────────┘
///
///   any ──start_death_animation──▶ Death
/// ```

use log::{debug, info, warn};

use crate::config::GameConfig;
use super::animation::Animation;
use super::tile::TileQuery;

pub const SHEET_IDLE: &str = "player_idle";
pub const SHEET_TRANSITION: &str = "player_transition";
pub const SHEET_RUNNING: &str = "player_running";
pub const SHEET_WALK_FORWARD: &str = "player_walk_forward";
pub const SHEET_WALK_BACKWARD: &str = "player_walk_backward";
pub const SHEET_MASK: &str = "player_mask";
pub const SHEET_DEATH: &str = "player_death";

/// Snap to the target centre once closer than this (pixels).
const ARRIVE_EPSILON: f32 = 5.0;
/// Fraction of a tile the player must be within before the next step queues.
const QUEUE_WINDOW: f32 = 0.4;
/// Seconds the run animation keeps going after movement stops.
const IDLE_TRANSITION_DELAY: f32 = 0.15;
/// Mask timers count down to this instead of exactly zero.
const TIMER_EPSILON: f32 = 0.001;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Left,
    Right,
    Up,
    Down,
}

impl MoveDir {
    pub fn delta(self) -> (i32, i32) {
        match self {
            MoveDir::Left => (-1, 0),
            MoveDir::Right => (1, 0),
            MoveDir::Up => (0, -1),
            MoveDir::Down => (0, 1),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimationState {
    Idle,
    TransitioningToRun,
    Running,
    TransitioningToIdle,
    MaskActivating,
    MaskActive,
    MaskDeactivating,
    Death,
}

/// Which clip is currently driving the sprite.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClipId {
    Idle,
    Transition,
    Running,
    WalkForward,
    WalkBackward,
    Mask,
    Death,
}

/// Outcome of pressing the mask key.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MaskToggle {
    Activated,
    Deactivated,
    Unavailable,
}

/// Mask timer transitions reported by `update`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MaskChange {
    /// Duration ran out; cooldown started.
    Expired,
    /// Cooldown finished; mask can be used again.
    Recharged,
}

/// Snapshot for the HUD.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct MaskStatus {
    pub active: bool,
    pub timer: f32,
    pub duration: f32,
    pub recharge_timer: f32,
    pub cooldown: f32,
    pub available: bool,
    pub uses: u32,
}

#[derive(Clone, Debug)]
struct Clips {
    idle: Animation,
    transition: Animation,
    running: Animation,
    walk_forward: Animation,
    walk_backward: Animation,
    mask: Animation,
    death: Animation,
}

impl Clips {
    fn new() -> Self {
        let all36 = || Some((0..36).collect());
        Clips {
            idle: Animation::new(SHEET_IDLE, 6, 6, all36(), 0.08, true),
            // 16 frames over half a second, once
            transition: Animation::new(SHEET_TRANSITION, 4, 4, Some((0..16).collect()), 0.031_25, false),
            running: Animation::new(SHEET_RUNNING, 6, 6, all36(), 0.08, true),
            walk_forward: Animation::new(SHEET_WALK_FORWARD, 6, 6, all36(), 0.08, true),
            walk_backward: Animation::new(SHEET_WALK_BACKWARD, 6, 6, all36(), 0.08, true),
            mask: Animation::new(SHEET_MASK, 6, 6, all36(), 0.5 / 36.0, false),
            death: Animation::new(SHEET_DEATH, 6, 6, all36(), 0.08, false),
        }
    }

    fn get(&self, id: ClipId) -> &Animation {
        match id {
            ClipId::Idle => &self.idle,
            ClipId::Transition => &self.transition,
            ClipId::Running => &self.running,
            ClipId::WalkForward => &self.walk_forward,
            ClipId::WalkBackward => &self.walk_backward,
            ClipId::Mask => &self.mask,
            ClipId::Death => &self.death,
        }
    }

    fn get_mut(&mut self, id: ClipId) -> &mut Animation {
        match id {
            ClipId::Idle => &mut self.idle,
            ClipId::Transition => &mut self.transition,
            ClipId::Running => &mut self.running,
            ClipId::WalkForward => &mut self.walk_forward,
            ClipId::WalkBackward => &mut self.walk_backward,
            ClipId::Mask => &mut self.mask,
            ClipId::Death => &mut self.death,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    // ── Position ──
    pub x: f32,
    pub y: f32,
    pub grid_x: i32,
    pub grid_y: i32,
    pub velocity: (f32, f32),
    pub target: Option<(i32, i32)>,
    pub moving: bool,

    // ── Mask ──
    pub mask_active: bool,
    pub mask_available: bool,
    pub mask_timer: f32,
    pub mask_recharge_timer: f32,
    pub mask_duration: f32,
    pub mask_cooldown: f32,
    pub mask_uses: u32,

    // ── Animation ──
    pub facing_right: bool,
    pub movement_direction: Option<MoveDir>,
    pub movement_keys_pressed: bool,
    pub anim_state: AnimationState,
    time_since_movement_stopped: f32,
    clips: Clips,
    current: ClipId,

    // ── Constants copied from config ──
    speed: f32,
    tile_size: f32,
    grid_bounds: (usize, usize),
}

impl Player {
    pub fn new(config: &GameConfig, start: (i32, i32)) -> Self {
        let (x, y) = config.grid_center(start.0, start.1);
        let mut player = Player {
            x,
            y,
            grid_x: start.0,
            grid_y: start.1,
            velocity: (0.0, 0.0),
            target: None,
            moving: false,
            mask_active: false,
            mask_available: true,
            mask_timer: 0.0,
            mask_recharge_timer: 0.0,
            mask_duration: config.mask.duration,
            mask_cooldown: config.mask.cooldown,
            mask_uses: 0,
            facing_right: true,
            movement_direction: None,
            movement_keys_pressed: false,
            anim_state: AnimationState::Idle,
            time_since_movement_stopped: IDLE_TRANSITION_DELAY,
            clips: Clips::new(),
            current: ClipId::Idle,
            speed: config.player.speed,
            tile_size: config.display.tile_size,
            grid_bounds: (config.display.grid_width, config.display.grid_height),
        };
        player.switch_clip(ClipId::Idle, false);
        player
    }

    // ══════════════════════════════════════════════════════════
    // Per-frame update
    // ══════════════════════════════════════════════════════════

    pub fn update(&mut self, dt: f32) -> Option<MaskChange> {
        self.update_movement(dt);
        self.update_mask(dt)
    }

    pub fn update_movement(&mut self, dt: f32) {
        self.resolve_mask_animation();
        self.resolve_motion(dt);

        if self.moving {
            self.time_since_movement_stopped = 0.0;
        } else {
            self.time_since_movement_stopped += dt;
        }

        self.resolve_locomotion_animation();
        let clip = self.clips.get_mut(self.current);
        if clip.is_playing() {
            clip.update(dt);
        }
    }

    fn resolve_mask_animation(&mut self) {
        match self.anim_state {
            AnimationState::MaskActivating => {
                // Hold the last frame while the mask stays on
                if self.current_clip().is_completed() {
                    self.anim_state = AnimationState::MaskActive;
                }
            }
            AnimationState::MaskActive => {
                if !self.mask_active {
                    self.anim_state = AnimationState::MaskDeactivating;
                    self.switch_clip(ClipId::Mask, true);
                }
            }
            AnimationState::MaskDeactivating => {
                if self.current_clip().is_completed() {
                    self.anim_state = AnimationState::Idle;
                    self.switch_clip(ClipId::Idle, false);
                }
            }
            _ => {}
        }
    }

    fn resolve_motion(&mut self, dt: f32) {
        let Some((tgx, tgy)) = self.target else { return };
        let (tx, ty) = self.cell_center(tgx, tgy);
        let dx = tx - self.x;
        let dy = ty - self.y;
        let distance = (dx * dx + dy * dy).sqrt();
        let step = self.speed * dt;

        if distance < ARRIVE_EPSILON || step >= distance {
            self.x = tx;
            self.y = ty;
            self.grid_x = tgx;
            self.grid_y = tgy;
            self.target = None;
            self.velocity = (0.0, 0.0);
            self.moving = false;
            return;
        }

        self.velocity = (dx / distance * self.speed, dy / distance * self.speed);
        self.moving = true;
        self.x += self.velocity.0 * dt;
        self.y += self.velocity.1 * dt;
        self.grid_x = (self.x / self.tile_size).floor() as i32;
        self.grid_y = (self.y / self.tile_size).floor() as i32;
    }

    fn resolve_locomotion_animation(&mut self) {
        let actively_moving = self.moving
            || self.movement_keys_pressed
            || self.time_since_movement_stopped < IDLE_TRANSITION_DELAY;

        match self.anim_state {
            AnimationState::Idle => {
                if actively_moving {
                    self.anim_state = AnimationState::TransitioningToRun;
                    self.switch_clip(ClipId::Transition, false);
                }
            }
            AnimationState::TransitioningToRun => {
                if self.current_clip().is_completed() {
                    let clip = self.locomotion_clip();
                    debug!("run transition complete, direction {:?} → {:?}", self.movement_direction, clip);
                    self.anim_state = AnimationState::Running;
                    self.switch_clip(clip, false);
                } else if !actively_moving {
                    self.anim_state = AnimationState::TransitioningToIdle;
                    self.switch_clip(ClipId::Transition, true);
                }
            }
            AnimationState::Running => {
                if actively_moving {
                    let desired = self.locomotion_clip();
                    if desired != self.current {
                        self.switch_clip(desired, false);
                    }
                } else {
                    // looping clips never complete, so wind down on the transition clip
                    self.anim_state = AnimationState::TransitioningToIdle;
                    self.switch_clip(ClipId::Transition, true);
                }
            }
            AnimationState::TransitioningToIdle => {
                if self.current_clip().is_completed() {
                    self.anim_state = AnimationState::Idle;
                    self.switch_clip(ClipId::Idle, false);
                    self.movement_direction = None;
                } else if actively_moving {
                    self.anim_state = AnimationState::TransitioningToRun;
                    self.switch_clip(ClipId::Transition, false);
                }
            }
            _ => {}
        }
    }

    fn locomotion_clip(&self) -> ClipId {
        match self.movement_direction {
            Some(MoveDir::Up) => ClipId::WalkBackward,
            Some(MoveDir::Down) => ClipId::WalkForward,
            _ => ClipId::Running,
        }
    }

    pub fn update_mask(&mut self, dt: f32) -> Option<MaskChange> {
        if self.mask_active {
            self.mask_timer -= dt;
            if self.mask_timer <= TIMER_EPSILON {
                self.deactivate_mask();
                return Some(MaskChange::Expired);
            }
        } else if !self.mask_available {
            self.mask_recharge_timer -= dt;
            if self.mask_recharge_timer <= TIMER_EPSILON {
                self.mask_available = true;
                self.mask_recharge_timer = 0.0;
                return Some(MaskChange::Recharged);
            }
        }
        None
    }

    // ══════════════════════════════════════════════════════════
    // Input
    // ══════════════════════════════════════════════════════════

    /// Apply the currently held direction (if any). Called every frame.
    pub fn handle_input(&mut self, dir: Option<MoveDir>, map: Option<&dyn TileQuery>) {
        self.movement_keys_pressed = dir.is_some();
        let Some(dir) = dir else { return };

        match dir {
            MoveDir::Left => self.facing_right = false,
            MoveDir::Right => self.facing_right = true,
            MoveDir::Up | MoveDir::Down => {} // keep facing
        }
        // Persists through the run transition; cleared on return to Idle.
        self.movement_direction = Some(dir);

        let mut base = (self.grid_x, self.grid_y);
        if self.moving {
            if let Some(target) = self.target {
                let (tx, ty) = self.cell_center(target.0, target.1);
                let distance = ((tx - self.x).powi(2) + (ty - self.y).powi(2)).sqrt();
                if distance > self.tile_size * QUEUE_WINDOW {
                    return;
                }
                base = target;
            }
        }

        let (dx, dy) = dir.delta();
        let next = (base.0 + dx, base.1 + dy);
        if next != base {
            debug!("player moving to grid position {:?}", next);
            self.move_to_grid(next.0, next.1, map);
        }
    }

    /// Set a movement target. Ignored when out of bounds or not walkable.
    pub fn move_to_grid(&mut self, gx: i32, gy: i32, map: Option<&dyn TileQuery>) {
        let (w, h) = map.map(|m| m.dimensions()).unwrap_or(self.grid_bounds);
        if gx < 0 || gy < 0 || gx as usize >= w || gy as usize >= h {
            return;
        }
        if let Some(m) = map {
            if !m.is_walkable(gx, gy, self.mask_active) {
                return;
            }
        }
        self.target = Some((gx, gy));
        self.moving = true;
    }

    /// Place the player on a cell immediately, cancelling any movement.
    pub fn teleport(&mut self, gx: i32, gy: i32) {
        let (x, y) = self.cell_center(gx, gy);
        self.x = x;
        self.y = y;
        self.grid_x = gx;
        self.grid_y = gy;
        self.target = None;
        self.velocity = (0.0, 0.0);
        self.moving = false;
    }

    // ══════════════════════════════════════════════════════════
    // Mask
    // ══════════════════════════════════════════════════════════

    pub fn toggle_mask(&mut self) -> MaskToggle {
        debug!("toggle mask: available={} active={}", self.mask_available, self.mask_active);
        if self.mask_available && !self.mask_active {
            info!("activating mask");
            self.activate_mask();
            MaskToggle::Activated
        } else if self.mask_active {
            info!("deactivating mask");
            self.deactivate_mask();
            MaskToggle::Deactivated
        } else {
            warn!("mask toggle ignored: still recharging");
            MaskToggle::Unavailable
        }
    }

    fn activate_mask(&mut self) {
        self.mask_active = true;
        self.mask_available = false;
        self.mask_timer = self.mask_duration;
        self.mask_uses += 1;

        if self.anim_state == AnimationState::Idle {
            self.anim_state = AnimationState::MaskActivating;
            self.switch_clip(ClipId::Mask, false);
        }
    }

    fn deactivate_mask(&mut self) {
        self.mask_active = false;
        self.mask_timer = 0.0;
        self.mask_available = false;
        self.mask_recharge_timer = self.mask_cooldown;

        if self.anim_state == AnimationState::MaskActive {
            self.anim_state = AnimationState::MaskDeactivating;
            self.switch_clip(ClipId::Mask, true);
        }
    }

    pub fn mask_status(&self) -> MaskStatus {
        MaskStatus {
            active: self.mask_active,
            timer: self.mask_timer,
            duration: self.mask_duration,
            recharge_timer: self.mask_recharge_timer,
            cooldown: self.mask_cooldown,
            available: self.mask_available,
            uses: self.mask_uses,
        }
    }

    // ══════════════════════════════════════════════════════════
    // Death / reset / config
    // ══════════════════════════════════════════════════════════

    pub fn start_death_animation(&mut self) {
        self.anim_state = AnimationState::Death;
        self.target = None;
        self.moving = false;
        self.velocity = (0.0, 0.0);
        self.switch_clip(ClipId::Death, false);
    }

    pub fn is_death_animation_complete(&self) -> bool {
        self.anim_state == AnimationState::Death && self.current_clip().is_completed()
    }

    /// Only advances the current clip (used while dying).
    pub fn update_animation(&mut self, dt: f32) {
        self.clips.get_mut(self.current).update(dt);
    }

    pub fn set_config(&mut self, mask_duration: Option<f32>, mask_cooldown: Option<f32>) {
        if let Some(d) = mask_duration {
            self.mask_duration = d;
        }
        if let Some(c) = mask_cooldown {
            self.mask_cooldown = c;
        }
    }

    pub fn reset(&mut self, start: (i32, i32)) {
        self.teleport(start.0, start.1);

        self.anim_state = AnimationState::Idle;
        self.time_since_movement_stopped = IDLE_TRANSITION_DELAY;
        self.movement_keys_pressed = false;
        self.movement_direction = None;
        self.facing_right = true;
        self.clips.death.stop();
        self.clips.idle.stop();
        self.switch_clip(ClipId::Idle, false);

        self.mask_active = false;
        self.mask_timer = 0.0;
        self.mask_recharge_timer = 0.0;
        self.mask_available = true;
        self.mask_uses = 0;
    }

    // ══════════════════════════════════════════════════════════
    // Queries
    // ══════════════════════════════════════════════════════════

    pub fn grid_position(&self) -> (i32, i32) {
        (self.grid_x, self.grid_y)
    }

    pub fn screen_position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn current_clip_id(&self) -> ClipId {
        self.current
    }

    pub fn current_clip(&self) -> &Animation {
        self.clips.get(self.current)
    }

    // ── Internal ──

    fn switch_clip(&mut self, id: ClipId, reverse: bool) {
        self.current = id;
        let clip = self.clips.get_mut(id);
        clip.play(reverse);
        debug!("clip {:?}{} ({} frames, {:.2}s)", id, if reverse { " reversed" } else { "" },
            clip.num_frames(), clip.total_duration());
    }

    fn cell_center(&self, gx: i32, gy: i32) -> (f32, f32) {
        let half = self.tile_size / 2.0;
        (gx as f32 * self.tile_size + half, gy as f32 * self.tile_size + half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::TileType;

    const DT: f32 = 1.0 / 60.0;

    /// Minimal map: rows of chars, `.` empty, `#` real, `f` fake.
    struct Grid(Vec<Vec<TileType>>);

    impl Grid {
        fn parse(rows: &[&str]) -> Self {
            Grid(rows.iter().map(|r| r.chars().map(|c| match c {
                '#' => TileType::Real,
                'f' => TileType::Fake,
                _ => TileType::Empty,
            }).collect()).collect())
        }
    }

    impl TileQuery for Grid {
        fn dimensions(&self) -> (usize, usize) {
            (self.0.first().map_or(0, |r| r.len()), self.0.len())
        }
        fn tile_type(&self, x: i32, y: i32) -> Option<TileType> {
            if x < 0 || y < 0 { return None; }
            self.0.get(y as usize)?.get(x as usize).copied()
        }
    }

    fn player_at(x: i32, y: i32) -> Player {
        Player::new(&GameConfig::default(), (x, y))
    }

    fn run(p: &mut Player, frames: usize) {
        for _ in 0..frames {
            p.update(DT);
        }
    }

    #[test]
    fn starts_idle_at_cell_centre() {
        let p = player_at(1, 1);
        assert_eq!(p.grid_position(), (1, 1));
        assert_eq!(p.screen_position(), (60.0, 60.0));
        assert!(p.mask_available);
        assert!(!p.mask_active);
        assert_eq!(p.anim_state, AnimationState::Idle);
    }

    #[test]
    fn moves_to_target_and_stops() {
        let mut p = player_at(1, 1);
        p.move_to_grid(2, 2, None);
        assert_eq!(p.target, Some((2, 2)));
        assert!(p.moving);
        run(&mut p, 30);
        assert_eq!(p.grid_position(), (2, 2));
        assert_eq!(p.screen_position(), (100.0, 100.0));
        assert!(!p.moving);
        assert_eq!(p.target, None);
    }

    #[test]
    fn out_of_bounds_move_rejected() {
        let mut p = player_at(1, 1);
        p.move_to_grid(-1, -1, None);
        assert_eq!(p.target, None);
        p.move_to_grid(11, 0, None);
        assert_eq!(p.target, None);
    }

    #[test]
    fn map_bounds_and_void_respected() {
        let grid = Grid::parse(&["##.", "#f#"]);
        let mut p = player_at(1, 0);
        p.move_to_grid(2, 0, Some(&grid));
        assert_eq!(p.target, None, "void is not walkable");
        p.move_to_grid(1, 2, Some(&grid));
        assert_eq!(p.target, None, "outside the map");
        p.move_to_grid(1, 1, Some(&grid));
        assert_eq!(p.target, Some((1, 1)), "fake looks real");
    }

    #[test]
    fn grid_cell_flips_at_halfway() {
        let mut p = player_at(0, 0);
        p.move_to_grid(1, 0, None);
        // 20px to cross into the next cell at 200px/s ≈ 6 frames
        run(&mut p, 5);
        assert_eq!(p.grid_x, 0);
        run(&mut p, 2);
        assert_eq!(p.grid_x, 1);
        assert!(p.moving);
    }

    #[test]
    fn input_sets_target_and_facing() {
        let mut p = player_at(3, 3);
        p.handle_input(Some(MoveDir::Left), None);
        assert_eq!(p.target, Some((2, 3)));
        assert!(!p.facing_right);
        assert_eq!(p.movement_direction, Some(MoveDir::Left));
        assert!(p.movement_keys_pressed);
    }

    #[test]
    fn vertical_input_keeps_facing() {
        let mut p = player_at(3, 3);
        p.facing_right = false;
        p.handle_input(Some(MoveDir::Down), None);
        assert!(!p.facing_right);
        assert_eq!(p.target, Some((3, 4)));
    }

    #[test]
    fn no_input_clears_held_flag() {
        let mut p = player_at(3, 3);
        p.handle_input(Some(MoveDir::Up), None);
        p.handle_input(None, None);
        assert!(!p.movement_keys_pressed);
        assert_eq!(p.target, Some((3, 2)));
    }

    #[test]
    fn input_ignored_far_from_target_then_queues() {
        let mut p = player_at(0, 0);
        p.handle_input(Some(MoveDir::Right), None);
        p.update(DT);
        p.handle_input(Some(MoveDir::Right), None);
        assert_eq!(p.target, Some((1, 0)), "too far from target to queue");

        // Walk until within 40% of a tile (16px) of the target.
        run(&mut p, 8);
        p.handle_input(Some(MoveDir::Right), None);
        assert_eq!(p.target, Some((2, 0)));
    }

    #[test]
    fn mask_toggle_on_and_off() {
        let mut p = player_at(1, 1);
        assert_eq!(p.toggle_mask(), MaskToggle::Activated);
        assert!(p.mask_active);
        assert_eq!(p.mask_uses, 1);
        assert_eq!(p.toggle_mask(), MaskToggle::Deactivated);
        assert!(!p.mask_active);
        assert!(!p.mask_available);
        assert_eq!(p.toggle_mask(), MaskToggle::Unavailable);
        assert_eq!(p.mask_uses, 1);
    }

    #[test]
    fn mask_expires_then_recharges() {
        let mut p = player_at(1, 1);
        p.toggle_mask();
        let mut changes = vec![];
        for _ in 0..(2 * 60 + 1) {
            if let Some(c) = p.update(DT) { changes.push(c); }
        }
        assert!(!p.mask_active);
        assert!(!p.mask_available);
        assert_eq!(changes, vec![MaskChange::Expired]);

        for _ in 0..(5 * 60 + 1) {
            if let Some(c) = p.update(DT) { changes.push(c); }
        }
        assert!(p.mask_available);
        assert_eq!(changes, vec![MaskChange::Expired, MaskChange::Recharged]);
    }

    #[test]
    fn level_tunables_apply_to_mask() {
        let mut p = player_at(1, 1);
        p.set_config(Some(0.5), Some(1.0));
        p.toggle_mask();
        assert!((p.mask_timer - 0.5).abs() < f32::EPSILON);
        run(&mut p, 31);
        assert!(!p.mask_active);
        assert!((p.mask_status().cooldown - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn mask_animation_cycle_from_idle() {
        let mut p = player_at(1, 1);
        p.toggle_mask();
        assert_eq!(p.anim_state, AnimationState::MaskActivating);
        assert_eq!(p.current_clip_id(), ClipId::Mask);
        // 36 frames at 1/72s each finish well inside one second
        run(&mut p, 40);
        assert_eq!(p.anim_state, AnimationState::MaskActive);
        p.toggle_mask();
        assert_eq!(p.anim_state, AnimationState::MaskDeactivating);
        run(&mut p, 40);
        assert_eq!(p.anim_state, AnimationState::Idle);
        assert_eq!(p.current_clip_id(), ClipId::Idle);
    }

    #[test]
    fn movement_drives_run_animation() {
        let mut p = player_at(0, 5);
        p.handle_input(Some(MoveDir::Up), None);
        p.update(DT);
        assert_eq!(p.anim_state, AnimationState::TransitioningToRun);
        // keep the key held through the transition clip (0.5s)
        for _ in 0..40 {
            p.handle_input(Some(MoveDir::Up), None);
            p.update(DT);
        }
        assert_eq!(p.anim_state, AnimationState::Running);
        assert_eq!(p.current_clip_id(), ClipId::WalkBackward);
    }

    #[test]
    fn releasing_keys_returns_to_idle() {
        let mut p = player_at(0, 0);
        p.handle_input(Some(MoveDir::Right), None);
        for _ in 0..40 {
            p.handle_input(Some(MoveDir::Right), None);
            p.update(DT);
        }
        assert_eq!(p.anim_state, AnimationState::Running);
        p.handle_input(None, None);
        // wait out the queued steps, the idle delay, and the reversed transition
        for _ in 0..400 {
            p.handle_input(None, None);
            p.update(DT);
        }
        assert_eq!(p.anim_state, AnimationState::Idle);
        assert_eq!(p.movement_direction, None);
    }

    fn hold_until_running(p: &mut Player, dir: MoveDir) {
        for _ in 0..40 {
            p.handle_input(Some(dir), None);
            p.update(DT);
        }
        assert_eq!(p.anim_state, AnimationState::Running);
    }

    #[test]
    fn mask_overlay_plays_again_after_running() {
        let mut p = player_at(0, 0);
        hold_until_running(&mut p, MoveDir::Right);
        for _ in 0..400 {
            p.handle_input(None, None);
            p.update(DT);
        }
        assert_eq!(p.anim_state, AnimationState::Idle);
        assert_eq!(p.current_clip_id(), ClipId::Idle);

        p.toggle_mask();
        assert_eq!(p.anim_state, AnimationState::MaskActivating);
        assert_eq!(p.current_clip_id(), ClipId::Mask);
    }

    #[test]
    fn mask_while_running_keeps_locomotion() {
        let mut p = player_at(0, 0);
        hold_until_running(&mut p, MoveDir::Right);
        assert_eq!(p.toggle_mask(), MaskToggle::Activated);
        assert!(p.mask_active);
        assert_eq!(p.anim_state, AnimationState::Running);
        assert_eq!(p.current_clip_id(), ClipId::Running);

        p.handle_input(Some(MoveDir::Right), None);
        p.update(DT);
        assert_eq!(p.anim_state, AnimationState::Running);
    }

    #[test]
    fn stopping_mid_run_transition_reverses_it() {
        let mut p = player_at(0, 0);
        p.handle_input(Some(MoveDir::Right), None);
        p.update(DT);
        assert_eq!(p.anim_state, AnimationState::TransitioningToRun);

        // one tile takes ~12 frames, then the 0.15s grace; the 0.5s clip is still going
        for _ in 0..24 {
            p.handle_input(None, None);
            p.update(DT);
        }
        assert_eq!(p.anim_state, AnimationState::TransitioningToIdle);
        assert_eq!(p.current_clip_id(), ClipId::Transition);
        assert!(p.current_clip().is_playing());

        for _ in 0..40 {
            p.update(DT);
        }
        assert_eq!(p.anim_state, AnimationState::Idle);
    }

    #[test]
    fn run_animation_outlasts_stop_by_grace_period() {
        let mut p = player_at(0, 0);
        p.anim_state = AnimationState::Running;
        p.switch_clip(ClipId::Running, false);
        p.time_since_movement_stopped = 0.0;

        // 8 frames ≈ 0.133s, still inside the grace period
        run(&mut p, 8);
        assert_eq!(p.anim_state, AnimationState::Running);
        // 10 frames ≈ 0.167s, past it
        run(&mut p, 2);
        assert_eq!(p.anim_state, AnimationState::TransitioningToIdle);
    }

    #[test]
    fn mask_timers_end_within_epsilon() {
        let mut p = player_at(1, 1);
        p.toggle_mask();

        p.mask_timer = 0.0025;
        assert_eq!(p.update_mask(0.001), None);
        assert!(p.mask_active);

        // 0.0015 - 0.001 leaves 0.0005, under the epsilon
        p.mask_timer = 0.0015;
        assert_eq!(p.update_mask(0.001), Some(MaskChange::Expired));
        assert!(!p.mask_active);

        p.mask_recharge_timer = 0.0015;
        assert_eq!(p.update_mask(0.001), Some(MaskChange::Recharged));
        assert!(p.mask_available);
        assert_eq!(p.mask_recharge_timer, 0.0);
    }

    #[test]
    fn death_animation_completes() {
        let mut p = player_at(1, 1);
        p.start_death_animation();
        assert!(!p.is_death_animation_complete());
        for _ in 0..200 {
            p.update_animation(DT);
        }
        assert!(p.is_death_animation_complete());
    }

    #[test]
    fn reset_restores_everything() {
        let mut p = player_at(1, 1);
        p.move_to_grid(5, 5, None);
        run(&mut p, 10);
        p.toggle_mask();
        p.toggle_mask();
        p.start_death_animation();

        p.reset((3, 3));
        assert_eq!(p.grid_position(), (3, 3));
        assert!(!p.moving);
        assert!(!p.mask_active);
        assert!(p.mask_available);
        assert_eq!(p.mask_uses, 0);
        assert_eq!(p.anim_state, AnimationState::Idle);
        assert!(!p.is_death_animation_complete());
    }

    #[test]
    fn teleport_cancels_movement() {
        let mut p = player_at(0, 0);
        p.move_to_grid(1, 0, None);
        p.update(DT);
        p.teleport(4, 4);
        assert_eq!(p.grid_position(), (4, 4));
        assert_eq!(p.target, None);
        assert!(!p.moving);
    }
}
