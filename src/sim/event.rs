/// Events emitted by the simulation.
/// The presentation layer consumes these for sound and music.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    /// A level (re)started: intro jingle now, music after the configured delay.
    LevelStarted { index: usize },
    /// The intro delay elapsed.
    MusicStart,
    MaskActivated,
    /// Mask switched off (by hand or expiry) and began recharging.
    MaskRecharging,
    MaskReady,
    /// Mask key pressed while recharging.
    MaskUnavailable,
    /// Walked off the edge into the void.
    PlayerFell,
    /// Stepped on a fake tile without the mask.
    FakeTileFall,
    LevelComplete { stars: u32 },
    /// Death animation finished.
    GameOver,
}
