/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum TileType {
    #[default]
    Empty, // void: not walkable
    Real,
    Fake,  // looks like Real until the mask reveals it
    Start,
    Exit,
}

/// Editor palette order (also the 1-5 hotkeys).
pub const PALETTE: [TileType; 5] = [
    TileType::Real,
    TileType::Fake,
    TileType::Empty,
    TileType::Start,
    TileType::Exit,
];

impl TileType {
    /// Can the player step onto this tile? Fake tiles look real, so yes.
    pub fn is_walkable(self, _mask_active: bool) -> bool {
        !matches!(self, TileType::Empty)
    }

    /// Will standing here keep the player alive?
    pub fn is_safe(self, mask_active: bool) -> bool {
        match self {
            TileType::Real | TileType::Start | TileType::Exit => true,
            TileType::Fake => mask_active,
            TileType::Empty => false,
        }
    }

    /// What the player sees. Without the mask a fake tile is indistinguishable from a real one.
    pub fn display_type(self, mask_active: bool) -> TileType {
        match self {
            TileType::Fake if !mask_active => TileType::Real,
            other => other,
        }
    }

    /// Parse a level-file cell. Unknown strings are treated as void.
    pub fn parse(s: &str) -> TileType {
        match s.trim().to_lowercase().as_str() {
            "real" | "#" | "■" => TileType::Real,
            "fake" | "▫" => TileType::Fake,
            "start" => TileType::Start,
            "exit" => TileType::Exit,
            _ => TileType::Empty,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TileType::Empty => "empty",
            TileType::Real => "real",
            TileType::Fake => "fake",
            TileType::Start => "start",
            TileType::Exit => "exit",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TileType::Empty => "Empty",
            TileType::Real => "Real",
            TileType::Fake => "Fake",
            TileType::Start => "Start",
            TileType::Exit => "Exit",
        }
    }
}

/// Read-only view of a tile grid, implemented by `sim::level::Level`.
pub trait TileQuery {
    /// (width, height) in cells.
    fn dimensions(&self) -> (usize, usize);

    /// `None` outside the grid.
    fn tile_type(&self, x: i32, y: i32) -> Option<TileType>;

    fn is_walkable(&self, x: i32, y: i32, mask_active: bool) -> bool {
        self.tile_type(x, y).is_some_and(|t| t.is_walkable(mask_active))
    }

    /// Outside the grid counts as void.
    fn is_safe(&self, x: i32, y: i32, mask_active: bool) -> bool {
        self.tile_type(x, y).is_some_and(|t| t.is_safe(mask_active))
    }
}

/// A placed cell of the level grid.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Tile {
    pub kind: TileType,
    pub x: usize,
    pub y: usize,
}

impl Tile {
    pub fn new(kind: TileType, x: usize, y: usize) -> Self {
        Tile { kind, x, y }
    }

    #[inline]
    pub fn is_walkable(&self, mask_active: bool) -> bool {
        self.kind.is_walkable(mask_active)
    }

    #[inline]
    pub fn is_safe(&self, mask_active: bool) -> bool {
        self.kind.is_safe(mask_active)
    }
}
