pub mod animation;
pub mod player;
pub mod score;
pub mod tile;
