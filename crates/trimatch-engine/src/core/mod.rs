//! Core data structures: relations, tiles, boards and level parameters.
//!
//! - [`Relation`] / [`Triple`] - the arithmetic rule a selection must satisfy
//! - [`Tile`] / [`TileKind`] - a single cell of the board
//! - [`Board`] - the full `N×N` grid of tiles
//! - [`LevelParams`] - everything derived from a level id

pub use self::{board::*, level::*, relation::*, tile::*};

pub(crate) mod board;
pub(crate) mod level;
pub(crate) mod relation;
pub(crate) mod tile;
