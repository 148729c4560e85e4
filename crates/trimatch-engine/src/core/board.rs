use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::GenerationInvariantViolation;

use super::tile::{Tile, TileId};

/// An `N×N` grid of tiles stored in row-major order.
///
/// # Invariants
///
/// Checked on construction by [`Board::new`]:
///
/// - exactly `edge²` tiles
/// - tile ids are unique
/// - the number of interactive (non-filler) tiles is a multiple of 3
///
/// Tiles never leave the vector; removal only sets a flag, so positions stay
/// stable for the whole session and the interactive count never changes.
///
/// # Example
///
/// ```
/// use trimatch_engine::{Board, Tile, TileId};
///
/// let tiles = (0..9).map(|i| Tile::standard(TileId::new(i), i + 1)).collect();
/// let board = Board::new(3, tiles).unwrap();
///
/// assert_eq!(board.interactive_count(), 9);
/// assert_eq!(board.rows().count(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    edge: usize,
    tiles: Vec<Tile>,
}

impl Board {
    pub fn new(edge: usize, tiles: Vec<Tile>) -> Result<Self, GenerationInvariantViolation> {
        let board = Self { edge, tiles };
        board.check_invariants()?;
        Ok(board)
    }

    /// Wraps generator output; the generator checks invariants in debug builds.
    pub(crate) fn from_generated(edge: usize, tiles: Vec<Tile>) -> Self {
        Self { edge, tiles }
    }

    /// Re-checks the construction invariants.
    pub fn check_invariants(&self) -> Result<(), GenerationInvariantViolation> {
        let expected = self.edge * self.edge;
        if self.tiles.len() != expected {
            return Err(GenerationInvariantViolation::CellCountMismatch {
                edge: self.edge,
                expected,
                actual: self.tiles.len(),
            });
        }

        let mut seen = HashSet::with_capacity(self.tiles.len());
        for tile in &self.tiles {
            if !seen.insert(tile.id()) {
                return Err(GenerationInvariantViolation::DuplicateTileId(tile.id()));
            }
        }

        let count = self.interactive_count();
        if count % 3 != 0 {
            return Err(GenerationInvariantViolation::InteractiveCountNotMultipleOfThree { count });
        }
        Ok(())
    }

    #[must_use]
    pub const fn edge(&self) -> usize {
        self.edge
    }

    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Returns an iterator over the rows of the grid, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.tiles.chunks(self.edge.max(1))
    }

    #[must_use]
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.id() == id)
    }

    pub(crate) fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.iter_mut().find(|tile| tile.id() == id)
    }

    pub(crate) fn tile_at_mut(&mut self, position: usize) -> &mut Tile {
        &mut self.tiles[position]
    }

    /// Number of non-filler tiles, removed or not.
    #[must_use]
    pub fn interactive_count(&self) -> usize {
        self.tiles.iter().filter(|tile| !tile.is_filler()).count()
    }

    /// Tiles that are neither removed nor filler.
    pub fn active_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|tile| tile.is_active())
    }

    /// Active tiles that are not blocked by ice.
    pub fn selectable_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|tile| tile.is_selectable())
    }

    /// Positions of every active tile in board order.
    pub(crate) fn active_positions(&self) -> Vec<usize> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| tile.is_active())
            .map(|(pos, _)| pos)
            .collect()
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_tiles().count()
    }

    /// `true` once every interactive tile has been removed.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.tiles
            .iter()
            .all(|tile| tile.is_removed() || tile.is_filler())
    }
}
