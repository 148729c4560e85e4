//! Selection validation and hint search.
//!
//! Both functions evaluate relations with exact integer arithmetic through
//! [`Relation::is_satisfied`]. Filler tiles never take part in a match.

use crate::{Board, Relation, Tile, TileId};

/// Checks three tiles, in selection order, against the relation.
///
/// The first selected tile is the first operand.
#[must_use]
pub fn validate(tiles: [&Tile; 3], relation: Relation) -> bool {
    if tiles.iter().any(|tile| tile.is_filler()) {
        return false;
    }
    let [a, b, c] = tiles.map(Tile::value);
    relation.is_satisfied(a, b, c)
}

/// Finds an ordered triple of selectable tiles that satisfies the relation.
///
/// Searches exhaustively over selectable tiles (not removed, not filler, not
/// ice) in board order: outer loop picks the first operand, middle loop the
/// second, inner loop the third. Returns the first hit, so the result is
/// deterministic for a given board.
///
/// Worst case is `O(n³)` with `n ≤ 81`, which is fine for an on-demand
/// hint.
#[must_use]
pub fn find_hint(board: &Board, relation: Relation) -> Option<[TileId; 3]> {
    let candidates: Vec<&Tile> = board.selectable_tiles().collect();
    for (i, a) in candidates.iter().enumerate() {
        for (j, b) in candidates.iter().enumerate() {
            if j == i {
                continue;
            }
            for (k, c) in candidates.iter().enumerate() {
                if k == i || k == j {
                    continue;
                }
                if relation.is_satisfied(a.value(), b.value(), c.value()) {
                    return Some([a.id(), b.id(), c.id()]);
                }
            }
        }
    }
    None
}
