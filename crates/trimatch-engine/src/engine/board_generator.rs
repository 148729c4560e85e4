use std::convert::Infallible;

use rand::{Rng, seq::SliceRandom as _};

use crate::{Board, GenerationInvariantViolation, LevelParams, Tile, TileId, TileKind, Triple};

use super::triple_generator::TripleGenerator;

/// Assembles a full board for one level.
///
/// # Algorithm
///
/// 1. The largest multiple of 3 that fits in `N²` cells becomes the
///    interactive area; the remaining cells are filler.
/// 2. The interactive area is split into triples: `round(triples × (1 − d))`
///    valid triples and the rest distractors, where `d` is the level's
///    distractor rate.
/// 3. Each value of a valid triple gets a kind drawn from the level's
///    special-rate table; distractor values are always standard.
/// 4. If no bomb was drawn, the first standard tile of a valid triple is
///    promoted to a bomb.
/// 5. Fillers are appended and the whole list is shuffled (Fisher–Yates).
///
/// Generation has no rejection loop and always succeeds.
///
/// # Example
///
/// ```
/// use rand::SeedableRng as _;
/// use rand_pcg::Pcg32;
/// use trimatch_engine::{BoardGenerator, LevelParams};
///
/// let params = LevelParams::resolve(12).unwrap();
/// let mut rng = Pcg32::seed_from_u64(0);
/// let board = BoardGenerator::new(&params).generate(&mut rng);
///
/// assert_eq!(board.tiles().len(), 25);
/// assert_eq!(board.interactive_count(), 24);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BoardGenerator<'a> {
    params: &'a LevelParams,
    triples: TripleGenerator,
}

/// Number of valid and distractor triples for a given total.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn split_triples(total: usize, distractor_rate: f64) -> (usize, usize) {
    let valid = ((total as f64) * (1.0 - distractor_rate.clamp(0.0, 1.0))).round() as usize;
    let valid = valid.min(total);
    (valid, total - valid)
}

impl<'a> BoardGenerator<'a> {
    #[must_use]
    pub fn new(params: &'a LevelParams) -> Self {
        Self {
            params,
            triples: TripleGenerator::for_level(params),
        }
    }

    /// Generates a board, drawing all randomness from `rng`.
    pub fn generate<R>(&self, rng: &mut R) -> Board
    where
        R: Rng + ?Sized,
    {
        let Ok((edge, tiles)) = self.assemble(rng, |triples, rng| {
            Ok::<_, Infallible>(triples.valid(rng))
        });
        let board = Board::from_generated(edge, tiles);
        debug_assert_eq!(board.check_invariants(), Ok(()));
        board
    }

    /// Like [`generate`](Self::generate), but checks every valid triple and
    /// the board invariants in release builds too.
    ///
    /// Consumes `rng` exactly as `generate` does, so both produce the same
    /// board from the same seed.
    pub fn try_generate<R>(&self, rng: &mut R) -> Result<Board, GenerationInvariantViolation>
    where
        R: Rng + ?Sized,
    {
        let (edge, tiles) = self.assemble(rng, TripleGenerator::checked_valid)?;
        Board::new(edge, tiles)
    }

    fn assemble<R, E, F>(&self, rng: &mut R, mut draw_valid: F) -> Result<(usize, Vec<Tile>), E>
    where
        R: Rng + ?Sized,
        F: FnMut(&TripleGenerator, &mut R) -> Result<Triple, E>,
    {
        let edge = self.params.grid_edge();
        let total_cells = edge * edge;
        let interactive = total_cells / 3 * 3;
        let (valid_count, distractor_count) =
            split_triples(interactive / 3, self.params.distractor_rate());

        let mut next_id = 0;
        let mut new_id = || {
            let id = TileId::new(next_id);
            next_id += 1;
            id
        };

        let mut tiles = Vec::with_capacity(total_cells);
        for _ in 0..valid_count {
            let triple = draw_valid(&self.triples, rng)?;
            for value in triple.values() {
                let kind = self.params.special_rates().sample(rng);
                tiles.push(Tile::new(new_id(), value, kind));
            }
        }

        for _ in 0..distractor_count {
            let triple: Triple = self.triples.distractor(rng);
            for value in triple.values() {
                tiles.push(Tile::standard(new_id(), value));
            }
        }

        if !tiles.iter().any(|tile| tile.kind().is_bomb()) {
            promote_bomb(&mut tiles);
        }

        for _ in interactive..total_cells {
            tiles.push(Tile::filler(new_id()));
        }

        tiles.shuffle(rng);
        Ok((edge, tiles))
    }
}

/// Turns the first standard tile into a bomb.
///
/// Valid triples are laid out before distractors, so they are preferred.
fn promote_bomb(tiles: &mut [Tile]) {
    if let Some(tile) = tiles.iter_mut().find(|tile| tile.kind().is_standard()) {
        tile.set_kind(TileKind::Bomb);
    }
}
