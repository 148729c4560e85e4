pub use self::{catalog::*, core::*, engine::*, progress::*};

pub mod catalog;
pub mod core;
pub mod engine;
pub mod progress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("level {level} is outside the supported range {MIN_LEVEL}..={MAX_LEVEL}")]
pub struct LevelOutOfRangeError {
    pub level: u32,
}

/// A structural invariant that board construction must uphold was broken.
///
/// Generation never produces these when the generator contracts hold; they
/// exist so hand-built boards can be rejected and generated boards checked.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum GenerationInvariantViolation {
    #[display("board with edge {edge} needs {expected} cells, got {actual}")]
    CellCountMismatch {
        edge: usize,
        expected: usize,
        actual: usize,
    },
    #[display("interactive tile count {count} is not a multiple of 3")]
    InteractiveCountNotMultipleOfThree { count: usize },
    #[display("tile id {_0} appears more than once")]
    DuplicateTileId(#[error(not(source))] TileId),
    #[display("triple {triple} does not satisfy {relation}")]
    TripleRelationViolated { triple: Triple, relation: Relation },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum TapError {
    #[display("session is already finished")]
    SessionFinished,
    #[display("no tile with id {_0} on the board")]
    UnknownTile(#[error(not(source))] TileId),
    #[display("tile {_0} has already been removed")]
    TileRemoved(#[error(not(source))] TileId),
    #[display("tile {_0} is a filler and cannot be selected")]
    NotInteractive(#[error(not(source))] TileId),
    #[display("tile {_0} is frozen in ice")]
    FrozenInIce(#[error(not(source))] TileId),
    #[display("three tiles are already selected")]
    SelectionFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConsumableError {
    #[display("session is already finished")]
    SessionFinished,
    #[display("no {_0} charges left")]
    Exhausted(#[error(not(source))] ConsumableKind),
    #[display("no matching triple among the active tiles")]
    NoHintAvailable,
    #[display("no active tiles left on the board")]
    NoActiveTiles,
}
