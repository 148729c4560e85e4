use std::path::PathBuf;

use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::Serialize;
use anyhow::Context as _;
use tracing::info;
use trimatch_engine::{
    Board, BoardGenerator, BoardSeed, LevelParams, Relation, Tile, TileId, Triple, match_engine,
};

use crate::util::Output;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GenerateBoardArg {
    /// Level to generate the board for
    #[arg(long, default_value_t = 1)]
    level: u32,
    /// Seed as 32 hex digits; random when omitted
    #[arg(long)]
    seed: Option<BoardSeed>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
struct GeneratedBoard {
    level: u32,
    seed: BoardSeed,
    relation: Relation,
    ceiling: u32,
    /// First triple the hint search finds, if any.
    hint: Option<[TileId; 3]>,
    /// The hint written out as an equation, e.g. `3 + 4 = 7`.
    #[serde(skip_serializing_if = "Option::is_none")]
    hint_equation: Option<String>,
    board: Board,
}

pub(crate) fn run(arg: &GenerateBoardArg) -> anyhow::Result<()> {
    let GenerateBoardArg {
        level,
        seed,
        output,
    } = arg;

    let params = LevelParams::resolve(*level)?;
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = Pcg32::from_seed(seed.to_bytes());
    let board = BoardGenerator::new(&params)
        .try_generate(&mut rng)
        .with_context(|| format!("Generated board for level {level} is invalid"))?;
    let hint = match_engine::find_hint(&board, params.relation());
    let hint_equation = hint.and_then(|ids| describe_hint(&board, params.relation(), ids));

    info!(
        level = *level,
        %seed,
        edge = board.edge(),
        interactive = board.interactive_count(),
        has_hint = hint.is_some(),
        "board generated"
    );

    let generated = GeneratedBoard {
        level: *level,
        seed,
        relation: params.relation(),
        ceiling: params.ceiling(),
        hint,
        hint_equation,
        board,
    };
    Output::save_json(&generated, output.clone())
}

fn describe_hint(board: &Board, relation: Relation, ids: [TileId; 3]) -> Option<String> {
    let [a, b, c] = ids.map(|id| board.tile(id).map(Tile::value));
    Some(relation.describe(Triple::new(a?, b?, c?)))
}
