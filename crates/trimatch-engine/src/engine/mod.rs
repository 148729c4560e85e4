//! Puzzle engine logic and session state management.
//!
//! This module builds on the core data structures to run a level:
//!
//! - [`TripleGenerator`] - Arithmetic triples for a relation and ceiling
//! - [`BoardSeed`] - Seed for deterministic board generation
//! - [`BoardGenerator`] - Full boards of valid, distractor and filler tiles
//! - [`match_engine`] - Selection validation and hint search
//! - [`GameSession`] - The per-level state machine
//! - [`GameStats`] - Score and combo tracking
//! - [`Inventory`] - Consumable balances
//! - [`LevelOutcome`] - Stars, rewards and inventory merge for a cleared level
//!
//! # Session Flow
//!
//! 1. Start a [`GameSession`] for a level with the player's inventory
//! 2. Forward taps and consumable uses; feed time through
//!    [`GameSession::tick`] or [`GameSession::advance_time`]
//! 3. Drain [`SessionEffect`]s after every call and act on them
//! 4. On [`SessionEffect::Victory`], hand the [`LevelOutcome`] to the
//!    progress record
//!
//! # Example
//!
//! ```
//! use trimatch_engine::{BoardSeed, GameSession, Inventory, LevelParams, match_engine};
//!
//! let params = LevelParams::resolve(1).unwrap();
//! let seed = BoardSeed::from_bytes([0; 16]);
//! let mut session = GameSession::with_seed(params, &Inventory::default(), seed);
//!
//! while session.state().is_active() {
//!     let Some(triple) = match_engine::find_hint(session.board(), params.relation()) else {
//!         if session.try_use_refresh().is_err() && session.try_use_bomb().is_err() {
//!             break;
//!         }
//!         continue;
//!     };
//!     for id in triple {
//!         session.try_tap(id).unwrap();
//!     }
//!     session.tick();
//! }
//!
//! for effect in session.drain_effects() {
//!     println!("{effect:?}");
//! }
//! ```

pub use self::{
    board_generator::*, game_session::*, game_stats::*, inventory::*, progression::*,
    triple_generator::*,
};

mod board_generator;
mod game_session;
mod game_stats;
mod inventory;
pub mod match_engine;
mod progression;
mod triple_generator;
