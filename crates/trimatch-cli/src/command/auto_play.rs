use std::{path::PathBuf, time::Duration};

use anyhow::{Context, bail};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use tracing::{debug, info};
use trimatch_engine::{
    BoardSeed, GameSession, LevelParams, MAX_LEVEL, ProgressRecord, ProgressStore,
    level_name, match_engine,
};

use crate::store::JsonFileStore;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AutoPlayArg {
    /// First level to play; defaults to the highest unlocked level
    #[arg(long)]
    level: Option<u32>,
    /// Number of consecutive levels to play
    #[arg(long, default_value_t = 1)]
    count: u32,
    /// Seed as 32 hex digits; later levels derive their seeds from it
    #[arg(long)]
    seed: Option<BoardSeed>,
    /// Directory progress is stored in
    #[arg(long)]
    progress_dir: Option<PathBuf>,
    /// Simulated time the bot spends on each tap, in milliseconds
    #[arg(long, default_value_t = 400)]
    move_time_ms: u64,
}

pub(crate) fn run(arg: &AutoPlayArg) -> anyhow::Result<()> {
    let AutoPlayArg {
        level,
        count,
        seed,
        progress_dir,
        move_time_ms,
    } = arg;

    let mut store = JsonFileStore::from_arg(progress_dir.as_deref());
    let mut progress = store.load_progress()?;

    let first = level.unwrap_or(progress.unlocked_level);
    LevelParams::resolve(first)?;
    if !progress.is_unlocked(first) {
        bail!(
            "level {first} is locked; levels up to {} are unlocked",
            progress.unlocked_level
        );
    }

    let seed = seed.unwrap_or_else(|| rand::rng().random());
    info!(%seed, first, count, "auto-play started");
    let mut seeds = Pcg32::from_seed(seed.to_bytes());
    let move_time = Duration::from_millis(*move_time_ms);

    let last = first.saturating_add(count.saturating_sub(1)).min(MAX_LEVEL);
    for level in first..=last {
        let params = LevelParams::resolve(level)?;
        let level_seed = if level == first { seed } else { seeds.random() };
        let mut session = GameSession::with_seed(params, &progress.inventory, level_seed);
        play(&mut session, move_time)?;

        if !report(&mut progress, &session) {
            break;
        }
        store
            .save_progress(&progress)
            .with_context(|| format!("Failed to save progress after level {level}"))?;
        info!(level, unlocked = progress.unlocked_level, "progress saved");
    }

    println!(
        "Unlocked up to level {}, {} stars in total",
        progress.unlocked_level,
        progress.total_stars()
    );
    Ok(())
}

/// Plays until the session ends.
///
/// The bot spends hint charges while it has them and searches the board
/// itself afterwards. When no triple is left it refreshes, then bombs, and
/// once both are exhausted it waits for the clock to run out.
fn play(session: &mut GameSession, move_time: Duration) -> anyhow::Result<()> {
    let budget = session.params().time_budget();
    while session.state().is_active() {
        if session.remaining() < budget / 5 && !session.is_frozen() && session.try_use_freeze().is_ok()
        {
            debug!(remaining = ?session.remaining(), "freeze used");
        }

        let triple = session.try_use_hint().ok().or_else(|| {
            match_engine::find_hint(session.board(), session.params().relation())
        });
        match triple {
            Some(triple) => {
                for id in triple {
                    session.advance_time(move_time);
                    if !session.state().is_active() {
                        break;
                    }
                    session.try_tap(id)?;
                }
            }
            None => {
                if session.try_use_refresh().is_err() && session.try_use_bomb().is_err() {
                    debug!("out of moves, waiting for the clock");
                    session.advance_time(session.remaining() + session.freeze_remaining());
                }
            }
        }

        for effect in session.drain_effects() {
            debug!(?effect, "effect");
        }
    }
    Ok(())
}

/// Prints the result of a finished session and folds a victory into the
/// progress. Returns whether the level was cleared.
fn report(progress: &mut ProgressRecord, session: &GameSession) -> bool {
    let level = session.params().level();
    let name = level_name(level).unwrap_or_default();
    let stats = session.stats();

    let Some(outcome) = session.outcome() else {
        println!(
            "Level {level:>3} {name:<20} time up     score {:>6}",
            stats.score()
        );
        return false;
    };

    let update = progress.record_victory(outcome);
    println!(
        "Level {level:>3} {name:<20} cleared {}  score {:>6}  best combo {:>2}  {:>5.1}s left",
        outcome.stars,
        stats.score(),
        stats.best_combo(),
        outcome.remaining_time.as_secs_f64(),
    );
    if update.chest_bonus.is_some() {
        println!("  treasure chest opened");
    }
    for (kind, count) in update.granted.iter() {
        println!("  reward: {count} {kind}");
    }
    true
}
