use std::{mem, time::Duration};

use arrayvec::ArrayVec;
use rand::{
    Rng as _, SeedableRng as _,
    seq::{IndexedRandom as _, SliceRandom as _},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    Board, BoardGenerator, BoardSeed, ConsumableError, ConsumableKind, GameStats, HitOutcome,
    Inventory, LevelOutOfRangeError, LevelOutcome, LevelParams, TapError, Tile, TileId,
    TripleGenerator, match_engine,
};

use super::board_generator::split_triples;

/// Countdown granularity used by [`GameSession::tick`].
pub const TICK: Duration = Duration::from_millis(100);
/// How long a failed selection stays visible before it is cleared.
pub const MISMATCH_GRACE: Duration = Duration::from_millis(500);
/// How long a hint stays highlighted.
pub const HINT_DURATION: Duration = Duration::from_secs(5);
/// Countdown suspension granted by one freeze charge. Charges stack.
pub const FREEZE_DURATION: Duration = Duration::from_secs(8);
/// Chance that each ice tile melts on a successful match.
pub const ICE_MELT_PROBABILITY: f64 = 0.6;
/// Extra tiles blasted per bomb tile in a successful match.
pub const SPLASH_TILES: usize = 2;
/// Tiles removed by one use of the bomb consumable.
pub const BOMB_ITEM_TILES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
pub enum SessionState {
    Active,
    Victory,
    Timeout,
}

/// Result of a successful tile tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum TapOutcome {
    Selected,
    Deselected,
    Matched { points: u32 },
    /// The selection stays in place for [`MISMATCH_GRACE`].
    Mismatched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    Match,
    Win,
    Hint,
    UseItem,
}

/// Commands for the surrounding application, drained with
/// [`GameSession::drain_effects`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum SessionEffect {
    Sound { cue: SoundCue },
    SelectionCleared,
    HintExpired,
    FreezeEnded,
    Victory { outcome: LevelOutcome },
    Timeout,
}

#[derive(Debug, Clone, Copy)]
enum DeferredAction {
    ClearMismatch { tiles: [TileId; 3], serial: u64 },
    ExpireHint { serial: u64 },
}

/// An action scheduled on the session clock.
///
/// Fires as a no-op when the session has finished or the board was
/// regenerated since it was scheduled.
#[derive(Debug, Clone, Copy)]
struct Deferred {
    deadline: Duration,
    generation: u64,
    action: DeferredAction,
}

/// One play-through of a level.
///
/// The session owns no timers. The driver feeds time through
/// [`advance_time`](Self::advance_time) or [`tick`](Self::tick), forwards
/// player intents through the `try_*` methods, and drains the resulting
/// [`SessionEffect`]s after each call.
#[derive(Debug, Clone)]
pub struct GameSession {
    params: LevelParams,
    seed: BoardSeed,
    rng: Pcg32,
    board: Board,
    board_generation: u64,
    selection: ArrayVec<TileId, 3>,
    hinted: ArrayVec<TileId, 3>,
    hint_serial: u64,
    mismatch_serial: u64,
    clock: Duration,
    remaining: Duration,
    freeze_remaining: Duration,
    stats: GameStats,
    consumables: Inventory,
    state: SessionState,
    outcome: Option<LevelOutcome>,
    pending: Vec<Deferred>,
    effects: Vec<SessionEffect>,
}

impl GameSession {
    /// Starts a session for `level` with a fresh random seed.
    pub fn new(level: u32, inventory: &Inventory) -> Result<Self, LevelOutOfRangeError> {
        let params = LevelParams::resolve(level)?;
        Ok(Self::with_seed(params, inventory, rand::rng().random()))
    }

    /// Starts a session whose board and every later random choice derive
    /// from `seed`.
    #[must_use]
    pub fn with_seed(params: LevelParams, inventory: &Inventory, seed: BoardSeed) -> Self {
        let mut rng = Pcg32::from_seed(seed.to_bytes());
        let board = BoardGenerator::new(&params).generate(&mut rng);
        Self::from_parts(params, board, inventory, seed, rng)
    }

    /// Starts a session on a prepared board.
    ///
    /// `seed` only drives randomness during play (ice melts, bomb targets,
    /// refresh).
    #[must_use]
    pub fn with_board(
        params: LevelParams,
        board: Board,
        inventory: &Inventory,
        seed: BoardSeed,
    ) -> Self {
        let rng = Pcg32::from_seed(seed.to_bytes());
        Self::from_parts(params, board, inventory, seed, rng)
    }

    fn from_parts(
        params: LevelParams,
        board: Board,
        inventory: &Inventory,
        seed: BoardSeed,
        rng: Pcg32,
    ) -> Self {
        debug!(level = params.level(), %seed, "session started");
        Self {
            params,
            seed,
            rng,
            board,
            board_generation: 0,
            selection: ArrayVec::new(),
            hinted: ArrayVec::new(),
            hint_serial: 0,
            mismatch_serial: 0,
            clock: Duration::ZERO,
            remaining: params.time_budget(),
            freeze_remaining: Duration::ZERO,
            stats: GameStats::new(),
            consumables: inventory.session_opening(),
            state: SessionState::Active,
            outcome: None,
            pending: Vec::new(),
            effects: Vec::new(),
        }
    }

    #[must_use]
    pub fn params(&self) -> &LevelParams {
        &self.params
    }

    #[must_use]
    pub fn seed(&self) -> BoardSeed {
        self.seed
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Bumped every time the board is regenerated by a refresh.
    #[must_use]
    pub fn board_generation(&self) -> u64 {
        self.board_generation
    }

    /// Selected tiles in selection order.
    #[must_use]
    pub fn selection(&self) -> &[TileId] {
        &self.selection
    }

    #[must_use]
    pub fn hinted(&self) -> &[TileId] {
        &self.hinted
    }

    /// Session time elapsed so far, frozen periods included.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock
    }

    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    #[must_use]
    pub fn freeze_remaining(&self) -> Duration {
        self.freeze_remaining
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        !self.freeze_remaining.is_zero()
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    /// Live consumable balances for this session.
    #[must_use]
    pub fn consumables(&self) -> &Inventory {
        &self.consumables
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Set once the session reaches [`SessionState::Victory`].
    #[must_use]
    pub fn outcome(&self) -> Option<&LevelOutcome> {
        self.outcome.as_ref()
    }

    /// Takes every effect produced since the previous call.
    pub fn drain_effects(&mut self) -> Vec<SessionEffect> {
        mem::take(&mut self.effects)
    }

    /// Toggles a tile in the selection and evaluates full selections.
    ///
    /// Tapping a hinted tile also drops it from the highlight. While three
    /// tiles are selected only deselection is accepted.
    pub fn try_tap(&mut self, id: TileId) -> Result<TapOutcome, TapError> {
        if !self.state.is_active() {
            return Err(TapError::SessionFinished);
        }
        let tile = self.board.tile(id).ok_or(TapError::UnknownTile(id))?;
        if tile.is_filler() {
            return Err(TapError::NotInteractive(id));
        }
        if tile.is_removed() {
            return Err(TapError::TileRemoved(id));
        }
        if tile.kind().is_ice() {
            return Err(TapError::FrozenInIce(id));
        }

        if let Some(index) = self.selection.iter().position(|&selected| selected == id) {
            self.selection.remove(index);
            self.unhint(id);
            return Ok(TapOutcome::Deselected);
        }
        if self.selection.is_full() {
            return Err(TapError::SelectionFull);
        }
        self.selection.push(id);
        self.unhint(id);

        let Ok(selected) = <[TileId; 3]>::try_from(self.selection.as_slice()) else {
            return Ok(TapOutcome::Selected);
        };
        Ok(self.evaluate_selection(selected))
    }

    fn unhint(&mut self, id: TileId) {
        self.hinted.retain(|hinted| *hinted != id);
    }

    fn evaluate_selection(&mut self, selected: [TileId; 3]) -> TapOutcome {
        let tiles = selected.map(|id| self.board.tile(id));
        let is_match = match tiles {
            [Some(a), Some(b), Some(c)] => match_engine::validate([a, b, c], self.params.relation()),
            _ => false,
        };

        if !is_match {
            self.stats.record_mismatch();
            self.mismatch_serial += 1;
            self.schedule(
                MISMATCH_GRACE,
                DeferredAction::ClearMismatch {
                    tiles: selected,
                    serial: self.mismatch_serial,
                },
            );
            debug!(?selected, "mismatch");
            return TapOutcome::Mismatched;
        }

        let points = self.apply_match(selected);
        TapOutcome::Matched { points }
    }

    /// Applies a successful match.
    ///
    /// Splash targets and ice melts are all decided against the board as it
    /// was before the match, then written in one pass.
    fn apply_match(&mut self, matched: [TileId; 3]) -> u32 {
        let bombs = matched
            .iter()
            .filter_map(|&id| self.board.tile(id))
            .filter(|tile| tile.kind().is_bomb())
            .count();

        let mut splash = Vec::new();
        if bombs > 0 {
            let candidates: Vec<TileId> = self
                .board
                .active_tiles()
                .map(Tile::id)
                .filter(|id| !matched.contains(id))
                .collect();
            splash.extend(
                candidates
                    .choose_multiple(&mut self.rng, bombs * SPLASH_TILES)
                    .copied(),
            );
        }

        let ice: Vec<TileId> = self
            .board
            .tiles()
            .iter()
            .filter(|tile| !tile.is_removed() && tile.kind().is_ice())
            .map(Tile::id)
            .filter(|id| !splash.contains(id))
            .collect();
        let melts: Vec<TileId> = ice
            .into_iter()
            .filter(|_| self.rng.random_bool(ICE_MELT_PROBABILITY))
            .collect();

        for &id in matched.iter().chain(&splash) {
            if let Some(tile) = self.board.tile_mut(id)
                && let HitOutcome::Unlocked { remaining } = tile.hit()
            {
                debug!(%id, remaining, "tile unlocked");
            }
        }
        for &id in &melts {
            if let Some(tile) = self.board.tile_mut(id) {
                tile.melt();
            }
        }

        let points = self.stats.record_match();
        self.selection.clear();
        self.drop_inactive_hints();
        self.effects.push(SessionEffect::Sound {
            cue: SoundCue::Match,
        });
        debug!(
            ?matched,
            points,
            combo = self.stats.combo(),
            splashed = splash.len(),
            melted = melts.len(),
            "match"
        );
        self.check_victory();
        points
    }

    fn drop_inactive_hints(&mut self) {
        let board = &self.board;
        self.hinted
            .retain(|id| board.tile(*id).is_some_and(|tile| tile.is_active()));
    }

    fn schedule(&mut self, delay: Duration, action: DeferredAction) {
        self.pending.push(Deferred {
            deadline: self.clock.saturating_add(delay),
            generation: self.board_generation,
            action,
        });
    }

    /// Advances the countdown by one [`TICK`].
    pub fn tick(&mut self) {
        self.advance_time(TICK);
    }

    /// Advances the session clock.
    ///
    /// Time spent frozen comes out of the freeze balance first, and only the
    /// rest is taken off the countdown, so a delta spanning the end of a
    /// freeze is never counted twice. Reaching zero remaining time ends the
    /// session with [`SessionState::Timeout`].
    pub fn advance_time(&mut self, delta: Duration) {
        if !self.state.is_active() {
            return;
        }
        self.clock = self.clock.saturating_add(delta);

        let frozen = delta.min(self.freeze_remaining);
        if !frozen.is_zero() {
            self.freeze_remaining -= frozen;
            if self.freeze_remaining.is_zero() {
                debug!("freeze ended");
                self.effects.push(SessionEffect::FreezeEnded);
            }
        }

        self.remaining = self.remaining.saturating_sub(delta - frozen);
        if self.remaining.is_zero() {
            self.finish_timeout();
            return;
        }
        self.expire_transient_effects(self.clock);
    }

    /// Fires every deferred action due at or before `now` on the session
    /// clock.
    pub fn expire_transient_effects(&mut self, now: Duration) {
        let (due, pending): (Vec<_>, Vec<_>) = mem::take(&mut self.pending)
            .into_iter()
            .partition(|deferred| deferred.deadline <= now);
        self.pending = pending;
        for deferred in due {
            self.fire(deferred);
        }
    }

    fn fire(&mut self, deferred: Deferred) {
        if !self.state.is_active() || deferred.generation != self.board_generation {
            return;
        }
        match deferred.action {
            DeferredAction::ClearMismatch { tiles, serial } => {
                if serial == self.mismatch_serial && self.selection.as_slice() == tiles {
                    self.selection.clear();
                    self.effects.push(SessionEffect::SelectionCleared);
                }
            }
            DeferredAction::ExpireHint { serial } => {
                if serial == self.hint_serial && !self.hinted.is_empty() {
                    self.hinted.clear();
                    self.effects.push(SessionEffect::HintExpired);
                }
            }
        }
    }

    fn ensure_active(&self) -> Result<(), ConsumableError> {
        if self.state.is_active() {
            Ok(())
        } else {
            Err(ConsumableError::SessionFinished)
        }
    }

    fn ensure_available(&self, kind: ConsumableKind) -> Result<(), ConsumableError> {
        self.ensure_active()?;
        if self.consumables.get(kind) == 0 {
            return Err(ConsumableError::Exhausted(kind));
        }
        Ok(())
    }

    fn consume(&mut self, kind: ConsumableKind) {
        let consumed = self.consumables.try_consume(kind);
        debug_assert!(consumed, "{kind} used without a charge");
        debug!(%kind, left = self.consumables.get(kind), "consumable used");
    }

    /// Highlights a matching triple for [`HINT_DURATION`].
    ///
    /// A charge is only spent when a triple is found.
    pub fn try_use_hint(&mut self) -> Result<[TileId; 3], ConsumableError> {
        self.ensure_available(ConsumableKind::Hint)?;
        let hint = match_engine::find_hint(&self.board, self.params.relation())
            .ok_or(ConsumableError::NoHintAvailable)?;
        self.consume(ConsumableKind::Hint);

        self.hinted = ArrayVec::from(hint);
        self.hint_serial += 1;
        self.schedule(
            HINT_DURATION,
            DeferredAction::ExpireHint {
                serial: self.hint_serial,
            },
        );
        self.effects.push(SessionEffect::Sound {
            cue: SoundCue::Hint,
        });
        Ok(hint)
    }

    /// Suspends the countdown for another [`FREEZE_DURATION`].
    pub fn try_use_freeze(&mut self) -> Result<(), ConsumableError> {
        self.ensure_available(ConsumableKind::Freeze)?;
        self.consume(ConsumableKind::Freeze);
        self.freeze_remaining = self.freeze_remaining.saturating_add(FREEZE_DURATION);
        self.effects.push(SessionEffect::Sound {
            cue: SoundCue::UseItem,
        });
        Ok(())
    }

    /// Removes up to [`BOMB_ITEM_TILES`] random active tiles outright,
    /// ice and locked tiles included.
    ///
    /// Returns the removed tiles. Fails without spending a charge when the
    /// board has no active tiles.
    pub fn try_use_bomb(&mut self) -> Result<ArrayVec<TileId, BOMB_ITEM_TILES>, ConsumableError> {
        self.ensure_available(ConsumableKind::Bomb)?;
        let candidates: Vec<TileId> = self.board.active_tiles().map(Tile::id).collect();
        if candidates.is_empty() {
            return Err(ConsumableError::NoActiveTiles);
        }
        self.consume(ConsumableKind::Bomb);

        let targets: ArrayVec<TileId, BOMB_ITEM_TILES> = candidates
            .choose_multiple(&mut self.rng, BOMB_ITEM_TILES)
            .copied()
            .collect();
        for &id in &targets {
            if let Some(tile) = self.board.tile_mut(id) {
                tile.remove();
            }
        }
        self.selection.retain(|id| !targets.contains(id));
        self.drop_inactive_hints();

        #[expect(clippy::cast_possible_truncation)]
        let points = self.stats.record_blast(targets.len() as u32);
        self.effects.push(SessionEffect::Sound {
            cue: SoundCue::UseItem,
        });
        debug!(?targets, points, "bomb used");
        self.check_victory();
        Ok(targets)
    }

    /// Regenerates every active tile in place.
    ///
    /// Active slots are shuffled; the count is trimmed to a multiple of 3
    /// by removing the extras, and the rest are refilled with fresh standard
    /// triples whose values land in random order. At least one of the new
    /// triples is valid. Filler tiles are left alone. Selection, hints and
    /// pending deferred actions are discarded.
    pub fn try_use_refresh(&mut self) -> Result<(), ConsumableError> {
        self.ensure_available(ConsumableKind::Refresh)?;
        let mut positions = self.board.active_positions();
        if positions.is_empty() {
            return Err(ConsumableError::NoActiveTiles);
        }
        self.consume(ConsumableKind::Refresh);

        positions.shuffle(&mut self.rng);
        let keep = positions.len() / 3 * 3;
        let extras = positions.split_off(keep);
        for &pos in &extras {
            self.board.tile_at_mut(pos).remove();
        }

        let generator = TripleGenerator::for_level(&self.params);
        let triples = positions.len() / 3;
        let (valid, _) = split_triples(triples, self.params.distractor_rate());
        let valid = if triples > 0 { valid.max(1) } else { 0 };
        for (i, slots) in positions.chunks_exact(3).enumerate() {
            let triple = if i < valid {
                generator.valid(&mut self.rng)
            } else {
                generator.distractor(&mut self.rng)
            };
            let mut values = triple.values();
            values.shuffle(&mut self.rng);
            for (&pos, value) in slots.iter().zip(values) {
                self.board.tile_at_mut(pos).reroll(value);
            }
        }

        self.board_generation += 1;
        self.selection.clear();
        self.hinted.clear();
        self.effects.push(SessionEffect::Sound {
            cue: SoundCue::UseItem,
        });
        debug!(
            generation = self.board_generation,
            triples,
            removed = extras.len(),
            "board refreshed"
        );
        self.check_victory();
        Ok(())
    }

    fn check_victory(&mut self) {
        if !self.state.is_active() || !self.board.is_cleared() {
            return;
        }
        let outcome = LevelOutcome::new(
            self.params.level(),
            self.remaining,
            self.params.time_budget(),
            self.stats.clone(),
            self.consumables,
        );
        info!(
            level = outcome.level,
            stars = outcome.stars.count(),
            score = self.stats.score(),
            remaining_ms = self.remaining.as_millis(),
            "level cleared"
        );
        self.state = SessionState::Victory;
        self.pending.clear();
        self.selection.clear();
        self.hinted.clear();
        self.effects.push(SessionEffect::Sound { cue: SoundCue::Win });
        self.effects.push(SessionEffect::Victory {
            outcome: outcome.clone(),
        });
        self.outcome = Some(outcome);
    }

    fn finish_timeout(&mut self) {
        info!(
            level = self.params.level(),
            score = self.stats.score(),
            "time is up"
        );
        self.state = SessionState::Timeout;
        self.pending.clear();
        self.effects.push(SessionEffect::Timeout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Relation, SpecialRates, TileKind};

    const SEED: BoardSeed = BoardSeed::from_bytes([7; 16]);

    fn id(n: u32) -> TileId {
        TileId::new(n)
    }

    fn standard_tiles(values: &[u32]) -> Vec<Tile> {
        values
            .iter()
            .zip(0..)
            .map(|(&value, n)| Tile::standard(id(n), value))
            .collect()
    }

    fn session_with(tiles: Vec<Tile>, relation: Relation, inventory: &Inventory) -> GameSession {
        let edge = (1..=9).find(|e| e * e == tiles.len()).unwrap();
        let params = LevelParams::resolve(1).unwrap().with_relation(relation, 10);
        let board = Board::new(edge, tiles).unwrap();
        GameSession::with_board(params, board, inventory, SEED)
    }

    fn session(tiles: Vec<Tile>) -> GameSession {
        session_with(tiles, Relation::Addition, &Inventory::STARTING)
    }

    fn tap_all(session: &mut GameSession, ids: [u32; 3]) -> TapOutcome {
        let [a, b, c] = ids;
        assert_eq!(session.try_tap(id(a)), Ok(TapOutcome::Selected));
        assert_eq!(session.try_tap(id(b)), Ok(TapOutcome::Selected));
        session.try_tap(id(c)).unwrap()
    }

    #[test]
    fn test_three_matches_score_360_and_win() {
        let mut session = session(standard_tiles(&[1, 2, 3, 2, 2, 4, 3, 4, 7]));

        assert_eq!(tap_all(&mut session, [0, 1, 2]), TapOutcome::Matched { points: 100 });
        assert_eq!(tap_all(&mut session, [3, 4, 5]), TapOutcome::Matched { points: 120 });
        assert!(session.state().is_active());
        assert_eq!(tap_all(&mut session, [6, 7, 8]), TapOutcome::Matched { points: 140 });

        assert_eq!(session.stats().score(), 360);
        assert_eq!(session.stats().combo(), 3);
        assert!(session.state().is_victory());

        let outcome = session.outcome().unwrap();
        assert_eq!(outcome.level, 1);
        assert_eq!(outcome.stars, crate::Stars::THREE);

        let effects = session.drain_effects();
        assert_eq!(
            effects.iter().filter(|e| matches!(e, SessionEffect::Sound { cue: SoundCue::Match })).count(),
            3
        );
        assert!(effects.contains(&SessionEffect::Sound { cue: SoundCue::Win }));
        assert!(matches!(effects.last(), Some(SessionEffect::Victory { .. })));
        assert!(session.drain_effects().is_empty());
    }

    #[test]
    fn test_locked_tile_needs_two_matches() {
        let mut tiles = standard_tiles(&[2, 3, 5, 4, 6, 9, 9, 9, 9]);
        tiles[0] = Tile::new(id(0), 2, TileKind::Locked);
        let mut session = session(tiles);

        assert!(tap_all(&mut session, [0, 1, 2]).is_matched());
        let locked = session.board().tile(id(0)).unwrap();
        assert_eq!(locked.lock_count(), 1);
        assert!(locked.is_active());
        assert!(session.board().tile(id(1)).unwrap().is_removed());

        assert!(tap_all(&mut session, [0, 3, 4]).is_matched());
        assert!(session.board().tile(id(0)).unwrap().is_removed());
    }

    #[test]
    fn test_timeout_at_exactly_zero_blocks_taps() {
        let mut session = session(standard_tiles(&[1, 2, 3, 2, 2, 4, 3, 4, 7]));
        let budget = session.params().time_budget();

        session.advance_time(budget - TICK);
        assert!(session.state().is_active());
        session.tick();
        assert_eq!(session.remaining(), Duration::ZERO);
        assert!(session.state().is_timeout());
        assert_eq!(session.drain_effects(), vec![SessionEffect::Timeout]);

        let before = session.board().clone();
        assert_eq!(session.try_tap(id(0)), Err(TapError::SessionFinished));
        assert_eq!(session.try_use_bomb(), Err(ConsumableError::SessionFinished));
        assert_eq!(session.board(), &before);

        session.tick();
        assert!(session.drain_effects().is_empty());
    }

    #[test]
    fn test_mismatch_clears_after_grace() {
        let mut session = session(standard_tiles(&[1, 2, 3, 2, 2, 4, 3, 4, 7]));
        assert!(tap_all(&mut session, [0, 1, 2]).is_matched());
        assert_eq!(tap_all(&mut session, [3, 4, 6]), TapOutcome::Mismatched);
        assert_eq!(session.stats().combo(), 0);
        assert_eq!(session.stats().mismatches(), 1);

        assert_eq!(session.try_tap(id(7)), Err(TapError::SelectionFull));
        session.drain_effects();

        session.advance_time(Duration::from_millis(400));
        assert_eq!(session.selection().len(), 3);
        session.tick();
        assert!(session.selection().is_empty());
        assert_eq!(session.drain_effects(), vec![SessionEffect::SelectionCleared]);
    }

    #[test]
    fn test_deselect_during_grace_cancels_clear() {
        let mut session = session(standard_tiles(&[1, 2, 3, 2, 2, 4, 3, 4, 7]));
        assert!(tap_all(&mut session, [0, 1, 3]).is_mismatched());
        assert_eq!(session.try_tap(id(3)), Ok(TapOutcome::Deselected));

        session.advance_time(MISMATCH_GRACE);
        assert_eq!(session.selection(), &[id(0), id(1)]);
        assert!(session.drain_effects().is_empty());

        assert!(session.try_tap(id(2)).unwrap().is_matched());
    }

    #[test]
    fn test_earlier_mismatch_clear_keeps_later_selection() {
        let mut session = session(standard_tiles(&[1, 2, 3, 2, 2, 4, 3, 4, 7]));
        assert!(tap_all(&mut session, [0, 1, 3]).is_mismatched());
        assert_eq!(session.try_tap(id(3)), Ok(TapOutcome::Deselected));
        session.advance_time(Duration::from_millis(400));
        assert!(session.try_tap(id(3)).unwrap().is_mismatched());
        session.drain_effects();

        // The first grace ends here; the second one has 400 ms to go.
        session.advance_time(Duration::from_millis(100));
        assert_eq!(session.selection(), &[id(0), id(1), id(3)]);
        session.advance_time(Duration::from_millis(300));
        assert_eq!(session.selection().len(), 3);
        assert!(session.drain_effects().is_empty());

        session.tick();
        assert!(session.selection().is_empty());
        assert_eq!(session.drain_effects(), vec![SessionEffect::SelectionCleared]);
    }

    #[test]
    fn test_tiny_target_sum_plays() {
        for target in 0..=2 {
            let params = LevelParams::resolve(55)
                .unwrap()
                .with_relation(Relation::TargetSum { target }, 2)
                .with_special_rates(SpecialRates::NONE);
            assert_eq!(params.relation(), Relation::TargetSum { target: 3 });

            let mut session = GameSession::with_seed(params, &Inventory::STARTING, SEED);
            assert_eq!(session.board().check_invariants(), Ok(()));
            let hint = session.try_use_hint().unwrap();
            for id in hint {
                session.try_tap(id).unwrap();
            }
            assert_eq!(session.stats().matches(), 1);
        }
    }

    #[test]
    fn test_huge_time_step_times_out() {
        let mut session = session(standard_tiles(&[1, 2, 3, 2, 2, 4, 3, 4, 7]));
        session.try_use_freeze().unwrap();
        session.advance_time(Duration::MAX);
        assert!(session.state().is_timeout());
        assert_eq!(session.now(), Duration::MAX);
        assert_eq!(session.remaining(), Duration::ZERO);

        session.advance_time(Duration::MAX);
        assert_eq!(session.now(), Duration::MAX);
    }

    #[test]
    fn test_stale_mismatch_clear_after_refresh_is_ignored() {
        let mut session = session(standard_tiles(&[1, 2, 3, 2, 2, 4, 3, 4, 7]));
        assert!(tap_all(&mut session, [0, 1, 3]).is_mismatched());
        session.try_use_refresh().unwrap();
        assert!(session.selection().is_empty());
        assert_eq!(session.board_generation(), 1);

        session.try_tap(id(0)).unwrap();
        session.drain_effects();
        session.advance_time(MISMATCH_GRACE);
        assert_eq!(session.selection(), &[id(0)]);
        assert!(session.drain_effects().is_empty());
    }

    #[test]
    fn test_tap_errors() {
        let mut tiles = standard_tiles(&[1, 2, 3, 5, 5, 5, 5, 5, 0]);
        tiles[3] = Tile::new(id(3), 5, TileKind::Ice);
        tiles[8] = Tile::filler(id(8));
        tiles[7] = Tile::filler(id(7));
        tiles[6] = Tile::filler(id(6));
        let mut session = session(tiles);

        assert_eq!(session.try_tap(id(42)), Err(TapError::UnknownTile(id(42))));
        assert_eq!(session.try_tap(id(3)), Err(TapError::FrozenInIce(id(3))));
        assert_eq!(session.try_tap(id(8)), Err(TapError::NotInteractive(id(8))));

        assert!(tap_all(&mut session, [0, 1, 2]).is_matched());
        assert_eq!(session.try_tap(id(0)), Err(TapError::TileRemoved(id(0))));
    }

    #[test]
    fn test_ice_melts_or_stays_but_is_never_removed() {
        let mut melted = 0;
        let mut frozen = 0;
        for seed in 0..40_u8 {
            let mut tiles = standard_tiles(&[1, 2, 3, 5, 5, 5, 5, 5, 0]);
            tiles[3] = Tile::new(id(3), 5, TileKind::Ice);
            tiles[8] = Tile::filler(id(8));
            tiles[7] = Tile::filler(id(7));
            tiles[6] = Tile::filler(id(6));
            let params = LevelParams::resolve(1).unwrap();
            let board = Board::new(3, tiles).unwrap();
            let mut session = GameSession::with_board(
                params,
                board,
                &Inventory::STARTING,
                BoardSeed::from_bytes([seed; 16]),
            );
            assert!(tap_all(&mut session, [0, 1, 2]).is_matched());

            let ice = session.board().tile(id(3)).unwrap();
            assert!(ice.is_active());
            if ice.kind().is_standard() {
                melted += 1;
            } else {
                frozen += 1;
            }
            let filler = session.board().tile(id(8)).unwrap();
            assert!(filler.is_removed() || filler.kind().is_ice());
        }
        assert!(melted > 0 && frozen > 0);
    }

    #[test]
    fn test_bomb_tile_splashes_two_tiles_without_score() {
        let mut tiles = standard_tiles(&[1, 2, 3, 5, 5, 5, 5, 5, 5]);
        tiles[0] = Tile::new(id(0), 1, TileKind::Bomb);
        let mut session = session(tiles);

        assert_eq!(tap_all(&mut session, [0, 1, 2]), TapOutcome::Matched { points: 100 });
        assert_eq!(session.board().active_count(), 4);
        assert_eq!(session.stats().score(), 100);
        assert_eq!(session.stats().tiles_blasted(), 0);
    }

    #[test]
    fn test_freeze_suspends_countdown_without_double_tick() {
        let mut session = session(standard_tiles(&[1, 2, 3, 2, 2, 4, 3, 4, 7]));
        let budget = session.params().time_budget();

        session.try_use_freeze().unwrap();
        assert!(session.is_frozen());
        for _ in 0..80 {
            session.tick();
        }
        assert_eq!(session.remaining(), budget);
        assert!(!session.is_frozen());
        session.tick();
        assert_eq!(session.remaining(), budget - TICK);

        // A single delta spanning the end of a freeze only counts the unfrozen part.
        session.try_use_freeze().unwrap();
        session.advance_time(Duration::from_secs(10));
        assert_eq!(session.remaining(), budget - TICK - Duration::from_secs(2));

        let effects = session.drain_effects();
        assert_eq!(
            effects.iter().filter(|e| **e == SessionEffect::FreezeEnded).count(),
            2
        );
        assert_eq!(session.consumables().freeze, 0);
        assert_eq!(
            session.try_use_freeze(),
            Err(ConsumableError::Exhausted(ConsumableKind::Freeze))
        );
    }

    #[test]
    fn test_freeze_charges_stack() {
        let mut session = session(standard_tiles(&[1, 2, 3, 2, 2, 4, 3, 4, 7]));
        session.try_use_freeze().unwrap();
        session.try_use_freeze().unwrap();
        assert_eq!(session.freeze_remaining(), FREEZE_DURATION * 2);
    }

    #[test]
    fn test_hint_highlights_and_expires() {
        let mut session = session(standard_tiles(&[1, 2, 3, 2, 2, 4, 3, 4, 7]));
        let hint = session.try_use_hint().unwrap();
        assert_eq!(hint, [id(0), id(1), id(2)]);
        assert_eq!(session.hinted(), &hint);
        assert_eq!(session.consumables().hint, Inventory::SESSION_ALLOTMENT - 1);

        session.try_tap(id(0)).unwrap();
        assert_eq!(session.hinted(), &[id(1), id(2)]);
        session.drain_effects();

        session.advance_time(HINT_DURATION);
        assert!(session.hinted().is_empty());
        assert_eq!(session.drain_effects(), vec![SessionEffect::HintExpired]);
    }

    #[test]
    fn test_hint_without_triple_keeps_charge() {
        let mut session = session(standard_tiles(&[5, 5, 5, 5, 5, 5, 5, 5, 5]));
        assert_eq!(session.try_use_hint(), Err(ConsumableError::NoHintAvailable));
        assert_eq!(session.consumables().hint, Inventory::SESSION_ALLOTMENT);
    }

    #[test]
    fn test_bomb_item_clears_board() {
        let inventory = Inventory::STARTING.with(ConsumableKind::Bomb, 3);
        let mut session = session_with(
            standard_tiles(&[5, 5, 5, 5, 5, 5, 5, 5, 5]),
            Relation::Addition,
            &inventory,
        );
        session.try_tap(id(4)).unwrap();

        let first = session.try_use_bomb().unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(session.board().active_count(), 6);
        assert_eq!(session.stats().score(), 150);
        assert!(first.iter().all(|id| !session.selection().contains(id)));

        session.try_use_bomb().unwrap();
        session.try_use_bomb().unwrap();
        assert!(session.state().is_victory());
        assert_eq!(session.stats().tiles_blasted(), 9);
        assert_eq!(
            session.try_use_bomb(),
            Err(ConsumableError::SessionFinished)
        );
    }

    #[test]
    fn test_empty_inventory_exhausts_carried_kinds_only() {
        let mut session = session_with(
            standard_tiles(&[1, 2, 3, 2, 2, 4, 3, 4, 7]),
            Relation::Addition,
            &Inventory::EMPTY,
        );
        assert_eq!(
            session.try_use_bomb(),
            Err(ConsumableError::Exhausted(ConsumableKind::Bomb))
        );
        assert!(session.try_use_hint().is_ok());
        assert!(session.try_use_refresh().is_ok());
    }

    #[test]
    fn test_refresh_with_seven_active_tiles() {
        let mut tiles = standard_tiles(&[2, 3, 5, 9, 9, 9, 9, 9, 9]);
        tiles[0] = Tile::new(id(0), 2, TileKind::Locked);
        tiles[5] = Tile::new(id(5), 9, TileKind::Ice);
        let mut session = session(tiles);
        assert!(tap_all(&mut session, [0, 1, 2]).is_matched());
        assert_eq!(session.board().active_count(), 7);

        session.try_use_refresh().unwrap();
        let board = session.board();
        assert_eq!(board.active_count(), 6);
        assert_eq!(
            board.tiles().iter().filter(|t| t.is_removed()).count(),
            3
        );
        assert!(board.active_tiles().all(|t| t.kind().is_standard()));
        assert_eq!(board.check_invariants(), Ok(()));
        assert!(match_engine::find_hint(board, Relation::Addition).is_some());
        assert_eq!(session.consumables().refresh, Inventory::SESSION_ALLOTMENT - 1);
    }

    #[test]
    fn test_refresh_down_to_nothing_wins() {
        let mut tiles = standard_tiles(&[2, 3, 5, 9, 0, 0, 0, 0, 0]);
        for n in 4..9 {
            tiles[n as usize] = Tile::filler(id(n));
        }
        tiles[3] = Tile::new(id(3), 9, TileKind::Locked);
        tiles[4] = Tile::standard(id(4), 1);
        tiles[5] = Tile::standard(id(5), 8);
        let mut session = session(tiles);
        assert!(tap_all(&mut session, [0, 1, 2]).is_matched());
        assert!(tap_all(&mut session, [4, 5, 3]).is_matched());
        assert_eq!(session.board().active_count(), 1);

        session.try_use_refresh().unwrap();
        assert!(session.state().is_victory());
    }

    #[test]
    fn test_seeded_sessions_are_reproducible() {
        let params = LevelParams::resolve(45).unwrap();
        let a = GameSession::with_seed(params, &Inventory::STARTING, SEED);
        let b = GameSession::with_seed(params, &Inventory::STARTING, SEED);
        assert_eq!(a.board(), b.board());
        assert_eq!(a.remaining(), params.time_budget());
    }

    #[test]
    fn test_new_rejects_out_of_range_level() {
        assert!(GameSession::new(0, &Inventory::STARTING).is_err());
        assert!(GameSession::new(101, &Inventory::STARTING).is_err());
        assert!(GameSession::new(100, &Inventory::STARTING).is_ok());
    }
}
