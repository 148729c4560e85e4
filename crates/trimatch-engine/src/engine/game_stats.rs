use serde::{Deserialize, Serialize};

/// Points for every successful match before the combo bonus.
pub const MATCH_BASE_SCORE: u32 = 100;
/// Extra points per step of the combo streak at the time of the match.
pub const COMBO_STEP_SCORE: u32 = 20;
/// Points per tile removed by the bomb consumable.
pub const BOMB_TILE_SCORE: u32 = 50;

/// Session statistics: score, combo streak and match counters.
///
/// # Scoring
///
/// A match scores `100 + combo × 20`, where `combo` is the streak *before*
/// the match, then extends the streak. A mismatch resets the streak to zero.
/// Three matches in a row therefore score `300 + (0 + 1 + 2) × 20 = 360`.
///
/// # Example
///
/// ```
/// use trimatch_engine::GameStats;
///
/// let mut stats = GameStats::new();
/// stats.record_match();
/// stats.record_match();
/// stats.record_match();
///
/// assert_eq!(stats.score(), 360);
/// assert_eq!(stats.combo(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    score: u32,
    combo: u32,
    best_combo: u32,
    matches: u32,
    mismatches: u32,
    tiles_blasted: u32,
}

impl GameStats {
    /// Creates a new statistics tracker with all counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score: 0,
            combo: 0,
            best_combo: 0,
            matches: 0,
            mismatches: 0,
            tiles_blasted: 0,
        }
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Current streak of consecutive successful matches.
    #[must_use]
    pub const fn combo(&self) -> u32 {
        self.combo
    }

    #[must_use]
    pub const fn best_combo(&self) -> u32 {
        self.best_combo
    }

    #[must_use]
    pub const fn matches(&self) -> u32 {
        self.matches
    }

    #[must_use]
    pub const fn mismatches(&self) -> u32 {
        self.mismatches
    }

    /// Tiles removed by the bomb consumable.
    #[must_use]
    pub const fn tiles_blasted(&self) -> u32 {
        self.tiles_blasted
    }

    /// Scores a successful match and extends the combo. Returns the points gained.
    pub fn record_match(&mut self) -> u32 {
        let gained = MATCH_BASE_SCORE + self.combo * COMBO_STEP_SCORE;
        self.score += gained;
        self.combo += 1;
        self.best_combo = self.best_combo.max(self.combo);
        self.matches += 1;
        gained
    }

    pub fn record_mismatch(&mut self) {
        self.combo = 0;
        self.mismatches += 1;
    }

    /// Scores tiles removed by the bomb consumable. Returns the points gained.
    pub fn record_blast(&mut self, tiles: u32) -> u32 {
        let gained = tiles * BOMB_TILE_SCORE;
        self.score += gained;
        self.tiles_blasted += tiles;
        gained
    }
}
