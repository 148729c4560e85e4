use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::LevelOutOfRangeError;

use super::{relation::Relation, tile::TileKind};

pub const MIN_LEVEL: u32 = 1;
pub const MAX_LEVEL: u32 = 100;
pub const TOTAL_LEVELS: usize = MAX_LEVEL as usize;

/// How a band of levels picks its relation.
#[derive(Debug, Clone, Copy)]
enum RelationPlan {
    Fixed(Relation),
    /// Cycles through the four binary relations by `level % 4`.
    Rotating,
}

#[derive(Debug, Clone, Copy)]
struct Tier {
    last_level: u32,
    plan: RelationPlan,
    ceiling: u32,
}

const fn tier(last_level: u32, plan: RelationPlan, ceiling: u32) -> Tier {
    Tier {
        last_level,
        plan,
        ceiling,
    }
}

const TIERS: [Tier; 10] = {
    use Relation::{Addition, Multiplication, Subtraction, TargetSum};
    use RelationPlan::{Fixed, Rotating};
    [
        tier(10, Fixed(Addition), 10),
        tier(20, Fixed(Subtraction), 10),
        tier(30, Fixed(Addition), 20),
        tier(40, Fixed(Subtraction), 20),
        tier(50, Fixed(Multiplication), 20),
        tier(60, Fixed(TargetSum { target: 12 }), 12),
        tier(70, Fixed(Addition), 100),
        tier(80, Fixed(Multiplication), 50),
        tier(90, Fixed(TargetSum { target: 24 }), 24),
        tier(MAX_LEVEL, Rotating, 100),
    ]
};

const ROTATION: [Relation; 4] = [
    Relation::Addition,
    Relation::Subtraction,
    Relation::Multiplication,
    Relation::Division,
];

/// `(first level with this edge, edge)`, ascending.
const GRID_STEPS: [(u32, usize); 6] = [(1, 4), (11, 5), (31, 6), (51, 7), (76, 8), (91, 9)];

const BASE_TIME: Duration = Duration::from_secs(120);
const TIME_DECAY_PER_LEVEL: Duration = Duration::from_millis(900);
const MIN_TIME: Duration = Duration::from_secs(30);

const MAX_DISTRACTOR_RATE: f64 = 0.5;
const DISTRACTOR_RATE_DIVISOR: f64 = 180.0;

/// `(kind, first level, rate per level, cap)` for each special tile kind.
const SPECIAL_RATE_RAMPS: [(TileKind, u32, f64, f64); 3] = [
    (TileKind::Ice, 9, 0.006, 0.25),
    (TileKind::Locked, 21, 0.005, 0.2),
    (TileKind::Bomb, 41, 0.004, 0.15),
];

/// Spawn probabilities of special tile kinds, keyed by [`TileKind`].
///
/// Kinds without an explicit rate default to zero, and the standard kind
/// takes whatever probability mass is left. Rates are laid out as
/// cumulative bands in ice, locked, bomb order, so they never overlap and
/// their total never exceeds 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecialRates {
    rates: [f64; TileKind::LEN],
}

impl Default for SpecialRates {
    fn default() -> Self {
        Self::NONE
    }
}

impl SpecialRates {
    pub const NONE: Self = Self {
        rates: [0.0; TileKind::LEN],
    };

    /// Builds a rate table, clamping each rate into `[0, 1]` and trimming
    /// later kinds so the bands fit inside `[0, 1)`.
    #[must_use]
    pub fn new(ice: f64, locked: f64, bomb: f64) -> Self {
        let mut rates = [0.0; TileKind::LEN];
        let mut budget = 1.0;
        for (kind, rate) in TileKind::SPECIALS.into_iter().zip([ice, locked, bomb]) {
            let rate = rate.clamp(0.0, 1.0).min(budget);
            rates[kind.index()] = rate;
            budget -= rate;
        }
        Self { rates }
    }

    /// Probability of drawing `kind`.
    #[must_use]
    pub fn rate(&self, kind: TileKind) -> f64 {
        match kind {
            TileKind::Standard => (1.0 - self.total()).max(0.0),
            _ => self.rates[kind.index()],
        }
    }

    /// Combined probability of all special kinds.
    #[must_use]
    pub fn total(&self) -> f64 {
        TileKind::SPECIALS
            .iter()
            .map(|kind| self.rates[kind.index()])
            .sum()
    }

    /// Draws a tile kind from the cumulative probability bands.
    pub fn sample<R>(&self, rng: &mut R) -> TileKind
    where
        R: Rng + ?Sized,
    {
        let roll: f64 = rng.random();
        let mut upper = 0.0;
        for kind in TileKind::SPECIALS {
            upper += self.rates[kind.index()];
            if roll < upper {
                return kind;
            }
        }
        TileKind::Standard
    }
}

/// Everything derived from a level id.
///
/// Resolution is a pure function of the id: the same id always produces the
/// same parameters. Grid edge never shrinks and the time budget never grows
/// as the id increases.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use trimatch_engine::{LevelParams, Relation};
///
/// let params = LevelParams::resolve(1).unwrap();
/// assert_eq!(params.relation(), Relation::Addition);
/// assert_eq!(params.ceiling(), 10);
/// assert_eq!(params.grid_edge(), 4);
/// assert_eq!(params.time_budget(), Duration::from_millis(119_100));
///
/// assert!(LevelParams::resolve(0).is_err());
/// assert_eq!(LevelParams::resolve_clamped(0).level(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelParams {
    level: u32,
    relation: Relation,
    ceiling: u32,
    grid_edge: usize,
    time_budget: Duration,
    distractor_rate: f64,
    special_rates: SpecialRates,
}

impl LevelParams {
    pub fn resolve(level: u32) -> Result<Self, LevelOutOfRangeError> {
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
            return Err(LevelOutOfRangeError { level });
        }
        Ok(Self::resolve_in_range(level))
    }

    /// Like [`Self::resolve`], but clamps out-of-range ids to the nearest valid level.
    #[must_use]
    pub fn resolve_clamped(level: u32) -> Self {
        Self::resolve_in_range(level.clamp(MIN_LEVEL, MAX_LEVEL))
    }

    fn resolve_in_range(level: u32) -> Self {
        let tier = TIERS
            .iter()
            .find(|tier| level <= tier.last_level)
            .unwrap_or(&TIERS[TIERS.len() - 1]);
        let relation = match tier.plan {
            RelationPlan::Fixed(relation) => relation,
            RelationPlan::Rotating => ROTATION[(level % 4) as usize],
        };

        let grid_edge = GRID_STEPS
            .iter()
            .rev()
            .find(|(first, _)| level >= *first)
            .map_or(GRID_STEPS[0].1, |(_, edge)| *edge);

        let time_budget = BASE_TIME
            .saturating_sub(TIME_DECAY_PER_LEVEL * level)
            .max(MIN_TIME);

        let distractor_rate =
            (f64::from(level) / DISTRACTOR_RATE_DIVISOR).min(MAX_DISTRACTOR_RATE);

        let [ice, locked, bomb] = SPECIAL_RATE_RAMPS.map(|(_, first, per_level, cap)| {
            if level >= first {
                (f64::from(level) * per_level).min(cap)
            } else {
                0.0
            }
        });

        Self {
            level,
            relation,
            ceiling: tier.ceiling,
            grid_edge,
            time_budget,
            distractor_rate,
            special_rates: SpecialRates::new(ice, locked, bomb),
        }
    }

    /// Overrides the relation and ceiling, keeping the rest of the level.
    ///
    /// Useful for practice modes and for tests that need a specific rule.
    /// Target sums below [`Relation::MIN_TARGET_SUM`] are raised to it.
    #[must_use]
    pub fn with_relation(mut self, relation: Relation, ceiling: u32) -> Self {
        self.relation = relation.normalized();
        self.ceiling = ceiling;
        self
    }

    #[must_use]
    pub fn with_special_rates(mut self, special_rates: SpecialRates) -> Self {
        self.special_rates = special_rates;
        self
    }

    #[must_use]
    pub fn with_distractor_rate(mut self, distractor_rate: f64) -> Self {
        self.distractor_rate = distractor_rate.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub const fn relation(&self) -> Relation {
        self.relation
    }

    /// Largest value any generated tile may carry.
    #[must_use]
    pub const fn ceiling(&self) -> u32 {
        self.ceiling
    }

    #[must_use]
    pub const fn grid_edge(&self) -> usize {
        self.grid_edge
    }

    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.grid_edge * self.grid_edge
    }

    #[must_use]
    pub const fn time_budget(&self) -> Duration {
        self.time_budget
    }

    /// Fraction of triples that are distractors rather than solvable.
    #[must_use]
    pub const fn distractor_rate(&self) -> f64 {
        self.distractor_rate
    }

    #[must_use]
    pub const fn special_rates(&self) -> &SpecialRates {
        &self.special_rates
    }
}
