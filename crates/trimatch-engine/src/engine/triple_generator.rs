use std::{fmt, str::FromStr};

use rand::{
    Rng,
    distr::{Distribution, StandardUniform},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{GenerationInvariantViolation, LevelParams, Relation, Triple};

/// Natural draw range for the divisor and quotient in division mode.
const DIVISION_FACTOR_MAX: u32 = 9;

/// Produces arithmetic triples for one relation within a numeric ceiling.
///
/// Every operand is at least 1 and at most the ceiling. Valid triples always
/// satisfy the relation; [`valid`](Self::valid) checks this in debug builds
/// and [`checked_valid`](Self::checked_valid) in every build.
///
/// | Relation       | Draw                                                  |
/// |----------------|-------------------------------------------------------|
/// | Addition       | `c ∈ [2, ceil]`, `a ∈ [1, c-1]`, `b = c - a`          |
/// | Subtraction    | `a ∈ [2, ceil]`, `b ∈ [1, a-1]`, `c = a - b`          |
/// | Multiplication | `a ∈ [2, √ceil]`, `b ∈ [1, ceil / a]`, `c = a × b`    |
/// | Division       | `b, c ∈ [1, 9]`, `a = b × c`, divisor fallback if big |
/// | TargetSum      | `a`, then `b` from the remaining budget, `c` = rest   |
///
/// # Example
///
/// ```
/// use rand::SeedableRng as _;
/// use rand_pcg::Pcg32;
/// use trimatch_engine::{Relation, TripleGenerator};
///
/// let generator = TripleGenerator::new(Relation::Subtraction, 20);
/// let mut rng = Pcg32::seed_from_u64(42);
///
/// let triple = generator.valid(&mut rng);
/// assert!(triple.satisfies(Relation::Subtraction));
/// assert!(triple.max() <= 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripleGenerator {
    relation: Relation,
    ceiling: u32,
}

impl TripleGenerator {
    /// Smallest ceiling every relation can be generated under.
    pub const MIN_CEILING: u32 = 4;

    /// Target sums below [`Relation::MIN_TARGET_SUM`] are raised to it.
    #[must_use]
    pub fn new(relation: Relation, ceiling: u32) -> Self {
        let relation = relation.normalized();
        let ceiling = match relation {
            Relation::TargetSum { target } => target,
            _ => ceiling.max(Self::MIN_CEILING),
        };
        Self { relation, ceiling }
    }

    #[must_use]
    pub fn for_level(params: &LevelParams) -> Self {
        Self::new(params.relation(), params.ceiling())
    }

    #[must_use]
    pub const fn relation(&self) -> Relation {
        self.relation
    }

    #[must_use]
    pub const fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Draws a triple that satisfies the relation.
    pub fn valid<R>(&self, rng: &mut R) -> Triple
    where
        R: Rng + ?Sized,
    {
        let triple = self.draw(rng);
        debug_assert_eq!(self.check(triple), Ok(triple));
        triple
    }

    /// Like [`valid`](Self::valid), but verifies the post-condition in
    /// release builds too.
    pub fn checked_valid<R>(&self, rng: &mut R) -> Result<Triple, GenerationInvariantViolation>
    where
        R: Rng + ?Sized,
    {
        self.check(self.draw(rng))
    }

    /// Accepts `triple` if it satisfies the relation with every operand in
    /// `1..=ceiling`.
    pub fn check(&self, triple: Triple) -> Result<Triple, GenerationInvariantViolation> {
        let in_range = triple.values().iter().all(|v| (1..=self.ceiling).contains(v));
        if in_range && triple.satisfies(self.relation) {
            Ok(triple)
        } else {
            Err(GenerationInvariantViolation::TripleRelationViolated {
                triple,
                relation: self.relation,
            })
        }
    }

    fn draw<R>(&self, rng: &mut R) -> Triple
    where
        R: Rng + ?Sized,
    {
        let ceiling = self.ceiling;
        match self.relation {
            Relation::Addition => {
                let c = rng.random_range(2..=ceiling);
                let a = rng.random_range(1..c);
                Triple::new(a, c - a, c)
            }
            Relation::Subtraction => {
                let a = rng.random_range(2..=ceiling);
                let b = rng.random_range(1..a);
                Triple::new(a, b, a - b)
            }
            Relation::Multiplication => {
                let max_factor = ceiling.isqrt().max(2);
                let a = rng.random_range(2..=max_factor);
                let b = rng.random_range(1..=(ceiling / a).max(1));
                Triple::new(a, b, a * b)
            }
            Relation::Division => {
                let b = rng.random_range(1..=DIVISION_FACTOR_MAX);
                let c = rng.random_range(1..=DIVISION_FACTOR_MAX);
                let a = b * c;
                if a <= ceiling {
                    Triple::new(a, b, c)
                } else {
                    self.division_by_divisors(rng)
                }
            }
            Relation::TargetSum { target } => {
                // Leave room for at least 1 in each later draw.
                let a = rng.random_range(1..=target - 2);
                let b = rng.random_range(1..=target - a - 1);
                Triple::new(a, b, target - a - b)
            }
        }
    }

    /// Picks a dividend first, then one of its divisors, so the result is
    /// always in range without a retry loop.
    fn division_by_divisors<R>(&self, rng: &mut R) -> Triple
    where
        R: Rng + ?Sized,
    {
        let a = rng.random_range(2..=self.ceiling);
        let divisors: Vec<u32> = (1..=a).filter(|d| a % d == 0).collect();
        let b = divisors[rng.random_range(0..divisors.len())];
        Triple::new(a, b, a / b)
    }

    /// Draws three independent values in range with no relation guarantee.
    pub fn distractor<R>(&self, rng: &mut R) -> Triple
    where
        R: Rng + ?Sized,
    {
        let mut value = || rng.random_range(1..=self.ceiling);
        Triple::new(value(), value(), value())
    }
}

/// Seed for deterministic board generation and session randomness.
///
/// A 128-bit seed for the session's `Pcg32`. The same seed with the same
/// level reproduces the same board, the same ice melts and the same bomb
/// targets. Serializes as a 32-character hex string.
///
/// # Example
///
/// ```
/// use rand::Rng as _;
/// use trimatch_engine::BoardSeed;
///
/// let seed: BoardSeed = rand::rng().random();
/// let parsed: BoardSeed = seed.to_string().parse().unwrap();
/// assert_eq!(seed, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardSeed([u8; 16]);

impl BoardSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }
}

impl fmt::Display for BoardSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let num = u128::from_be_bytes(self.0);
        write!(f, "{num:032x}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid seed hex {input:?}: {reason}")]
pub struct ParseBoardSeedError {
    input: String,
    reason: String,
}

impl FromStr for BoardSeed {
    type Err = ParseBoardSeedError;

    fn from_str(hex_str: &str) -> Result<Self, Self::Err> {
        let error = |reason: String| ParseBoardSeedError {
            input: hex_str.to_owned(),
            reason,
        };
        if hex_str.len() != 32 {
            return Err(error(format!(
                "expected 32 characters, got {}",
                hex_str.len()
            )));
        }
        let num = u128::from_str_radix(hex_str, 16).map_err(|e| error(e.to_string()))?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Serialize for BoardSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BoardSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}

/// Allows generating random `BoardSeed` values with `rng.random()`.
impl Distribution<BoardSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> BoardSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        BoardSeed(seed)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::{MAX_LEVEL, MIN_LEVEL};

    #[test]
    fn test_valid_triples_for_every_level() {
        let mut rng = Pcg32::seed_from_u64(1);
        for level in MIN_LEVEL..=MAX_LEVEL {
            let params = LevelParams::resolve(level).unwrap();
            let generator = TripleGenerator::for_level(&params);
            for _ in 0..200 {
                let triple = generator.valid(&mut rng);
                assert!(
                    triple.satisfies(params.relation()),
                    "level {level}: {triple} fails {}",
                    params.relation()
                );
                assert!(triple.max() <= params.ceiling(), "level {level}: {triple}");
                assert!(triple.values().iter().all(|&v| v >= 1), "level {level}: {triple}");
            }
        }
    }

    #[test]
    fn test_division_fallback_stays_in_range() {
        // Ceiling below most natural products forces the divisor fallback.
        let generator = TripleGenerator::new(Relation::Division, 6);
        let mut rng = Pcg32::seed_from_u64(99);
        for _ in 0..500 {
            let triple = generator.valid(&mut rng);
            assert!(triple.satisfies(Relation::Division));
            assert!(triple.max() <= 6, "{triple}");
        }
    }

    #[test]
    fn test_small_target_sum() {
        let generator = TripleGenerator::new(Relation::TargetSum { target: 3 }, 3);
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..50 {
            assert_eq!(generator.valid(&mut rng), Triple::new(1, 1, 1));
        }
    }

    #[test]
    fn test_target_sum_below_three_is_raised() {
        let mut rng = Pcg32::seed_from_u64(7);
        for target in 0..=2 {
            let generator = TripleGenerator::new(Relation::TargetSum { target }, 10);
            assert_eq!(generator.relation(), Relation::TargetSum { target: 3 });
            assert_eq!(generator.ceiling(), 3);
            for _ in 0..20 {
                assert_eq!(generator.valid(&mut rng), Triple::new(1, 1, 1));
                assert_eq!(generator.checked_valid(&mut rng), Ok(Triple::new(1, 1, 1)));
            }
        }
    }

    #[test]
    fn test_check_rejects_broken_triples() {
        let generator = TripleGenerator::new(Relation::Addition, 10);
        assert_eq!(generator.check(Triple::new(3, 4, 7)), Ok(Triple::new(3, 4, 7)));
        for triple in [Triple::new(3, 4, 8), Triple::new(0, 7, 7), Triple::new(5, 6, 11)] {
            assert_eq!(
                generator.check(triple),
                Err(GenerationInvariantViolation::TripleRelationViolated {
                    triple,
                    relation: Relation::Addition,
                })
            );
        }
    }

    #[test]
    fn test_checked_valid_for_every_level() {
        let mut rng = Pcg32::seed_from_u64(2);
        for level in MIN_LEVEL..=MAX_LEVEL {
            let params = LevelParams::resolve(level).unwrap();
            let generator = TripleGenerator::for_level(&params);
            for _ in 0..50 {
                assert!(generator.checked_valid(&mut rng).is_ok(), "level {level}");
            }
        }
    }

    #[test]
    fn test_distractor_in_range() {
        let generator = TripleGenerator::new(Relation::Addition, 10);
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..200 {
            let triple = generator.distractor(&mut rng);
            assert!(triple.values().iter().all(|v| (1..=10).contains(v)));
        }
    }

    mod board_seed_serialization {
        use super::*;

        #[test]
        fn test_known_value_sequential_bytes() {
            let seed = BoardSeed::from_bytes([
                0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54,
                0x32, 0x10,
            ]);
            let serialized = serde_json::to_string(&seed).unwrap();
            assert_eq!(serialized, "\"0123456789abcdeffedcba9876543210\"");

            let deserialized: BoardSeed = serde_json::from_str(&serialized).unwrap();
            assert_eq!(deserialized, seed);
        }

        #[test]
        fn test_deserialize_uppercase_hex() {
            let seed: BoardSeed = "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF".parse().unwrap();
            assert_eq!(seed.to_bytes(), [0xFF; 16]);
        }

        #[test]
        fn test_error_wrong_length() {
            let result: Result<BoardSeed, _> = serde_json::from_str("\"0123\"");
            let err_msg = result.unwrap_err().to_string();
            assert!(err_msg.contains("invalid seed hex"));
            assert!(err_msg.contains("expected 32 characters"));
        }

        #[test]
        fn test_error_invalid_hex_characters() {
            let result = "ghijklmnopqrstuvwxyzghijklmnopqr".parse::<BoardSeed>();
            assert!(result.is_err());
        }
    }
}
