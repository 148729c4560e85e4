use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{ConsumableKind, GameStats, Inventory};

/// Star rating earned for a cleared level, between 1 and 3.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Stars(u8);

impl fmt::Display for Stars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 1..=Self::MAX.0 {
            f.write_str(if i <= self.0 { "★" } else { "☆" })?;
        }
        Ok(())
    }
}

impl Stars {
    pub const NONE: Self = Self(0);
    pub const ONE: Self = Self(1);
    pub const TWO: Self = Self(2);
    pub const THREE: Self = Self(3);
    pub const MAX: Self = Self::THREE;

    #[must_use]
    pub const fn count(self) -> u8 {
        self.0
    }

    /// Rates a victory by the share of the time budget left on the clock.
    ///
    /// - more than 60% left: 3 stars
    /// - more than 30% left: 2 stars
    /// - otherwise: 1 star
    ///
    /// Computed on whole milliseconds so the thresholds are exact.
    #[must_use]
    pub fn rate(remaining: Duration, budget: Duration) -> Self {
        let remaining = remaining.as_millis();
        let budget = budget.as_millis();
        if remaining * 10 > budget * 6 {
            Self::THREE
        } else if remaining * 10 > budget * 3 {
            Self::TWO
        } else {
            Self::ONE
        }
    }
}

/// Consumables granted on clearing a level.
///
/// Only accumulate-type kinds are granted; reset-type kinds are restored to
/// their allotment anyway, so a grant would be lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewardPayload {
    pub(crate) freeze: u32,
    pub(crate) bomb: u32,
}

impl RewardPayload {
    /// A freeze charge on every 10th level.
    pub const FREEZE_PERIOD: u32 = 10;
    /// A bomb charge on every 7th level.
    pub const BOMB_PERIOD: u32 = 7;
    /// One-time bonus for the first victory on a chest level.
    pub const CHEST_BONUS: Self = Self { freeze: 1, bomb: 1 };

    /// The deterministic reward for clearing `level`.
    #[must_use]
    pub const fn for_level(level: u32) -> Self {
        Self {
            freeze: (level % Self::FREEZE_PERIOD == 0) as u32,
            bomb: (level % Self::BOMB_PERIOD == 0) as u32,
        }
    }

    #[must_use]
    pub const fn get(&self, kind: ConsumableKind) -> u32 {
        match kind {
            ConsumableKind::Freeze => self.freeze,
            ConsumableKind::Bomb => self.bomb,
            ConsumableKind::Hint | ConsumableKind::Refresh => 0,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.freeze == 0 && self.bomb == 0
    }

    #[must_use]
    pub const fn plus(self, other: Self) -> Self {
        Self {
            freeze: self.freeze + other.freeze,
            bomb: self.bomb + other.bomb,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConsumableKind, u32)> + '_ {
        ConsumableKind::ALL
            .into_iter()
            .map(|kind| (kind, self.get(kind)))
            .filter(|(_, count)| *count > 0)
    }
}

/// Merges what is left after a session with its rewards.
///
/// Accumulate-type balances carry over and gain the reward; reset-type
/// balances are restored to [`Inventory::SESSION_ALLOTMENT`] regardless of
/// how many were used.
#[must_use]
pub fn merge_inventory(remaining: &Inventory, rewards: &RewardPayload) -> Inventory {
    let mut merged = *remaining;
    for kind in ConsumableKind::ALL {
        if kind.resets_each_session() {
            merged = merged.with(kind, Inventory::SESSION_ALLOTMENT);
        } else {
            merged.add(kind, rewards.get(kind));
        }
    }
    merged
}

/// Summary of a cleared level, handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelOutcome {
    pub level: u32,
    pub stars: Stars,
    pub rewards: RewardPayload,
    pub remaining_time: Duration,
    pub stats: GameStats,
    /// Session balances at the moment of victory.
    pub remaining_consumables: Inventory,
}

impl LevelOutcome {
    #[must_use]
    pub fn new(
        level: u32,
        remaining_time: Duration,
        time_budget: Duration,
        stats: GameStats,
        remaining_consumables: Inventory,
    ) -> Self {
        Self {
            level,
            stars: Stars::rate(remaining_time, time_budget),
            rewards: RewardPayload::for_level(level),
            remaining_time,
            stats,
            remaining_consumables,
        }
    }

    /// The inventory to persist after this victory.
    #[must_use]
    pub fn merged_inventory(&self) -> Inventory {
        merge_inventory(&self.remaining_consumables, &self.rewards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_thresholds() {
        let budget = Duration::from_secs(100);
        assert_eq!(Stars::rate(Duration::from_secs(100), budget), Stars::THREE);
        assert_eq!(Stars::rate(Duration::from_millis(60_001), budget), Stars::THREE);
        assert_eq!(Stars::rate(Duration::from_secs(60), budget), Stars::TWO);
        assert_eq!(Stars::rate(Duration::from_millis(30_001), budget), Stars::TWO);
        assert_eq!(Stars::rate(Duration::from_secs(30), budget), Stars::ONE);
        assert_eq!(Stars::rate(Duration::ZERO, budget), Stars::ONE);
    }

    #[test]
    fn test_star_rating_is_monotonic() {
        let budget = Duration::from_millis(119_100);
        let mut previous = Stars::NONE;
        for millis in (0..=119_100).step_by(100) {
            let stars = Stars::rate(Duration::from_millis(millis), budget);
            assert!(stars >= previous);
            previous = stars;
        }
        assert_eq!(previous, Stars::THREE);
    }

    #[test]
    fn test_rewards_for_level() {
        assert!(RewardPayload::for_level(1).is_empty());
        assert_eq!(RewardPayload::for_level(7).get(ConsumableKind::Bomb), 1);
        assert_eq!(RewardPayload::for_level(10).get(ConsumableKind::Freeze), 1);
        assert_eq!(RewardPayload::for_level(10).get(ConsumableKind::Bomb), 0);
        let both = RewardPayload::for_level(70);
        assert_eq!(both.iter().count(), 2);
        assert_eq!(RewardPayload::for_level(70).get(ConsumableKind::Hint), 0);
    }

    #[test]
    fn test_merge_resets_and_accumulates() {
        let remaining = Inventory {
            hint: 0,
            freeze: 1,
            bomb: 0,
            refresh: 2,
        };
        let merged = merge_inventory(&remaining, &RewardPayload::for_level(70));
        assert_eq!(
            merged,
            Inventory {
                hint: 3,
                freeze: 2,
                bomb: 1,
                refresh: 3
            }
        );

        // Merging twice never moves reset-type balances off the allotment.
        let again = merge_inventory(&merged, &RewardPayload::default());
        assert_eq!(again.hint, Inventory::SESSION_ALLOTMENT);
        assert_eq!(again.refresh, Inventory::SESSION_ALLOTMENT);
        assert_eq!(again.freeze, 2);
    }

    #[test]
    fn test_stars_display() {
        assert_eq!(Stars::TWO.to_string(), "★★☆");
    }
}
