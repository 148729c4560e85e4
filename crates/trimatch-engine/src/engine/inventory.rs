use std::fmt;

use serde::{Deserialize, Serialize};

/// A limited-use player aid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ConsumableKind {
    Hint,
    Freeze,
    Bomb,
    Refresh,
}

impl fmt::Display for ConsumableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConsumableKind::Hint => "hint",
            ConsumableKind::Freeze => "freeze",
            ConsumableKind::Bomb => "bomb",
            ConsumableKind::Refresh => "refresh",
        })
    }
}

impl ConsumableKind {
    pub const LEN: usize = 4;
    pub const ALL: [ConsumableKind; Self::LEN] = [
        ConsumableKind::Hint,
        ConsumableKind::Freeze,
        ConsumableKind::Bomb,
        ConsumableKind::Refresh,
    ];

    /// Reset-type consumables are restored to a fixed allotment every
    /// session; the others carry over and accumulate.
    #[must_use]
    pub const fn resets_each_session(self) -> bool {
        matches!(self, ConsumableKind::Hint | ConsumableKind::Refresh)
    }
}

/// Consumable balances.
///
/// Used both as the persisted cross-session inventory and as the live
/// per-session counters. Absent fields deserialize to the starting
/// inventory, so older records without some counters still load.
///
/// # Example
///
/// ```
/// use trimatch_engine::{ConsumableKind, Inventory};
///
/// let mut inventory = Inventory::default();
/// assert_eq!(inventory.get(ConsumableKind::Bomb), 2);
///
/// assert!(inventory.try_consume(ConsumableKind::Bomb));
/// assert!(inventory.try_consume(ConsumableKind::Bomb));
/// assert!(!inventory.try_consume(ConsumableKind::Bomb));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inventory {
    pub hint: u32,
    pub freeze: u32,
    pub bomb: u32,
    pub refresh: u32,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::STARTING
    }
}

impl Inventory {
    /// Balance a reset-type consumable is restored to at every session start.
    pub const SESSION_ALLOTMENT: u32 = 3;

    /// Inventory of a brand new player.
    pub const STARTING: Self = Self {
        hint: Self::SESSION_ALLOTMENT,
        freeze: 2,
        bomb: 2,
        refresh: Self::SESSION_ALLOTMENT,
    };

    pub const EMPTY: Self = Self {
        hint: 0,
        freeze: 0,
        bomb: 0,
        refresh: 0,
    };

    #[must_use]
    pub const fn get(&self, kind: ConsumableKind) -> u32 {
        match kind {
            ConsumableKind::Hint => self.hint,
            ConsumableKind::Freeze => self.freeze,
            ConsumableKind::Bomb => self.bomb,
            ConsumableKind::Refresh => self.refresh,
        }
    }

    fn get_mut(&mut self, kind: ConsumableKind) -> &mut u32 {
        match kind {
            ConsumableKind::Hint => &mut self.hint,
            ConsumableKind::Freeze => &mut self.freeze,
            ConsumableKind::Bomb => &mut self.bomb,
            ConsumableKind::Refresh => &mut self.refresh,
        }
    }

    #[must_use]
    pub fn with(mut self, kind: ConsumableKind, count: u32) -> Self {
        *self.get_mut(kind) = count;
        self
    }

    /// Takes one charge if any is left.
    pub fn try_consume(&mut self, kind: ConsumableKind) -> bool {
        let count = self.get_mut(kind);
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    pub fn add(&mut self, kind: ConsumableKind, count: u32) {
        let current = self.get_mut(kind);
        *current = current.saturating_add(count);
    }

    /// The balances a session opens with: reset-type kinds restored to the
    /// allotment, the rest carried over.
    #[must_use]
    pub fn session_opening(&self) -> Self {
        let mut opening = *self;
        for kind in ConsumableKind::ALL {
            if kind.resets_each_session() {
                *opening.get_mut(kind) = Self::SESSION_ALLOTMENT;
            }
        }
        opening
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConsumableKind, u32)> + '_ {
        ConsumableKind::ALL
            .into_iter()
            .map(|kind| (kind, self.get(kind)))
    }
}
