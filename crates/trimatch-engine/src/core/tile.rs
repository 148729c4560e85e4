use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a tile, unique within one board instance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::From,
)]
#[serde(transparent)]
pub struct TileId(u32);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl TileId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// The behavior class of a tile.
///
/// - `Ice` tiles cannot be selected until a successful match melts them.
/// - `Locked` tiles need two successful matches before they are removed.
/// - `Bomb` tiles blast extra tiles off the board when matched.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    #[default]
    Standard,
    Ice,
    Locked,
    Bomb,
}

impl TileKind {
    pub const LEN: usize = 4;

    /// Special kinds in the order their probability bands are laid out.
    pub const SPECIALS: [TileKind; 3] = [TileKind::Ice, TileKind::Locked, TileKind::Bomb];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            TileKind::Standard => 0,
            TileKind::Ice => 1,
            TileKind::Locked => 2,
            TileKind::Bomb => 3,
        }
    }
}

/// A single cell of the board.
///
/// Filler tiles occupy a slot but have no arithmetic role; they are ice-typed,
/// never selectable, and only disappear by melting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    id: TileId,
    value: u32,
    kind: TileKind,
    removed: bool,
    lock_count: u8,
    filler: bool,
}

/// What a successful match did to a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum HitOutcome {
    /// A locked tile lost one lock and stays on the board.
    Unlocked { remaining: u8 },
    Removed,
}

impl Tile {
    /// Number of successful matches a locked tile absorbs before removal.
    pub const LOCK_HITS: u8 = 2;

    #[must_use]
    pub const fn new(id: TileId, value: u32, kind: TileKind) -> Self {
        let lock_count = match kind {
            TileKind::Locked => Self::LOCK_HITS,
            _ => 0,
        };
        Self {
            id,
            value,
            kind,
            removed: false,
            lock_count,
            filler: false,
        }
    }

    #[must_use]
    pub const fn standard(id: TileId, value: u32) -> Self {
        Self::new(id, value, TileKind::Standard)
    }

    #[must_use]
    pub const fn filler(id: TileId) -> Self {
        Self {
            id,
            value: 0,
            kind: TileKind::Ice,
            removed: false,
            lock_count: 0,
            filler: true,
        }
    }

    #[must_use]
    pub const fn id(&self) -> TileId {
        self.id
    }

    #[must_use]
    pub const fn value(&self) -> u32 {
        self.value
    }

    #[must_use]
    pub const fn kind(&self) -> TileKind {
        self.kind
    }

    #[must_use]
    pub const fn is_removed(&self) -> bool {
        self.removed
    }

    #[must_use]
    pub const fn lock_count(&self) -> u8 {
        self.lock_count
    }

    #[must_use]
    pub const fn is_filler(&self) -> bool {
        self.filler
    }

    /// Still on the board and counted toward the win condition.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.removed && !self.filler
    }

    /// Active and not blocked by ice, so the player can select it.
    #[must_use]
    pub const fn is_selectable(&self) -> bool {
        self.is_active() && !self.kind.is_ice()
    }

    /// Applies one successful-match hit.
    pub(crate) fn hit(&mut self) -> HitOutcome {
        if self.kind.is_locked() && self.lock_count > 1 {
            self.lock_count -= 1;
            return HitOutcome::Unlocked {
                remaining: self.lock_count,
            };
        }
        self.removed = true;
        HitOutcome::Removed
    }

    /// Melts an ice tile: fillers disappear, interactive tiles turn standard.
    pub(crate) fn melt(&mut self) {
        debug_assert!(self.kind.is_ice());
        if self.filler {
            self.removed = true;
        } else {
            self.kind = TileKind::Standard;
        }
    }

    pub(crate) fn remove(&mut self) {
        self.removed = true;
    }

    pub(crate) fn set_kind(&mut self, kind: TileKind) {
        self.kind = kind;
        self.lock_count = if kind.is_locked() { Self::LOCK_HITS } else { 0 };
    }

    /// Gives the slot a fresh standard value, dropping any special state.
    pub(crate) fn reroll(&mut self, value: u32) {
        self.value = value;
        self.set_kind(TileKind::Standard);
    }
}
