//! Cross-session progress and the storage seam it is persisted through.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    convert::Infallible,
};

use serde::{Deserialize, Serialize};

use crate::{
    ConsumableKind, Inventory, LevelOutcome, MAX_LEVEL, MIN_LEVEL, RewardPayload, Stars,
    is_chest_level,
};

/// Key the progress record is stored under.
pub const PROGRESS_STORAGE_KEY: &str = "trimatch.progress.v2";

/// Everything that survives between sessions.
///
/// Every field falls back to its default when absent, so records written by
/// older versions still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressRecord {
    /// Highest level the player may start.
    pub unlocked_level: u32,
    /// Best star rating per cleared level.
    pub stars: BTreeMap<u32, Stars>,
    /// Chest levels whose bonus has been granted.
    pub claimed_chests: BTreeSet<u32>,
    pub inventory: Inventory,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            unlocked_level: MIN_LEVEL,
            stars: BTreeMap::new(),
            claimed_chests: BTreeSet::new(),
            inventory: Inventory::STARTING,
        }
    }
}

/// What a victory changed in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub previous_stars: Stars,
    pub newly_unlocked: Option<u32>,
    pub chest_bonus: Option<RewardPayload>,
    /// Level rewards plus any chest bonus.
    pub granted: RewardPayload,
}

impl ProgressRecord {
    /// Folds a cleared level into the record.
    ///
    /// - the level's stars become the best of the old and new rating
    /// - the watermark moves to the next level, capped at the last one
    /// - the inventory becomes the session's remainder merged with its rewards
    /// - the first victory on a chest level adds the chest bonus
    pub fn record_victory(&mut self, outcome: &LevelOutcome) -> ProgressUpdate {
        let level = outcome.level;

        let entry = self.stars.entry(level).or_default();
        let previous_stars = *entry;
        *entry = previous_stars.max(outcome.stars);

        let next = level.saturating_add(1).min(MAX_LEVEL);
        let newly_unlocked = (next > self.unlocked_level).then(|| {
            self.unlocked_level = next;
            next
        });

        self.inventory = outcome.merged_inventory();

        let chest_bonus = (is_chest_level(level) && self.claimed_chests.insert(level)).then(|| {
            let bonus = RewardPayload::CHEST_BONUS;
            for (kind, count) in bonus.iter() {
                self.inventory.add(kind, count);
            }
            bonus
        });

        ProgressUpdate {
            previous_stars,
            newly_unlocked,
            chest_bonus,
            granted: outcome.rewards.plus(chest_bonus.unwrap_or_default()),
        }
    }

    /// Repairs values that are out of range after loading.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.unlocked_level = self.unlocked_level.clamp(MIN_LEVEL, MAX_LEVEL);
        self.stars
            .retain(|level, stars| (MIN_LEVEL..=MAX_LEVEL).contains(level) && *stars > Stars::NONE);
        for stars in self.stars.values_mut() {
            *stars = (*stars).min(Stars::MAX);
        }
        self.claimed_chests.retain(|level| is_chest_level(*level));
        self
    }

    #[must_use]
    pub fn is_unlocked(&self, level: u32) -> bool {
        (MIN_LEVEL..=self.unlocked_level).contains(&level)
    }

    #[must_use]
    pub fn stars(&self, level: u32) -> Stars {
        self.stars.get(&level).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn total_stars(&self) -> u32 {
        self.stars.values().map(|stars| u32::from(stars.count())).sum()
    }

    #[must_use]
    pub fn consumable(&self, kind: ConsumableKind) -> u32 {
        self.inventory.get(kind)
    }
}

/// Get/set access to persisted progress records.
pub trait ProgressStore {
    type Error;

    /// Returns `None` when nothing is stored under `key`.
    fn load(&self, key: &str) -> Result<Option<ProgressRecord>, Self::Error>;

    fn save(&mut self, key: &str, record: &ProgressRecord) -> Result<(), Self::Error>;

    /// Loads the record under [`PROGRESS_STORAGE_KEY`], or a fresh one.
    fn load_progress(&self) -> Result<ProgressRecord, Self::Error> {
        Ok(self
            .load(PROGRESS_STORAGE_KEY)?
            .unwrap_or_default()
            .normalized())
    }

    fn save_progress(&mut self, record: &ProgressRecord) -> Result<(), Self::Error> {
        self.save(PROGRESS_STORAGE_KEY, record)
    }
}

/// In-memory store for tests and embedders without storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<String, ProgressRecord>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryStore {
    type Error = Infallible;

    fn load(&self, key: &str) -> Result<Option<ProgressRecord>, Self::Error> {
        Ok(self.records.get(key).cloned())
    }

    fn save(&mut self, key: &str, record: &ProgressRecord) -> Result<(), Self::Error> {
        self.records.insert(key.to_owned(), record.clone());
        Ok(())
    }
}
