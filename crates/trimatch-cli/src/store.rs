use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trimatch_engine::{ProgressRecord, ProgressStore};

use crate::util::{Output, read_json_file_if_exists};

/// Directory progress is kept in when none is given.
pub const DEFAULT_PROGRESS_DIR: &str = ".trimatch";

/// A progress record as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedProgress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub progress: ProgressRecord,
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new<P>(dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self { dir: dir.into() }
    }

    pub fn from_arg(dir: Option<&Path>) -> Self {
        Self::new(dir.unwrap_or(Path::new(DEFAULT_PROGRESS_DIR)))
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn load_saved(&self, key: &str) -> anyhow::Result<Option<SavedProgress>> {
        read_json_file_if_exists("progress", self.path(key))
    }

    /// Deletes the file for `key`. Returns whether there was one.
    pub fn remove(&self, key: &str) -> anyhow::Result<bool> {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

impl ProgressStore for JsonFileStore {
    type Error = anyhow::Error;

    fn load(&self, key: &str) -> anyhow::Result<Option<ProgressRecord>> {
        Ok(self.load_saved(key)?.map(|saved| saved.progress))
    }

    fn save(&mut self, key: &str, record: &ProgressRecord) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create directory {}", self.dir.display()))?;

        let path = self.path(key);
        let tmp_path = path.with_extension("json.tmp");
        let saved = SavedProgress {
            saved_at: Some(Utc::now()),
            progress: record.clone(),
        };
        Output::open(tmp_path.clone())?.write_json(&saved)?;
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}
