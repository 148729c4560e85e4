use std::path::PathBuf;

use serde::Serialize;
use tracing::info;
use trimatch_engine::{PROGRESS_STORAGE_KEY, ProgressRecord, ProgressStore as _};

use crate::{store::JsonFileStore, util::Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ProgressDirArg {
    /// Directory progress is stored in
    #[arg(long)]
    progress_dir: Option<PathBuf>,
}

impl ProgressDirArg {
    fn store(&self) -> JsonFileStore {
        JsonFileStore::from_arg(self.progress_dir.as_deref())
    }
}

#[derive(Debug, Clone, clap::Subcommand)]
pub(crate) enum ProgressAction {
    /// Print the saved progress as JSON
    Show(#[clap(flatten)] ProgressDirArg),
    /// Delete the saved progress
    Reset(#[clap(flatten)] ProgressDirArg),
}

#[derive(Debug, Serialize)]
struct ProgressSummary<'a> {
    path: String,
    saved_at: Option<String>,
    total_stars: u32,
    #[serde(flatten)]
    progress: &'a ProgressRecord,
}

pub(crate) fn run(action: &ProgressAction) -> anyhow::Result<()> {
    match action {
        ProgressAction::Show(arg) => show(arg),
        ProgressAction::Reset(arg) => reset(arg),
    }
}

fn show(arg: &ProgressDirArg) -> anyhow::Result<()> {
    let store = arg.store();
    let saved_at = store
        .load_saved(PROGRESS_STORAGE_KEY)?
        .and_then(|saved| saved.saved_at)
        .map(|at| at.to_rfc3339());
    let progress = store.load_progress()?;

    let summary = ProgressSummary {
        path: store.path(PROGRESS_STORAGE_KEY).display().to_string(),
        saved_at,
        total_stars: progress.total_stars(),
        progress: &progress,
    };
    Output::save_json(&summary, None)
}

fn reset(arg: &ProgressDirArg) -> anyhow::Result<()> {
    let store = arg.store();
    let path = store.path(PROGRESS_STORAGE_KEY);
    if store.remove(PROGRESS_STORAGE_KEY)? {
        info!(path = %path.display(), "progress reset");
    } else {
        info!(path = %path.display(), "no saved progress");
    }
    Ok(())
}
