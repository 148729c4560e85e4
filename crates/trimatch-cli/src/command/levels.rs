use std::{io::Write as _, path::PathBuf};

use anyhow::Context;
use serde::Serialize;
use trimatch_engine::{
    LevelParams, MAX_LEVEL, MIN_LEVEL, TileKind, is_chest_level, level_name, region,
};

use crate::util::Output;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct LevelsArg {
    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
struct LevelEntry {
    name: &'static str,
    region: &'static str,
    chest: bool,
    #[serde(flatten)]
    params: LevelParams,
}

pub(crate) fn run(arg: &LevelsArg) -> anyhow::Result<()> {
    let LevelsArg { json, output } = arg;

    let entries = (MIN_LEVEL..=MAX_LEVEL)
        .map(|level| {
            Ok(LevelEntry {
                name: level_name(level).unwrap_or_default(),
                region: region(level).map_or("", |region| region.name),
                chest: is_chest_level(level),
                params: LevelParams::resolve(level)?,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    if *json {
        return Output::save_json(&entries, output.clone());
    }

    let mut output = Output::from_output_path(output.clone())?;
    write_table(&mut output, &entries)
        .with_context(|| format!("Failed to write table to {}", output.display_path()))?;
    Ok(())
}

fn write_table(output: &mut Output, entries: &[LevelEntry]) -> std::io::Result<()> {
    writeln!(
        output,
        "{:>5}  {:<20} {:<18} {:<16} {:>4} {:>4} {:>7} {:>6} {:>5} {:>6} {:>5}",
        "level", "name", "region", "relation", "max", "grid", "time", "decoy", "ice", "locked", "bomb"
    )?;
    for entry in entries {
        let params = &entry.params;
        let rates = params.special_rates();
        let chest = if entry.chest { "*" } else { "" };
        writeln!(
            output,
            "{:>5}  {:<20} {:<18} {:<16} {:>4} {:>2}x{} {:>6.1}s {:>5.0}% {:>4.1}% {:>5.1}% {:>4.1}%",
            format!("{chest}{}", params.level()),
            entry.name,
            entry.region,
            params.relation().to_string(),
            params.ceiling(),
            params.grid_edge(),
            params.grid_edge(),
            params.time_budget().as_secs_f64(),
            params.distractor_rate() * 100.0,
            rates.rate(TileKind::Ice) * 100.0,
            rates.rate(TileKind::Locked) * 100.0,
            rates.rate(TileKind::Bomb) * 100.0,
        )?;
    }
    output.flush()
}
