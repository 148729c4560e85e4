use clap::{Parser, Subcommand};

use self::{
    auto_play::AutoPlayArg, generate_board::GenerateBoardArg, levels::LevelsArg,
    progress::ProgressAction,
};

mod auto_play;
mod generate_board;
mod levels;
mod progress;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Print the resolved parameters of every level
    Levels(#[clap(flatten)] LevelsArg),
    /// Generate a board for a level
    GenerateBoard(#[clap(flatten)] GenerateBoardArg),
    /// Play levels with a hint-following bot
    AutoPlay(#[clap(flatten)] AutoPlayArg),
    /// Show or reset saved progress
    Progress {
        #[command(subcommand)]
        action: ProgressAction,
    },
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Levels(arg) => levels::run(&arg)?,
        Mode::GenerateBoard(arg) => generate_board::run(&arg)?,
        Mode::AutoPlay(arg) => auto_play::run(&arg)?,
        Mode::Progress { action } => progress::run(&action)?,
    }
    Ok(())
}
