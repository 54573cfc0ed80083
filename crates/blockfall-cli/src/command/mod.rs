use std::path::PathBuf;

use blockfall_engine::{GameConfig, Manifest};
use clap::{Parser, Subcommand};

use self::{show_config::ShowConfigArg, simulate::SimulateArg};
use crate::util;

mod show_config;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Run headless games driven by random input and print a summary
    Simulate(#[clap(flatten)] SimulateArg),
    /// Print the effective configuration and manifest
    ShowConfig(#[clap(flatten)] ShowConfigArg),
}

/// Configuration sources shared by every mode.
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct SetupArg {
    /// Game configuration JSON file (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Manifest JSON file selecting rules, shapes and generator
    #[arg(long)]
    manifest: Option<PathBuf>,
}

impl SetupArg {
    fn load(&self) -> anyhow::Result<(GameConfig, Manifest)> {
        let config = util::load_config(self.config.as_deref())?;
        let manifest = util::load_manifest(self.manifest.as_deref())?;
        Ok((config, manifest))
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Simulate(arg) => simulate::run(&arg)?,
        Mode::ShowConfig(arg) => show_config::run(&arg)?,
    }
    Ok(())
}
