use std::path::PathBuf;

use blockfall_engine::{GameConfig, Manifest};
use serde::Serialize;

use crate::util::Output;

use super::SetupArg;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ShowConfigArg {
    #[clap(flatten)]
    setup: SetupArg,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct EffectiveSetup {
    manifest: Manifest,
    config: GameConfig,
}

pub(crate) fn run(arg: &ShowConfigArg) -> anyhow::Result<()> {
    let ShowConfigArg { setup, output } = arg;
    let (config, manifest) = setup.load()?;
    Output::save_json(&EffectiveSetup { manifest, config }, output.clone())
}
