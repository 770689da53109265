use anyhow::Context;
use ferret_core::config::Config;
use ferret_core::{installer, io};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let actions = config.actions_dir(root);

    io::ensure_dir(&actions)?;
    let installed = installer::install_defaults(&actions)?;

    println!("{} action(s) installed in {}", installed, actions.display());
    Ok(())
}
