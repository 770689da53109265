use crate::output;
use anyhow::Context;
use ferret_core::config::Config;
use ferret_core::tree::ActionTree;
use std::path::{Path, PathBuf};

pub fn run(root: &Path, paths: &[PathBuf], json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let tree = ActionTree::open(config.actions_dir(root), config.auto_install)?;
    let actions = tree.resolve_paths(paths);

    if json {
        return output::print_json(&actions);
    }

    if actions.is_empty() {
        println!("no actions for this selection");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = actions
        .iter()
        .map(|a| {
            let mode = if a.foreground { "foreground" } else { "background" };
            vec![
                a.tier.to_string(),
                a.display_name.clone(),
                a.prompts.join(", "),
                mode.to_string(),
            ]
        })
        .collect();
    output::print_table(&["TIER", "ACTION", "PROMPTS", "MODE"], &rows);
    Ok(())
}
