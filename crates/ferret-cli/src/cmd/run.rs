use crate::output;
use crate::prompts::TerminalPrompts;
use anyhow::Context;
use ferret_core::config::Config;
use ferret_core::invoke::{self, Outcome};
use ferret_core::tree::ActionTree;
use ferret_core::CoreError;
use ferret_proc::{OutputStream, ProcId, Supervisor};
use std::path::{Path, PathBuf};
use tokio_stream::StreamExt;
use tracing::debug;

pub async fn run(root: &Path, action: &str, paths: &[PathBuf]) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let tree = ActionTree::open(config.actions_dir(root), config.auto_install)?;

    let actions = tree.resolve_paths(paths);
    let def = actions
        .iter()
        .find(|a| a.display_name == action)
        .with_context(|| {
            let names: Vec<&str> = actions.iter().map(|a| a.display_name.as_str()).collect();
            format!(
                "no action named '{action}' for this selection (available: {})",
                if names.is_empty() { "none".to_string() } else { names.join(", ") }
            )
        })?;

    let supervisor = Supervisor::new();
    let outcome = match invoke::invoke(def, paths, &[], &mut TerminalPrompts, &supervisor).await {
        Ok(outcome) => outcome,
        // A cancelled prompt aborts the invocation; nothing was spawned.
        Err(CoreError::PromptCancelled(_)) => {
            eprintln!("cancelled");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let result = match outcome {
        Outcome::Foreground { id, status } => {
            debug!(id, "foreground action recorded");
            eprintln!("{status}");
            output::exit_code_hint(&status)
        }
        Outcome::Background { id } => stream_until_done(&supervisor, id).await,
    };

    // Best-effort: signal anything still running before the process exits.
    supervisor.shutdown();
    result
}

/// Follow one record's live output until it reaches a terminal status.
/// Ctrl-C requests a kill; the final status is still observed through the
/// event stream like any other transition.
async fn stream_until_done(supervisor: &Supervisor, id: ProcId) -> anyhow::Result<()> {
    let mut events = supervisor.event_stream();
    let mut printed = 0usize;

    loop {
        if let Some(snap) = supervisor.snapshot(id) {
            for line in &snap.output[printed..] {
                match line.stream {
                    OutputStream::Stdout => println!("{}", line.text),
                    OutputStream::Stderr => eprintln!("{}", line.text),
                }
            }
            printed = snap.output.len();

            if snap.status.is_terminal() {
                eprintln!("[{}] {}", snap.id, snap.status);
                output::exit_code_hint(&snap.status)?;
                return Ok(());
            }
        } else {
            // Removed out from under us; nothing left to follow.
            return Ok(());
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                supervisor.kill(id)?;
            }
            event = events.next() => {
                if event.is_none() {
                    return Ok(());
                }
                // Lagged events are fine: the snapshot re-read above always
                // reflects the full current state.
            }
        }
    }
}
