//! The invocation pipeline: collect prompt values, build the environment,
//! and hand the command to the supervisor (background) or wait on it
//! directly (foreground).

use crate::error::{CoreError, Result};
use crate::tree::ActionDefinition;
use chrono::Utc;
use ferret_proc::{Launch, ProcId, ProcStatus, Supervisor};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Prompt collection
// ---------------------------------------------------------------------------

/// Sequential prompt collection, one value at a time in declared order.
/// `None` means the user cancelled: the whole invocation aborts before any
/// environment is built or process spawned. An empty string is a legal
/// answer, not a cancel.
pub trait PromptSource {
    fn collect(&mut self, key: &str) -> Option<String>;
}

/// Prompt values fixed up front, for non-interactive callers. Keys with no
/// preset value answer with an empty string.
#[derive(Debug, Default)]
pub struct PresetPrompts(pub Vec<(String, String)>);

impl PromptSource for PresetPrompts {
    fn collect(&mut self, key: &str) -> Option<String> {
        Some(
            self.0
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap_or_default(),
        )
    }
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// Result of an invocation.
#[derive(Debug)]
pub enum Outcome {
    /// Foreground run: the child already exited; `id` is its history record.
    Foreground { id: ProcId, status: ProcStatus },
    /// Background run: tracked live by the supervisor.
    Background { id: ProcId },
}

/// Invoke an action against a selection.
///
/// The environment carries one variable per declared prompt key plus the
/// externally-resolved substitution variables in `extra_env`, which this
/// pipeline treats as opaque, already-expanded strings. Selected files
/// become the child's arguments; its working directory is the first file's
/// parent.
///
/// A foreground action takes over the interactive surface: the caller
/// blocks until it exits, and only the terminal status is recorded (no
/// live output streaming). A background action returns its record id
/// immediately.
pub async fn invoke(
    def: &ActionDefinition,
    files: &[PathBuf],
    extra_env: &[(OsString, OsString)],
    prompts: &mut dyn PromptSource,
    supervisor: &Supervisor,
) -> Result<Outcome> {
    let mut env: Vec<(OsString, OsString)> = Vec::with_capacity(def.prompts.len() + extra_env.len());
    for key in &def.prompts {
        let value = prompts
            .collect(key)
            .ok_or_else(|| CoreError::PromptCancelled(key.clone()))?;
        env.push((OsString::from(key), OsString::from(value)));
    }
    env.extend(extra_env.iter().cloned());

    let cwd = files
        .first()
        .and_then(|f| f.parent())
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf);

    let launch = Launch {
        program: def.path.clone().into_os_string(),
        args: files.iter().map(|f| f.clone().into_os_string()).collect(),
        env,
        cwd,
    };

    if def.foreground {
        run_foreground(launch, supervisor).await
    } else {
        Ok(Outcome::Background {
            id: supervisor.spawn(launch),
        })
    }
}

/// Run the child with inherited stdio and wait for it. The terminal status
/// still lands in the supervisor's table as a history record.
async fn run_foreground(launch: Launch, supervisor: &Supervisor) -> Result<Outcome> {
    let started_at = Utc::now();

    let mut cmd = tokio::process::Command::new(&launch.program);
    cmd.args(&launch.args)
        .envs(launch.env.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str())));
    if let Some(cwd) = &launch.cwd {
        cmd.current_dir(cwd);
    }

    let status = match cmd.spawn() {
        Ok(mut child) => match child.wait().await {
            Ok(st) => match st.code() {
                Some(code) => ProcStatus::Exited { code },
                None => ProcStatus::Killed,
            },
            Err(e) => ProcStatus::Failed {
                reason: format!("wait failed: {e}"),
            },
        },
        Err(e) => ProcStatus::Failed {
            reason: format!(
                "failed to spawn '{}': {e}",
                launch.program.to_string_lossy()
            ),
        },
    };

    let id = supervisor.record_completed(&launch, started_at, status.clone());
    Ok(Outcome::Foreground { id, status })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
