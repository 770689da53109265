use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// ProcId / ProcEvent
// ---------------------------------------------------------------------------

/// Record identifier: monotonic per supervisor lifetime, never reused.
pub type ProcId = u64;

/// Change notification emitted on every output append and status transition.
///
/// Deliberately carries nothing but the affected id: listeners re-read the
/// full snapshot on demand, so coalesced or duplicated events are harmless
/// and a slow consumer never blocks a producing child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcEvent {
    pub id: ProcId,
}

// ---------------------------------------------------------------------------
// ProcStatus
// ---------------------------------------------------------------------------

/// Lifecycle of one tracked process.
///
/// Transitions are monotone: `Running` moves to exactly one of the terminal
/// states and never leaves it again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProcStatus {
    Running,
    Exited { code: i32 },
    Killed,
    Failed { reason: String },
}

impl ProcStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProcStatus::Running)
    }
}

impl fmt::Display for ProcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcStatus::Running => write!(f, "running"),
            ProcStatus::Exited { code } => write!(f, "exited({code})"),
            ProcStatus::Killed => write!(f, "killed"),
            ProcStatus::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Origin stream of a captured output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// One captured line, tagged by origin. Lines are appended in arrival
/// order; order within a single stream matches the order the child wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Launch
// ---------------------------------------------------------------------------

/// Everything needed to start a child process. The environment entries are
/// opaque, already-expanded strings; variable expansion happens upstream.
#[derive(Debug, Clone, Default)]
pub struct Launch {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub env: Vec<(OsString, OsString)>,
    pub cwd: Option<PathBuf>,
}

impl Launch {
    pub fn new(program: impl Into<OsString>) -> Self {
        Launch {
            program: program.into(),
            ..Launch::default()
        }
    }

    /// Human-readable command line for display and snapshots.
    pub fn display_command(&self) -> String {
        let mut out = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            out.push(' ');
            out.push_str(&arg.to_string_lossy());
        }
        out
    }
}

// ---------------------------------------------------------------------------
// ProcessSnapshot
// ---------------------------------------------------------------------------

/// Read-only copy of one record. The live table is owned exclusively by the
/// supervisor; everything outside it sees only ids and snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessSnapshot {
    pub id: ProcId,
    pub command: String,
    pub pid: Option<u32>,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub status: ProcStatus,
    pub output: Vec<OutputLine>,
}
