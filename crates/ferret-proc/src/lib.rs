//! Asynchronous subprocess supervision for ferret.
//!
//! One [`Supervisor`] owns the record table for every child process the
//! application launches. Children run fully in parallel; each output stream
//! is drained by its own task so a child can never stall on a full pipe,
//! observed or not. Listeners subscribe to a broadcast channel of
//! [`ProcEvent`]s and re-read snapshots on demand.

pub mod error;
pub mod record;
pub mod supervisor;

pub use error::{ProcError, Result};
pub use record::{Launch, OutputLine, OutputStream, ProcEvent, ProcId, ProcStatus, ProcessSnapshot};
pub use supervisor::Supervisor;
