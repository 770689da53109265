//! Quick-action dispatch core for the ferret file browser.
//!
//! Turns a file selection plus its MIME type into a resolvable,
//! parameterized external command: the action tree scans the on-disk
//! hierarchy, the name parser decodes the `name?prompt!` grammar, and the
//! invocation pipeline collects prompts and hands the command to the
//! process supervisor in `ferret-proc`.

pub mod config;
pub mod error;
pub mod installer;
pub mod invoke;
pub mod io;
pub mod mime;
pub mod name;
pub mod paths;
pub mod tree;

pub use error::{CoreError, Result};
