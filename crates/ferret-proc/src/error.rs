use crate::record::ProcId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcError {
    #[error("no such process record: {0}")]
    NotFound(ProcId),

    #[error("cannot remove a live process: {0} (kill it first)")]
    RemoveLive(ProcId),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProcError>;
