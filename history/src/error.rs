use std::io;

use thiserror::Error;

use crate::types::EntryId;

/// Failures surfaced by the history engine and its collaborators.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("entry {0} not found")]
    NotFound(EntryId),
    #[error("menu item '{id}' rejected: {reason}")]
    AffordanceConflict { id: String, reason: String },
    #[error("context changed before the computation completed")]
    StaleContext,
    #[error("page still loading after {attempts} attempts")]
    PageNotLoaded { attempts: u32 },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, HistoryError>;
