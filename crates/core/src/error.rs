//! Typed errors for the persisted override store.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reading or writing the local override list.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("override store I/O failed for {}: {source}", path.display())]
    Io {
        /// File the operation targeted.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Stored content is not a list of exclusion records.
    #[error("override store content is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
