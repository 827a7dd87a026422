use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a playlist load. Every variant leaves the previously
/// loaded playlist untouched.
#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("Please select a CSV file ({0})")]
    NotCsv(PathBuf),
    #[error("Error reading file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No data found in CSV file")]
    Empty,
    #[error("No valid songs found in CSV file")]
    NoSongs,
    #[error("Error parsing CSV file: {0}")]
    Parse(#[from] csv::Error),
}

impl PlaylistError {
    /// Whether the error came from choosing the wrong file rather than from its
    /// contents.
    pub fn is_selection_error(&self) -> bool {
        matches!(self, PlaylistError::NotCsv(_) | PlaylistError::Read { .. })
    }
}
