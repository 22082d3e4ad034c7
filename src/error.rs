//! Error taxonomy for the shotlist pipeline.
//!
//! Every externally caused failure (network, provider, model) is converted
//! into one of these variants at the operation boundary, carrying a
//! human-readable message plus the original detail. Nothing is retried.

use thiserror::Error;

use crate::workflow::Step;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or rejected bearer token / credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The model's output could not be turned into a people list.
    #[error("could not extract people from script: {0}")]
    Extraction(String),

    /// The provider answered with a non-success status (or was unreachable).
    #[error("provider search failed ({status}): {detail}")]
    Search { status: u16, detail: String },

    #[error("export failed: {0}")]
    Export(String),

    #[error("packaging failed: {0}")]
    Packaging(String),

    #[error("cannot {action} while at step {} ({})", .current.number(), .current.name())]
    InvalidStep { action: &'static str, current: Step },

    /// A person index or media id that is not in the current results.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A single media item that could not be fetched while packaging.
///
/// Logged and dropped; never fatal on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagingItemError {
    pub path: String,
    pub url: String,
    pub reason: String,
}

impl std::fmt::Display for PackagingItemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.path, self.url, self.reason)
    }
}

impl std::error::Error for PackagingItemError {}
