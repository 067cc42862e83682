//! Errors raised by the file driver. The rewrite core itself never fails.

use std::path::PathBuf;

use derive_more::{Display, Error};

pub type DriverResult<T> = Result<T, DriverError>;

#[derive(Debug, Display, Error)]
pub enum DriverError {
    #[display("invalid pattern `{pattern}`: {source}")]
    Pattern { pattern: String, source: glob::PatternError },

    #[display("failed to expand `{pattern}`: {source}")]
    Walk { pattern: String, source: walkdir::Error },

    #[display("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },

    #[display("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: std::io::Error },
}
