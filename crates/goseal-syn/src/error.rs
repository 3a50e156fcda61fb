//! Front-end errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while discovering, reading, or parsing sources.
#[derive(Debug, Error)]
pub enum FrontendError {
    /// A source file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed.
    #[error("failed to walk source tree: {0}")]
    Walk(#[from] ignore::Error),

    /// An exclude pattern is not a valid glob.
    #[error("invalid exclude pattern: {0}")]
    Exclude(#[from] glob::PatternError),

    /// A source file is not valid Rust.
    #[error("parse error in {}:{line}:{column}: {message}", path.display())]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Line of the error (1-indexed).
        line: usize,
        /// Column of the error (1-indexed).
        column: usize,
        /// Parser message.
        message: String,
    },
}

impl FrontendError {
    pub(crate) fn parse(path: PathBuf, error: &syn::Error) -> Self {
        let start = error.span().start();
        Self::Parse {
            path,
            line: start.line,
            column: start.column + 1,
            message: error.to_string(),
        }
    }
}
