//! Error types for the ir-scanner crate.
//!
//! This module provides the [`ScanError`] type for errors that can occur
//! while discovering, rewriting and persisting files.

use camino::Utf8PathBuf;
use ir_core::ConfigError;
use ir_rewriter::RewriteError;
use ir_ts_parser::ParseError;

/// Errors that can occur during an injection run.
///
/// # Error Recovery Strategy
///
/// - **Setup errors** ([`ScanError::MissingRoot`], [`ScanError::Walk`],
///   [`ScanError::Config`]): fatal, nothing has been written yet
/// - **File errors** ([`ScanError::Read`], [`ScanError::Write`],
///   [`ScanError::Rewrite`]): the file is reported as failed and left
///   untouched, the run continues
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use ir_scanner::ScanError;
///
/// let err = ScanError::MissingRoot(Utf8PathBuf::from("src/schemas"));
/// assert!(err.is_fatal());
/// assert!(err.to_string().contains("src/schemas"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Failed to walk a directory.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// A configured root directory does not exist.
    #[error("root directory does not exist: {0}")]
    MissingRoot(Utf8PathBuf),

    /// Failed to read a file.
    #[error("failed to read file {path}: {source}")]
    Read {
        /// The file that couldn't be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a rewritten file back.
    #[error("failed to write file {path}: {source}")]
    Write {
        /// The file that couldn't be written.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file could not be rewritten (malformed input, conflicting edits,
    /// or output that no longer parses).
    #[error("failed to rewrite file {path}: {source}")]
    Rewrite {
        /// The file that couldn't be rewritten.
        path: Utf8PathBuf,
        /// The underlying rewrite error.
        #[source]
        source: RewriteError,
    },

    /// The parser could not be created.
    #[error("failed to initialize parser: {0}")]
    Parser(#[from] ParseError),

    /// Invalid run configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),
}

impl ScanError {
    /// Creates a new [`ScanError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::Write`] error.
    #[inline]
    pub fn write(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::Rewrite`] error.
    #[inline]
    pub fn rewrite(path: impl Into<Utf8PathBuf>, source: RewriteError) -> Self {
        Self::Rewrite {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if this error affects only one file.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Read { .. } | Self::Write { .. } => true,
            Self::Rewrite { source, .. } => source.is_recoverable(),
            Self::Walk(_)
            | Self::MissingRoot(_)
            | Self::Parser(_)
            | Self::Config(_)
            | Self::NonUtf8Path(_) => false,
        }
    }

    /// Returns `true` if this error should stop the run.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Read { path, .. } | Self::Write { path, .. } | Self::Rewrite { path, .. } => {
                Some(path)
            }
            Self::MissingRoot(path) => Some(path),
            Self::Walk(_) | Self::Parser(_) | Self::Config(_) | Self::NonUtf8Path(_) => None,
        }
    }
}
