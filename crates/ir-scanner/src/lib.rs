//! File discovery and in-place rewriting for the instance-routing injector.
//!
//! This crate drives a run: it walks the configured roots, adds the explicit
//! files, rewrites each file with `ir-rewriter` in parallel and writes the
//! changed ones back atomically.
//!
//! # Overview
//!
//! - [`FileWalker`]: directory traversal respecting `.gitignore` patterns
//! - [`Injector`]: parallel per-file processing with rayon + bumpalo arenas
//! - [`RunStats`]: atomic counters, summarized by [`StatsSnapshot`]
//! - [`write_atomic`]: temp-file-and-rename write-back
//!
//! # Example
//!
//! ```no_run
//! use ir_core::Config;
//! use ir_scanner::Injector;
//!
//! let config = Config::default();
//! let result = Injector::new(config)?.run()?;
//!
//! for file in &result.files {
//!     println!("{}: {}", file.path, file.outcome);
//! }
//! println!("{}", result.stats);
//! # Ok::<(), ir_scanner::ScanError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! Injector (entry point)
//!     │
//!     ├── FileWalker (collect paths per root)
//!     │       │
//!     │       └── WalkBuilder (ignore crate)
//!     │
//!     ├── rayon map_init (per-thread TsParser + Herd member)
//!     │       │
//!     │       └── Rewriter (ir-rewriter)
//!     │
//!     ├── write_atomic (tempfile persist)
//!     │
//!     └── RunStats (atomic counters)
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod injector;
mod stats;
mod walker;
mod writer;

pub use error::ScanError;
pub use injector::Injector;
pub use stats::{RunStats, StatsSnapshot};
pub use walker::FileWalker;
pub use writer::write_atomic;

// Re-exported so callers can cancel a run without depending on tokio-util.
pub use tokio_util::sync::CancellationToken;

use camino::{Utf8Path, Utf8PathBuf};
use ir_core::{FileOutcome, SkipReason};
use ir_rewriter::RewriteReport;
use serde::{Serialize, Serializer};

/// What happened to one file.
#[derive(Debug, Serialize)]
pub struct FileReport {
    /// The file.
    pub path: Utf8PathBuf,
    /// Its outcome.
    pub outcome: FileOutcome,
    /// Declaration counters; all zero unless the file was transformed.
    pub report: RewriteReport,
    /// The failure, for [`FileOutcome::Failed`].
    #[serde(
        serialize_with = "error_message",
        skip_serializing_if = "Option::is_none"
    )]
    pub error: Option<ScanError>,
}

impl FileReport {
    /// Creates a report for a skipped file.
    #[must_use]
    pub fn skipped(path: &Utf8Path, reason: SkipReason) -> Self {
        Self {
            path: path.to_owned(),
            outcome: FileOutcome::Skipped(reason),
            report: RewriteReport::default(),
            error: None,
        }
    }

    /// Creates a report for a failed file.
    #[must_use]
    pub fn failed(path: &Utf8Path, error: ScanError) -> Self {
        Self {
            path: path.to_owned(),
            outcome: FileOutcome::Failed,
            report: RewriteReport::default(),
            error: Some(error),
        }
    }
}

#[allow(clippy::ref_option)]
fn error_message<S: Serializer>(
    error: &Option<ScanError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Result of a run.
#[derive(Debug, Serialize)]
pub struct RunResult {
    /// Final counters.
    pub stats: StatsSnapshot,
    /// One report per considered file, in processing order.
    pub files: Vec<FileReport>,
}

impl RunResult {
    /// Iterates over the failed files.
    pub fn errors(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.outcome.is_error())
    }

    /// Returns the number of files whose content changed.
    #[inline]
    #[must_use]
    pub const fn updated(&self) -> u64 {
        self.stats.updated
    }
}
