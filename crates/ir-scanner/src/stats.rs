//! Run statistics with atomic counters.
//!
//! [`RunStats`] is shared by the worker threads of a run; [`StatsSnapshot`]
//! is the copied, serializable view used for the summary.
//!
//! # Thread Safety
//!
//! All counters use [`AtomicU64`] with [`Relaxed`](std::sync::atomic::Ordering::Relaxed)
//! ordering. The numbers are only read after the parallel section ends or for
//! display, so no stronger ordering is needed.
//!
//! # Examples
//!
//! ```
//! use ir_core::FileOutcome;
//! use ir_scanner::RunStats;
//!
//! let stats = RunStats::new();
//! stats.record_outcome(FileOutcome::Updated);
//! stats.record_outcome(FileOutcome::Unchanged);
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.files, 2);
//! assert_eq!(snapshot.updated, 1);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use ir_core::FileOutcome;
use ir_rewriter::RewriteReport;
use serde::{Deserialize, Serialize};

/// Atomic counters for one run.
#[derive(Debug, Default)]
pub struct RunStats {
    files: AtomicU64,
    updated: AtomicU64,
    unchanged: AtomicU64,
    skipped: AtomicU64,
    errors: AtomicU64,
    schemas_injected: AtomicU64,
    handlers_rewritten: AtomicU64,
    call_sites_rewritten: AtomicU64,
    imports_added: AtomicU64,
    unsupported_handlers: AtomicU64,
}

impl RunStats {
    /// Creates a new [`RunStats`] with all counters at zero.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one processed file by its outcome.
    pub fn record_outcome(&self, outcome: FileOutcome) {
        self.files.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            FileOutcome::Updated => &self.updated,
            FileOutcome::Unchanged => &self.unchanged,
            FileOutcome::Skipped(_) => &self.skipped,
            FileOutcome::Failed => &self.errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds the declaration counters of one rewritten file.
    pub fn record_report(&self, report: &RewriteReport) {
        let add = |counter: &AtomicU64, n: usize| {
            counter.fetch_add(n as u64, Ordering::Relaxed);
        };
        add(&self.schemas_injected, report.schemas_injected);
        add(&self.handlers_rewritten, report.handlers_rewritten);
        add(&self.call_sites_rewritten, report.call_sites_rewritten);
        add(&self.imports_added, report.imports_added);
        add(&self.unsupported_handlers, report.unsupported_handlers);
    }

    /// Returns a point-in-time snapshot of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            files: self.files.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            unchanged: self.unchanged.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            schemas_injected: self.schemas_injected.load(Ordering::Relaxed),
            handlers_rewritten: self.handlers_rewritten.load(Ordering::Relaxed),
            call_sites_rewritten: self.call_sites_rewritten.load(Ordering::Relaxed),
            imports_added: self.imports_added.load(Ordering::Relaxed),
            unsupported_handlers: self.unsupported_handlers.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`RunStats`].
///
/// The [`Display`](fmt::Display) impl renders the run summary:
///
/// ```
/// use ir_scanner::StatsSnapshot;
///
/// let snap = StatsSnapshot {
///     files: 3,
///     updated: 2,
///     unchanged: 1,
///     schemas_injected: 4,
///     ..StatsSnapshot::default()
/// };
/// assert!(snap.to_string().starts_with("Files: 3 (updated 2, unchanged 1, skipped 0, errors 0)"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Files considered, including skipped and failed ones.
    pub files: u64,
    /// Files whose content changed.
    pub updated: u64,
    /// Files that needed no change.
    pub unchanged: u64,
    /// Files skipped (excluded, missing, already injected, cancelled).
    pub skipped: u64,
    /// Files that failed.
    pub errors: u64,
    /// Schemas that received the spread.
    pub schemas_injected: u64,
    /// Handlers rewritten.
    pub handlers_rewritten: u64,
    /// Call arguments retargeted.
    pub call_sites_rewritten: u64,
    /// Import names added.
    pub imports_added: u64,
    /// Handlers left alone because of their parameter shape.
    pub unsupported_handlers: u64,
}

impl StatsSnapshot {
    /// Returns `true` if any file failed.
    #[inline]
    #[must_use]
    pub const fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Files: {} (updated {}, unchanged {}, skipped {}, errors {})",
            self.files, self.updated, self.unchanged, self.skipped, self.errors
        )?;
        write!(
            f,
            "Schemas injected: {}, handlers rewritten: {}, call sites rewritten: {}, imports added: {}",
            self.schemas_injected,
            self.handlers_rewritten,
            self.call_sites_rewritten,
            self.imports_added
        )?;
        if self.unsupported_handlers > 0 {
            write!(
                f,
                "\nUnsupported handlers left unchanged: {}",
                self.unsupported_handlers
            )?;
        }
        Ok(())
    }
}
