//! Per-file results of a run.

use serde::{Deserialize, Serialize};

/// Why a file was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The file name is on the exclusion list.
    Excluded,

    /// An explicitly requested file does not exist.
    NotFound,

    /// Every declaration in the file already carries the injection marker.
    AlreadyInjected,

    /// The run was cancelled before the file was started.
    Cancelled,
}

impl SkipReason {
    /// Returns a human-readable description.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Excluded => "excluded",
            Self::NotFound => "not found",
            Self::AlreadyInjected => "already injected",
            Self::Cancelled => "cancelled",
        }
    }
}

/// The result of processing one file.
///
/// # Examples
///
/// ```
/// use ir_core::{FileOutcome, SkipReason};
///
/// assert!(FileOutcome::Updated.is_changed());
/// assert!(!FileOutcome::Skipped(SkipReason::Excluded).is_changed());
/// assert!(FileOutcome::Failed.is_error());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    /// The file was rewritten (or would be, in a dry run).
    Updated,

    /// The file was processed and its content did not change.
    Unchanged,

    /// The file was not processed.
    Skipped(SkipReason),

    /// Processing failed; the file was left untouched.
    Failed,
}

impl FileOutcome {
    /// Returns `true` if the file's content changed.
    #[inline]
    #[must_use]
    pub const fn is_changed(self) -> bool {
        matches!(self, Self::Updated)
    }

    /// Returns `true` if processing failed.
    #[inline]
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns a short label for progress output.
    ///
    /// # Examples
    ///
    /// ```
    /// use ir_core::{FileOutcome, SkipReason};
    ///
    /// assert_eq!(FileOutcome::Updated.label(), "updated");
    /// assert_eq!(FileOutcome::Skipped(SkipReason::NotFound).label(), "not found");
    /// ```
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
            Self::Skipped(reason) => reason.label(),
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
