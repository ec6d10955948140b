//! Error types for the ir-rewriter crate.

use ir_core::Span;
use ir_ts_parser::LocateError;

/// Errors that leave a file untouched.
///
/// # Examples
///
/// ```
/// use ir_core::Span;
/// use ir_rewriter::RewriteError;
///
/// let err = RewriteError::OverlappingEdits {
///     first: Span::new(10, 20),
///     second: Span::new(15, 15),
/// };
/// assert!(err.to_string().contains("10..20"));
/// assert!(!err.is_malformed_input());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// Declarations could not be located (malformed file or parser failure).
    #[error(transparent)]
    Locate(#[from] LocateError),

    /// Two edits touch the same bytes.
    #[error("overlapping edits at {first} and {second}")]
    OverlappingEdits {
        /// The earlier edit.
        first: Span,
        /// The edit that starts inside it.
        second: Span,
    },

    /// An edit reaches past the end of the text or splits a character.
    #[error("edit {span} is outside the {len}-byte source")]
    EditOutOfBounds {
        /// The offending edit.
        span: Span,
        /// Length of the source text.
        len: usize,
    },

    /// The rewritten text no longer parses.
    #[error("rewritten source does not parse: {0}")]
    Verification(#[source] LocateError),
}

impl RewriteError {
    /// Returns `true` if the input file itself was malformed.
    #[inline]
    #[must_use]
    pub const fn is_malformed_input(&self) -> bool {
        matches!(self, Self::Locate(LocateError::Malformed { .. }))
    }

    /// Returns `true` if the error affects only the current file.
    ///
    /// Parser initialization and query failures affect every file.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Locate(LocateError::Parse(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir_core::SourceLocation;
    use ir_ts_parser::ParseError;

    #[test]
    fn test_malformed_input_classification() {
        let err = RewriteError::from(LocateError::Malformed {
            location: SourceLocation::new(2, 0, 10),
            detail: "missing \"}\"".to_owned(),
        });
        assert!(err.is_malformed_input());
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("2:0"));
    }

    #[test]
    fn test_parser_failure_is_not_recoverable() {
        let err = RewriteError::from(LocateError::Parse(ParseError::LanguageInit));
        assert!(!err.is_recoverable());
        assert!(!err.is_malformed_input());
    }

    #[test]
    fn test_verification_display() {
        let err = RewriteError::Verification(LocateError::Malformed {
            location: SourceLocation::new(1, 4, 4),
            detail: "unexpected \",\"".to_owned(),
        });
        assert!(err.to_string().starts_with("rewritten source does not parse"));
        assert!(err.is_recoverable());
    }
}
