//! Error types for the ir-ts-parser crate.
//!
//! - [`ParseError`] covers parser setup and query compilation
//! - [`LocateError`] covers files whose declarations cannot be located

use ir_core::SourceLocation;

/// Errors that can occur while setting up or running the tree-sitter parser.
///
/// # Examples
///
/// ```
/// use ir_ts_parser::ParseError;
///
/// fn describe(err: &ParseError) -> &'static str {
///     match err {
///         ParseError::LanguageInit => "language",
///         ParseError::QueryCompile { .. } => "query",
///         ParseError::Parse => "parse",
///     }
/// }
/// assert_eq!(describe(&ParseError::Parse), "parse");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Failed to set the TypeScript language on the parser.
    #[error("failed to set TypeScript language")]
    LanguageInit,

    /// Failed to compile a tree-sitter query.
    #[error("failed to compile query at offset {offset}: {kind:?}")]
    QueryCompile {
        /// The byte offset in the query string where the error occurred.
        offset: usize,
        /// The underlying query error.
        kind: tree_sitter::QueryError,
    },

    /// The parser returned no tree (cancelled or out of memory).
    #[error("failed to parse source code")]
    Parse,
}

/// Errors that prevent declarations from being located in a file.
#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    /// The parser itself failed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The file contains a syntax error, such as an unclosed delimiter.
    ///
    /// No declarations are produced for a malformed file.
    #[error("malformed source at {location}: {detail}")]
    Malformed {
        /// Position of the first offending node.
        location: SourceLocation,
        /// What the parser found there.
        detail: String,
    },
}

impl LocateError {
    /// Returns `true` if the error describes the file rather than the parser.
    ///
    /// Malformed files are skipped; parser failures affect every file.
    #[inline]
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_init_display() {
        let err = ParseError::LanguageInit;
        assert_eq!(err.to_string(), "failed to set TypeScript language");
    }

    #[test]
    fn test_malformed_display() {
        let err = LocateError::Malformed {
            location: SourceLocation::new(4, 2, 51),
            detail: "missing \"}\"".to_owned(),
        };
        assert_eq!(err.to_string(), "malformed source at 4:2: missing \"}\"");
        assert!(err.is_malformed());
    }

    #[test]
    fn test_parse_error_is_transparent() {
        let err = LocateError::from(ParseError::Parse);
        assert_eq!(err.to_string(), "failed to parse source code");
        assert!(!err.is_malformed());
    }
}
