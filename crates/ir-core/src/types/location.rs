//! Source positions and byte spans.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A position within a source file.
///
/// # Field Conventions
///
/// - `line` is 1-indexed (first line is line 1)
/// - `column` is 0-indexed (first character is column 0)
/// - `byte_offset` is the absolute byte position from the start of the file
///
/// # Examples
///
/// ```
/// use ir_core::SourceLocation;
///
/// let loc = SourceLocation::new(10, 5, 245);
/// assert_eq!(loc.to_string(), "10:5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number (1-indexed).
    pub line: u32,

    /// Column number (0-indexed, UTF-8 byte offset within the line).
    pub column: u32,

    /// Absolute byte offset from the start of the file.
    pub byte_offset: u32,
}

impl SourceLocation {
    /// Creates a new source location.
    #[inline]
    #[must_use]
    pub const fn new(line: u32, column: u32, byte_offset: u32) -> Self {
        Self {
            line,
            column,
            byte_offset,
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open byte range `start..end` into a file's original text.
///
/// # Examples
///
/// ```
/// use ir_core::Span;
///
/// let span = Span::new(4, 10);
/// assert_eq!(span.len(), 6);
/// assert!(span.contains(4));
/// assert!(!span.contains(10));
/// assert_eq!(&"let x = 1;"[span.range()], "x = 1;");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// First byte of the range.
    pub start: u32,

    /// One past the last byte of the range.
    pub end: u32,
}

impl Span {
    /// Creates a new span. `end` is clamped to be at least `start`.
    #[inline]
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        let end = if end < start { start } else { end };
        Self { start, end }
    }

    /// Creates an empty span at `offset`, used for pure insertions.
    #[inline]
    #[must_use]
    pub const fn point(offset: u32) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Returns the length of the span in bytes.
    #[inline]
    #[must_use]
    pub const fn len(self) -> u32 {
        self.end - self.start
    }

    /// Returns `true` if the span covers no bytes.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Returns `true` if `offset` lies inside the span.
    #[inline]
    #[must_use]
    pub const fn contains(self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Returns `true` if `other` lies entirely inside this span.
    #[inline]
    #[must_use]
    pub const fn encloses(self, other: Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns `true` if the two spans share at least one byte.
    #[inline]
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns the span as a `usize` range for slicing.
    #[inline]
    #[must_use]
    pub const fn range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_display() {
        assert_eq!(SourceLocation::new(3, 14, 40).to_string(), "3:14");
        assert_eq!(SourceLocation::default().line, 0);
    }

    #[test]
    fn test_span_new_clamps() {
        let span = Span::new(10, 4);
        assert_eq!(span.start, 10);
        assert!(span.is_empty());
    }

    #[test]
    fn test_span_overlaps() {
        let a = Span::new(0, 5);
        assert!(a.overlaps(Span::new(4, 8)));
        assert!(!a.overlaps(Span::new(5, 8)));
        assert!(!a.overlaps(Span::point(5)));
        assert!(a.encloses(Span::new(1, 5)));
        assert!(!a.encloses(Span::new(1, 6)));
    }

    #[test]
    fn test_span_serialization() {
        let span = Span::new(2, 9);
        let json = serde_json::to_string(&span).expect("json");
        assert_eq!(json, r#"{"start":2,"end":9}"#);
        let parsed: Span = serde_json::from_str(&json).expect("json");
        assert_eq!(parsed, span);
    }
}
