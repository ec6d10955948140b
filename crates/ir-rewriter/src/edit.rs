//! Text edits against a file's original content.
//!
//! Every rewriter records its changes as [`Edit`]s whose spans refer to the
//! original text. [`EditSet::apply`] validates that no two edits touch the
//! same bytes and applies them right-to-left, so earlier offsets stay valid
//! while later ones are rewritten.
//!
//! Insertions at the same offset keep the order in which they were recorded.

use ir_core::Span;

use crate::error::RewriteError;

/// A single replacement of `span` with `replacement`.
///
/// An empty span is a pure insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Bytes of the original text being replaced.
    pub span: Span,

    /// Text that takes their place.
    pub replacement: String,

    seq: u32,
}

/// An ordered collection of edits for one file.
///
/// # Examples
///
/// ```
/// use ir_core::Span;
/// use ir_rewriter::EditSet;
///
/// let mut edits = EditSet::new();
/// edits.insert(13, ", b");
/// edits.replace(Span::new(0, 5), "let");
///
/// let out = edits.apply("const x = { a };")?;
/// assert_eq!(out, "let x = { a, b };");
/// # Ok::<(), ir_rewriter::RewriteError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EditSet {
    edits: Vec<Edit>,
}

impl EditSet {
    /// Creates an empty edit set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an insertion at `offset`.
    pub fn insert(&mut self, offset: u32, text: impl Into<String>) {
        self.replace(Span::point(offset), text);
    }

    /// Records a replacement of `span`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn replace(&mut self, span: Span, text: impl Into<String>) {
        let seq = self.edits.len() as u32;
        self.edits.push(Edit {
            span,
            replacement: text.into(),
            seq,
        });
    }

    /// Returns the number of recorded edits.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Returns `true` if no edits were recorded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Iterates over the edits in recording order.
    pub fn iter(&self) -> impl Iterator<Item = &Edit> {
        self.edits.iter()
    }

    /// Applies every edit to `source` and returns the new text.
    ///
    /// # Errors
    ///
    /// - [`RewriteError::EditOutOfBounds`] if a span is not a valid range of
    ///   `source`
    /// - [`RewriteError::OverlappingEdits`] if two edits touch the same bytes
    pub fn apply(mut self, source: &str) -> Result<String, RewriteError> {
        self.edits
            .sort_by_key(|e| (e.span.start, e.span.end, e.seq));

        let mut previous: Option<Span> = None;
        for edit in &self.edits {
            let range = edit.span.range();
            if range.end > source.len()
                || !source.is_char_boundary(range.start)
                || !source.is_char_boundary(range.end)
            {
                return Err(RewriteError::EditOutOfBounds {
                    span: edit.span,
                    len: source.len(),
                });
            }
            if let Some(prev) = previous {
                if prev.end > edit.span.start {
                    return Err(RewriteError::OverlappingEdits {
                        first: prev,
                        second: edit.span,
                    });
                }
            }
            previous = Some(edit.span);
        }

        let growth: usize = self.edits.iter().map(|e| e.replacement.len()).sum();
        let mut text = String::with_capacity(source.len() + growth);
        text.push_str(source);
        for edit in self.edits.iter().rev() {
            text.replace_range(edit.span.range(), &edit.replacement);
        }
        Ok(text)
    }
}
