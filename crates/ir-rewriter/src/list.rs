//! Appending an element to a brace-delimited list.
//!
//! Object literals, object patterns and named-import lists share one layout
//! rule: a list whose closing brace starts its own line gets the new element
//! on its own line, indented like the last element; any other list gets it
//! inline after the last element.

use ir_core::Span;

use crate::edit::EditSet;
use crate::layout::{line_ending, line_indent, line_start, starts_line};

/// How an empty `{}` list is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EmptyStyle {
    /// `{ item }`
    Inline,
    /// `{` newline, indented `item,`, newline `}`
    Block,
}

/// The parts of a list the append rule needs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BraceList {
    /// The whole list including both braces.
    pub span: Span,
    /// Span of the last element, if any.
    pub last: Option<Span>,
    /// Whether the last element is followed by a comma.
    pub trailing_comma: bool,
}

impl BraceList {
    fn close(self) -> u32 {
        self.span.end.saturating_sub(1)
    }
}

/// Records the edits that append `item` to `list`.
pub(crate) fn append_item(
    source: &str,
    list: BraceList,
    item: &str,
    empty: EmptyStyle,
    indent_unit: &str,
    edits: &mut EditSet,
) {
    let nl = line_ending(source);
    let Some(last) = list.last else {
        let text = match empty {
            EmptyStyle::Inline => format!("{{ {item} }}"),
            EmptyStyle::Block => {
                let indent = line_indent(source, list.span.start);
                format!("{{{nl}{indent}{indent_unit}{item},{nl}{indent}}}")
            }
        };
        edits.replace(list.span, text);
        return;
    };

    let close = list.close();
    if starts_line(source, close) {
        let indent = line_indent(source, last.start);
        if !list.trailing_comma {
            edits.insert(last.end, ",");
        }
        edits.insert(line_start(source, close), format!("{indent}{item},{nl}"));
    } else {
        // Inserting right after the last element keeps any trailing comma last.
        edits.insert(last.end, format!(", {item}"));
    }
}
