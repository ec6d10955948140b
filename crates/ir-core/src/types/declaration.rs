//! Located declarations.

use serde::{Deserialize, Serialize};

use super::location::{SourceLocation, Span};

/// The two declaration shapes the injector rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    /// A `z.object({ ... })` schema bound to a `...Schema` constant.
    Schema,

    /// An `async` arrow function registered as a request handler.
    Handler,
}

impl DeclarationKind {
    /// Returns a lowercase label for logs and summaries.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Handler => "handler",
        }
    }
}

impl std::fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A schema or handler found in a source file.
///
/// `span` always satisfies `start < end <= len(text)`; declarations are never
/// built for text whose nesting does not close.
///
/// # Examples
///
/// ```
/// use ir_core::{Declaration, DeclarationKind, SourceLocation, Span};
///
/// let decl = Declaration {
///     name: "getBoardSchema".to_owned(),
///     kind: DeclarationKind::Schema,
///     span: Span::new(13, 48),
///     location: SourceLocation::new(1, 13, 13),
///     already_injected: false,
/// };
/// assert!(decl.needs_injection());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Schema constant name, handler key or registered tool name.
    pub name: String,

    /// Which shape this declaration has.
    pub kind: DeclarationKind,

    /// Byte range of the whole declaration.
    pub span: Span,

    /// Position of the declaration's first byte.
    pub location: SourceLocation,

    /// Whether the injection marker is already present.
    pub already_injected: bool,
}

impl Declaration {
    /// Returns `true` if this declaration still lacks the injection marker.
    #[inline]
    #[must_use]
    pub const fn needs_injection(&self) -> bool {
        !self.already_injected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_label() {
        assert_eq!(DeclarationKind::Schema.to_string(), "schema");
        assert_eq!(DeclarationKind::Handler.label(), "handler");
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&DeclarationKind::Handler).expect("json");
        assert_eq!(json, r#""handler""#);
    }

    #[test]
    fn test_needs_injection() {
        let mut decl = Declaration {
            name: "listCards".to_owned(),
            kind: DeclarationKind::Handler,
            span: Span::new(0, 20),
            location: SourceLocation::new(1, 0, 0),
            already_injected: true,
        };
        assert!(!decl.needs_injection());
        decl.already_injected = false;
        assert!(decl.needs_injection());
    }
}
