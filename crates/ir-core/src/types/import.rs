//! Import clause types.
//!
//! [`ImportClause`] describes an existing `import` statement, with the spans
//! the import augmenter needs to merge a name into it. [`ImportSpec`] describes
//! an import a rewritten file requires.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::location::Span;

/// The syntactic form of an import statement.
///
/// # Examples
///
/// ```
/// use ir_core::ImportKind;
///
/// assert!(ImportKind::Named.accepts_named());
/// assert!(ImportKind::Default.accepts_named());
/// assert!(!ImportKind::Namespace.accepts_named());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ImportKind {
    /// Named imports: `import { Foo, Bar } from '...'`
    Named,

    /// Default import only: `import Foo from '...'`
    Default,

    /// Default plus named imports: `import Foo, { Bar } from '...'`
    DefaultAndNamed,

    /// Namespace import: `import * as Foo from '...'`
    Namespace,

    /// Side-effect import: `import '...'`
    SideEffect,

    /// Type-only import: `import type { Foo } from '...'`
    TypeOnly,
}

impl ImportKind {
    /// Returns `true` if a value name can be merged into this clause.
    ///
    /// Namespace, side-effect and type-only clauses never receive new names.
    #[inline]
    #[must_use]
    pub const fn accepts_named(self) -> bool {
        matches!(self, Self::Named | Self::Default | Self::DefaultAndNamed)
    }
}

/// An `import` statement found at the top level of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportClause {
    /// The module specifier without quotes (`./common-schemas.js`).
    pub module_specifier: String,

    /// Syntactic form of the clause.
    pub kind: ImportKind,

    /// Local names bound by the clause (default, named or namespace).
    pub names: SmallVec<[String; 4]>,

    /// Byte range of the whole statement, including any trailing `;`.
    pub span: Span,

    /// Byte range of the `{ ... }` list, when the clause has one.
    pub named_span: Option<Span>,

    /// Byte range of the last named specifier, when the list is non-empty.
    pub last_named: Option<Span>,

    /// Whether the `{ ... }` list ends with a comma.
    pub trailing_comma: bool,

    /// Byte range of the default binding, when present.
    pub default_span: Option<Span>,

    /// Quote character used around the module specifier.
    pub quote: char,
}

impl ImportClause {
    /// Returns `true` if the clause binds `name`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ir_core::{ImportClause, ImportKind, Span};
    ///
    /// let clause = ImportClause {
    ///     module_specifier: "./common-schemas.js".to_owned(),
    ///     kind: ImportKind::Named,
    ///     names: ["boardIdSchema".to_owned()].into_iter().collect(),
    ///     span: Span::new(0, 54),
    ///     named_span: Some(Span::new(7, 24)),
    ///     last_named: Some(Span::new(9, 22)),
    ///     trailing_comma: false,
    ///     default_span: None,
    ///     quote: '\'',
    /// };
    /// assert!(clause.binds("boardIdSchema"));
    /// assert!(!clause.binds("instanceParameterSchema"));
    /// ```
    #[inline]
    #[must_use]
    pub fn binds(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Returns `true` if the clause imports from `module`.
    #[inline]
    #[must_use]
    pub fn is_from(&self, module: &str) -> bool {
        self.module_specifier == module
    }
}

/// An import a rewritten file needs: one module and the names it must provide.
///
/// Names are kept unique and in insertion order.
///
/// # Examples
///
/// ```
/// use ir_core::ImportSpec;
///
/// let mut spec = ImportSpec::new("./common-schemas.js");
/// assert!(spec.insert("instanceParameterSchema"));
/// assert!(!spec.insert("instanceParameterSchema"));
/// assert_eq!(spec.imported_names.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    /// Module the names come from.
    pub module_specifier: String,

    /// Names to import, unique.
    pub imported_names: SmallVec<[String; 2]>,
}

impl ImportSpec {
    /// Creates an empty import spec for `module`.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module_specifier: module.into(),
            imported_names: SmallVec::new(),
        }
    }

    /// Creates an import spec for a single name.
    #[must_use]
    pub fn single(module: impl Into<String>, name: impl Into<String>) -> Self {
        let mut spec = Self::new(module);
        spec.insert(name);
        spec
    }

    /// Adds a name, returning `false` if it was already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.imported_names.contains(&name) {
            return false;
        }
        self.imported_names.push(name);
        true
    }

    /// Returns `true` if there are no names to import.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.imported_names.is_empty()
    }
}
