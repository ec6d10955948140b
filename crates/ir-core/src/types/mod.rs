//! Domain types shared by the locator, the rewriters and the orchestrator.
//!
//! # Module Organization
//!
//! - [`declaration`] - Located schema and handler declarations
//! - [`import`] - Import clauses and required imports
//! - [`location`] - Source positions and byte spans
//! - [`outcome`] - Per-file results of a run
//! - [`signature`] - Handler parameter shapes
//!
//! All public types are also re-exported at the crate root:
//!
//! ```
//! use ir_core::{Declaration, DeclarationKind, FileOutcome, Span};
//! ```

mod declaration;
mod import;
mod location;
mod outcome;
mod signature;

pub use declaration::{Declaration, DeclarationKind};
pub use import::{ImportClause, ImportKind, ImportSpec};
pub use location::{SourceLocation, Span};
pub use outcome::{FileOutcome, SkipReason};
pub use signature::{HandlerShape, HandlerSignature};
