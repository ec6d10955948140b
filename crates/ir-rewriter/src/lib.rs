//! Idempotent instance-routing rewrites.
//!
//! Given the declarations located by `ir-ts-parser`, this crate computes the
//! text edits that make a file route through a per-instance client:
//!
//! - schema objects gain `...instanceParameterSchema`
//! - handlers gain the `instance` field and resolve their client with
//!   `getClientForInstance`
//! - positional handlers pass the rest binding to `client.*` calls
//! - the spread symbol (and optionally the resolver) is imported
//!
//! Every edit refers to the original text; [`EditSet`] applies them in one
//! pass. A file whose declarations already carry the marker is left alone,
//! so running the rewriter twice gives the same text as running it once.
//!
//! ```
//! use ir_core::RoutingConfig;
//! use ir_rewriter::Rewriter;
//! use ir_ts_parser::{Bump, TsParser};
//!
//! let routing = RoutingConfig::default();
//! let mut parser = TsParser::new()?;
//! let bump = Bump::new();
//!
//! let source = "const h = { ping: async ({ id }) => { return id; } };\n";
//! let output = Rewriter::new(&routing).transform(&mut parser, &bump, source)?;
//! assert_eq!(
//!     output.transform.text(),
//!     Some("const h = { ping: async ({ id, instance }: any) => { const client = await getClientForInstance(clientOrFactory, instance); return id; } };\n"),
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod call_site;
pub mod edit;
pub mod error;
mod import;
mod layout;
mod list;
pub mod pipeline;
mod schema;
mod signature;

pub use edit::{Edit, EditSet};
pub use error::RewriteError;
pub use pipeline::{RewriteReport, Rewriter, Transform, TransformOutput};
