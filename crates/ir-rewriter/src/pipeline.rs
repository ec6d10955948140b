//! Per-file transformation pipeline.
//!
//! [`Rewriter::transform`] locates the declarations of one file, records the
//! edits for each of them against the original text, adds the imports the
//! edits need, applies everything in one pass and re-parses the result. The
//! input is never modified; the caller decides whether to persist the output.

use bumpalo::Bump;
use ir_core::{HandlerShape, ImportSpec, RoutingConfig};
use ir_ts_parser::{LocatedFile, NodeId, NodeKind, TsParser};
use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::edit::EditSet;
use crate::error::RewriteError;
use crate::signature::HandlerEdit;
use crate::{call_site, import, schema, signature};

/// Counters describing what a transformation did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteReport {
    /// Schemas that received the spread.
    pub schemas_injected: usize,
    /// Handlers whose signature and body were rewritten.
    pub handlers_rewritten: usize,
    /// Call arguments retargeted to the rest binding.
    pub call_sites_rewritten: usize,
    /// Import names added.
    pub imports_added: usize,
    /// Handlers left unchanged because of their parameter shape.
    pub unsupported_handlers: usize,
    /// Declarations that already carried the marker.
    pub already_injected: usize,
}

impl RewriteReport {
    /// Returns the number of declarations that were rewritten.
    #[inline]
    #[must_use]
    pub const fn rewritten(&self) -> usize {
        self.schemas_injected + self.handlers_rewritten
    }
}

/// The result of transforming one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transform {
    /// The file has no declarations to rewrite.
    NothingToDo,
    /// Every declaration already carries the marker.
    AlreadyInjected,
    /// The rewritten text, which differs from the input.
    Rewritten(String),
}

impl Transform {
    /// Returns the new text if the file changed.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Rewritten(text) => Some(text),
            Self::NothingToDo | Self::AlreadyInjected => None,
        }
    }

    /// Returns `true` if the file changed.
    #[inline]
    #[must_use]
    pub const fn is_rewritten(&self) -> bool {
        matches!(self, Self::Rewritten(_))
    }
}

/// A [`Transform`] with its counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    /// What happened to the text.
    pub transform: Transform,
    /// What happened to the declarations.
    pub report: RewriteReport,
}

/// Applies the instance-routing rewrites to source text.
///
/// # Examples
///
/// ```
/// use ir_core::RoutingConfig;
/// use ir_rewriter::{Rewriter, Transform};
/// use ir_ts_parser::{Bump, TsParser};
///
/// let routing = RoutingConfig::default();
/// let rewriter = Rewriter::new(&routing);
/// let mut parser = TsParser::new()?;
/// let bump = Bump::new();
///
/// let source = "const aSchema = z.object({ a: z.string() });\n";
/// let output = rewriter.transform(&mut parser, &bump, source)?;
/// assert_eq!(output.report.schemas_injected, 1);
///
/// let again = rewriter.transform(&mut parser, &bump, output.transform.text().unwrap_or(source))?;
/// assert_eq!(again.transform, Transform::AlreadyInjected);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Rewriter<'cfg> {
    routing: &'cfg RoutingConfig,
}

impl<'cfg> Rewriter<'cfg> {
    /// Creates a rewriter for the given routing settings.
    #[must_use]
    pub const fn new(routing: &'cfg RoutingConfig) -> Self {
        Self { routing }
    }

    /// Returns the routing settings.
    #[must_use]
    pub const fn routing(&self) -> &'cfg RoutingConfig {
        self.routing
    }

    /// Transforms one file's text.
    ///
    /// `parser` must already be set to the file's dialect. `bump` holds the
    /// declaration arena for the duration of the call.
    ///
    /// # Errors
    ///
    /// - [`RewriteError::Locate`] if the input does not parse
    /// - [`RewriteError::OverlappingEdits`] or [`RewriteError::EditOutOfBounds`]
    ///   if the recorded edits conflict
    /// - [`RewriteError::Verification`] if the output does not parse
    pub fn transform(
        &self,
        parser: &mut TsParser,
        bump: &Bump,
        source: &str,
    ) -> Result<TransformOutput, RewriteError> {
        let file = parser.locate(source, self.routing, bump)?;
        let mut report = RewriteReport::default();

        if file.is_empty() {
            return Ok(TransformOutput {
                transform: Transform::NothingToDo,
                report,
            });
        }
        if file.all_injected() {
            report.already_injected = file.arena.roots().count();
            return Ok(TransformOutput {
                transform: Transform::AlreadyInjected,
                report,
            });
        }

        let mut edits = EditSet::new();
        for root in file.arena.roots() {
            self.rewrite_declaration(source, &file, root, &mut edits, &mut report);
        }

        let required = self.required_imports(&report);
        report.imports_added = import::augment(
            source,
            &file,
            &required,
            &self.routing.indent_unit,
            &mut edits,
        );

        if edits.is_empty() {
            return Ok(TransformOutput {
                transform: Transform::NothingToDo,
                report,
            });
        }

        let text = edits.apply(source)?;
        if text == source {
            return Ok(TransformOutput {
                transform: Transform::NothingToDo,
                report,
            });
        }
        parser.check(&text).map_err(RewriteError::Verification)?;

        debug!(
            schemas = report.schemas_injected,
            handlers = report.handlers_rewritten,
            call_sites = report.call_sites_rewritten,
            imports = report.imports_added,
            "transformed file"
        );
        Ok(TransformOutput {
            transform: Transform::Rewritten(text),
            report,
        })
    }

    fn rewrite_declaration(
        &self,
        source: &str,
        file: &LocatedFile<'_>,
        root: NodeId,
        edits: &mut EditSet,
        report: &mut RewriteReport,
    ) {
        let arena = &file.arena;
        match arena.node(root).kind {
            NodeKind::Schema => {
                if schema::inject(source, arena, root, self.routing, edits) {
                    report.schemas_injected += 1;
                } else {
                    report.already_injected += 1;
                }
            }
            NodeKind::Handler => match signature::rewrite(source, arena, root, self.routing, edits)
            {
                HandlerEdit::AlreadyInjected => report.already_injected += 1,
                HandlerEdit::Unsupported => {
                    let node = arena.node(root);
                    warn!(
                        name = node.name_str(),
                        line = node.location.line,
                        "unsupported handler parameters, left unchanged"
                    );
                    report.unsupported_handlers += 1;
                }
                HandlerEdit::Rewritten(shape) => {
                    report.handlers_rewritten += 1;
                    if shape == HandlerShape::Positional {
                        report.call_sites_rewritten +=
                            call_site::retarget(arena, root, self.routing, edits);
                    }
                }
            },
            _ => {}
        }
    }

    fn required_imports(&self, report: &RewriteReport) -> SmallVec<[ImportSpec; 2]> {
        let routing = self.routing;
        let mut required: SmallVec<[ImportSpec; 2]> = SmallVec::new();
        let mut require = |module: &str, name: &str| {
            match required.iter_mut().find(|s| s.module_specifier == module) {
                Some(spec) => {
                    spec.insert(name);
                }
                None => required.push(ImportSpec::single(module, name)),
            }
        };

        if report.schemas_injected > 0 {
            require(&routing.spread_module, &routing.spread_symbol);
        }
        if report.handlers_rewritten > 0 {
            if let Some(module) = routing.resolver_module.as_deref() {
                require(module, &routing.resolver_fn);
            }
        }
        required
    }
}
