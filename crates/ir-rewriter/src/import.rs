//! Import augmentation.
//!
//! Names a rewritten file needs are merged into an existing clause for the
//! same module when one can take named imports; otherwise a new clause is
//! added right after the first import (or at the top of the file). Names the
//! file already binds, through an import or a program-level declaration, are
//! never imported again.

use ir_core::{ImportClause, ImportSpec};
use ir_ts_parser::LocatedFile;
use smallvec::SmallVec;
use tracing::debug;

use crate::edit::EditSet;
use crate::layout::{line_end, line_ending};
use crate::list::{BraceList, EmptyStyle, append_item};

/// Records the edits that provide every name in `required`.
///
/// Returns the number of names added.
pub(crate) fn augment(
    source: &str,
    file: &LocatedFile<'_>,
    required: &[ImportSpec],
    indent_unit: &str,
    edits: &mut EditSet,
) -> usize {
    let mut added = 0;
    for spec in required {
        let missing: SmallVec<[&str; 2]> = spec
            .imported_names
            .iter()
            .map(String::as_str)
            .filter(|name| !file.declares(name) && !file.imports.iter().any(|c| c.binds(name)))
            .collect();
        if missing.is_empty() {
            continue;
        }
        let names = missing.join(", ");

        let target = file
            .imports
            .iter()
            .find(|c| c.is_from(&spec.module_specifier) && c.kind.accepts_named());
        match target {
            Some(clause) if merge(source, clause, &names, indent_unit, edits) => {
                debug!(module = %spec.module_specifier, names = %names, "merged import");
            }
            _ => {
                add_clause(source, &file.imports, &spec.module_specifier, &names, edits);
                debug!(module = %spec.module_specifier, names = %names, "added import");
            }
        }
        added += missing.len();
    }
    added
}

fn merge(
    source: &str,
    clause: &ImportClause,
    names: &str,
    indent_unit: &str,
    edits: &mut EditSet,
) -> bool {
    if let Some(span) = clause.named_span {
        let list = BraceList {
            span,
            last: clause.last_named,
            trailing_comma: clause.trailing_comma,
        };
        append_item(source, list, names, EmptyStyle::Inline, indent_unit, edits);
        true
    } else if let Some(default) = clause.default_span {
        edits.insert(default.end, format!(", {{ {names} }}"));
        true
    } else {
        false
    }
}

fn add_clause(
    source: &str,
    imports: &[ImportClause],
    module: &str,
    names: &str,
    edits: &mut EditSet,
) {
    let quote = imports.first().map_or('\'', |c| c.quote);
    let line = format!("import {{ {names} }} from {quote}{module}{quote};");
    let nl = line_ending(source);

    if let Some(first) = imports.first() {
        edits.insert(
            after_trailing_comment(source, first.span.end),
            format!("{nl}{line}"),
        );
    } else if source.starts_with("#!") {
        match source.find('\n') {
            Some(newline) => edits.insert(to_offset(newline + 1), format!("{line}{nl}")),
            None => edits.insert(to_offset(source.len()), format!("{nl}{line}{nl}")),
        }
    } else {
        edits.insert(0, format!("{line}{nl}"));
    }
}

/// Moves `offset` past a `//` comment closing its line, so the comment stays
/// with the statement it annotates.
fn after_trailing_comment(source: &str, offset: u32) -> u32 {
    let end = line_end(source, offset);
    let rest = source.get(offset as usize..end as usize).unwrap_or_default();
    if rest.trim_start().starts_with("//") {
        end
    } else {
        offset
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_offset(n: usize) -> u32 {
    n as u32
}
