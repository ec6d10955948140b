//! Line and indentation queries on the original text.

/// Returns the offset of the first byte of the line containing `offset`.
pub(crate) fn line_start(source: &str, offset: u32) -> u32 {
    let offset = (offset as usize).min(source.len());
    source
        .get(..offset)
        .and_then(|head| head.rfind('\n'))
        .map_or(0, |nl| to_u32(nl + 1))
}

/// Returns the leading whitespace of the line containing `offset`.
pub(crate) fn line_indent(source: &str, offset: u32) -> &str {
    let start = line_start(source, offset) as usize;
    let rest = source.get(start..).unwrap_or_default();
    let len = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    &rest[..len]
}

/// Returns `true` if only whitespace precedes `offset` on its line.
pub(crate) fn starts_line(source: &str, offset: u32) -> bool {
    let start = line_start(source, offset) as usize;
    source
        .get(start..offset as usize)
        .is_some_and(|head| head.trim().is_empty())
}

/// Returns `true` if there is no line break between `a` and `b`.
pub(crate) fn same_line(source: &str, a: u32, b: u32) -> bool {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    source
        .get(lo as usize..hi as usize)
        .is_some_and(|between| !between.contains('\n'))
}

/// Returns the line terminator the file uses, judged by its first line.
pub(crate) fn line_ending(source: &str) -> &'static str {
    match source.find('\n') {
        Some(nl) if source[..nl].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

/// Returns the offset of the line terminator ending the line that contains
/// `offset`, or the end of the text.
pub(crate) fn line_end(source: &str, offset: u32) -> u32 {
    let offset = (offset as usize).min(source.len());
    let end = source
        .get(offset..)
        .and_then(|tail| tail.find('\n'))
        .map_or(source.len(), |nl| offset + nl);
    if source[..end].ends_with('\r') {
        to_u32(end - 1)
    } else {
        to_u32(end)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_u32(n: usize) -> u32 {
    n as u32
}
