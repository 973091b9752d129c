//! Mapping between request paths and (namespace chain, blob id) pairs.
//!
//! `/files/<ns1>/<ns2>/.../<id>` addresses blob `id` inside the nested
//! partition `ns1 -> ns2 -> ...`. Segments are percent-decoded on the way in
//! and percent-encoded on the way out, so [`encode`] is the left inverse of
//! [`decode`] for every handle the resolver can produce.

use crate::Sublevel;

/// First path segment of every blob URL
pub const ROUTE_PREFIX: &str = "files";

/// Browsers ask for this on their own; it is answered with an empty 200
pub const FAVICON_PATH: &str = "/favicon.ico";

/// A decoded blob path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobPath {
    pub id: String,
    /// Outer to inner; empty for the root store
    pub namespaces: Vec<String>,
}

impl BlobPath {
    pub fn new(id: impl Into<String>, namespaces: Vec<String>) -> Self {
        Self {
            id: id.into(),
            namespaces,
        }
    }
}

/// Decode the path component of a request URL.
///
/// Returns `None` for anything that cannot name a blob: a different first
/// segment, no id segment, an empty id, or a segment that is not UTF-8 once
/// percent-decoded. Empty namespace segments are passed through untouched;
/// the resolver decides whether they are acceptable.
pub fn decode(path: &str) -> Option<BlobPath> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let mut segments = path.split('/');

    if segments.next()? != ROUTE_PREFIX {
        return None;
    }

    let rest: Vec<&str> = segments.collect();
    let (id, namespaces) = rest.split_last()?;

    let id = decode_segment(id)?;
    if id.is_empty() {
        return None;
    }

    let namespaces = namespaces
        .iter()
        .map(|segment| decode_segment(segment))
        .collect::<Option<Vec<_>>>()?;

    Some(BlobPath { id, namespaces })
}

/// Canonical path of blob `id` inside `handle`
pub fn encode(handle: &Sublevel, id: &str) -> String {
    let mut names: Vec<&str> = handle.ancestors().collect();
    names.reverse();

    let mut path = format!("/{ROUTE_PREFIX}");
    for segment in names.into_iter().chain(std::iter::once(id)) {
        path.push('/');
        encode_segment(segment, &mut path);
    }
    path
}

/// Percent-encode everything a path segment cannot carry literally.
///
/// Unreserved characters, sub-delimiters, `:` and `@` pass through.
fn encode_segment(segment: &str, out: &mut String) {
    let mut buf = [0u8; 4];
    for ch in segment.chars() {
        if is_segment_char(ch) {
            out.push(ch);
        } else {
            out.push_str(&urlencoding::encode(ch.encode_utf8(&mut buf)));
        }
    }
}

fn is_segment_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(
            ch,
            '-' | '.' | '_' | '~' | '!' | '$' | '&' | '\'' | '(' | ')' | '*' | '+' | ','
                | ';' | '=' | ':' | '@'
        )
}

fn decode_segment(segment: &str) -> Option<String> {
    urlencoding::decode(segment).ok().map(|s| s.into_owned())
}
