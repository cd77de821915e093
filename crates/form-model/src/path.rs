//! Structural paths.
//!
//! A path is a list of named segments joined by `.`. A row of a repeating
//! group is addressed by appending the zero-based row index as its own
//! segment, so nesting composes: `variants.2.images.0.image`.
//!
//! The empty path is the root of the form. It never holds a field itself;
//! top-level fields are its children.

use std::fmt;

use crate::error::{FormError, Result};

/// Wildcard used in place of row indices when a path is reduced to its shape.
pub const ROW_WILDCARD: &str = "*";

/// A canonical, immutable structural path.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(String);

/// One segment of a [`Path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// A field name.
    Name(&'a str),
    /// A zero-based row index inside a repeating group.
    Index(usize),
}

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Name(name) => f.write_str(name),
            Segment::Index(index) => write!(f, "{index}"),
        }
    }
}

impl Path {
    /// The root path (empty string).
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Parse and canonicalize a path. Same as [`normalize`].
    pub fn new(raw: &str) -> Result<Self> {
        normalize(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the segments from the outermost inwards.
    pub fn segments(&self) -> impl Iterator<Item = Segment<'_>> {
        self.0
            .split('.')
            .filter(|raw| !raw.is_empty())
            .map(classify_canonical)
    }

    /// Number of segments (0 for the root).
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.0.split('.').count()
        }
    }

    pub fn last_segment(&self) -> Option<Segment<'_>> {
        self.segments().last()
    }

    /// Row index if the last segment addresses a row.
    pub fn row_index(&self) -> Option<usize> {
        match self.last_segment() {
            Some(Segment::Index(index)) => Some(index),
            _ => None,
        }
    }

    /// Field name if the last segment is named.
    pub fn name(&self) -> Option<&str> {
        match self.last_segment() {
            Some(Segment::Name(name)) => Some(name),
            _ => None,
        }
    }

    pub fn parent(&self) -> Option<Path> {
        parent_of(self)
    }

    /// Append a named segment, validating it first.
    pub fn child(&self, name: &str) -> Result<Path> {
        Ok(self.join(&FieldName::new(name)?))
    }

    /// Append an already validated name.
    pub fn join(&self, name: &FieldName) -> Path {
        if self.is_root() {
            Path(name.0.clone())
        } else {
            Path(format!("{}.{}", self.0, name.0))
        }
    }

    /// Append a row index segment.
    pub fn row(&self, index: usize) -> Path {
        if self.is_root() {
            // Rows only exist below a named group; callers never hold a
            // row of the root, but keep the output canonical regardless.
            return Path(index.to_string());
        }
        Path(format!("{}.{}", self.0, index))
    }

    /// The structural shape: every row index replaced by `*`.
    pub fn shape(&self) -> String {
        shape_of(self)
    }

    pub fn is_descendant_of(&self, ancestor: &Path) -> bool {
        is_descendant_of(self, ancestor)
    }

    /// `self` equals `other` or lies beneath it.
    pub fn is_within(&self, other: &Path) -> bool {
        self == other || is_descendant_of(self, other)
    }
}

/// A single validated field-name segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldName(String);

impl FieldName {
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FormError::malformed(raw, "empty segment"));
        }
        if is_index(trimmed) {
            return Err(FormError::malformed(raw, "field name cannot be a row index"));
        }
        check_name(trimmed).map_err(|reason| FormError::malformed(raw, reason))?;
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Path {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self> {
        normalize(s)
    }
}

impl serde::Serialize for Path {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Path {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        normalize(&raw).map_err(serde::de::Error::custom)
    }
}

fn classify_canonical(raw: &str) -> Segment<'_> {
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        // Canonical paths only contain indices that already parsed.
        Segment::Index(raw.parse().unwrap_or(usize::MAX))
    } else {
        Segment::Name(raw)
    }
}

/// Parse a raw path string into its canonical form.
///
/// Accepts surrounding whitespace and bracketed row indices
/// (`tags[0].value`), and emits the dotted form (`tags.0.value`).
pub fn normalize(raw: &str) -> Result<Path> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Path::root());
    }

    let mut segments: Vec<String> = Vec::new();
    let mut previous_was_index = false;

    for token in trimmed.split('.') {
        let (head, indices) = split_brackets(token).map_err(|reason| FormError::malformed(raw, reason))?;

        if head.is_empty() {
            return Err(FormError::malformed(raw, "empty segment"));
        }

        for part in std::iter::once(head).chain(indices) {
            if is_index(part) {
                if segments.is_empty() {
                    return Err(FormError::malformed(raw, "path cannot start with a row index"));
                }
                if previous_was_index {
                    return Err(FormError::malformed(
                        raw,
                        "row index must follow a named segment",
                    ));
                }
                let index = parse_index(part).map_err(|reason| FormError::malformed(raw, reason))?;
                segments.push(index.to_string());
                previous_was_index = true;
            } else {
                check_name(part).map_err(|reason| FormError::malformed(raw, reason))?;
                segments.push(part.to_string());
                previous_was_index = false;
            }
        }
    }

    Ok(Path(segments.join(".")))
}

fn split_brackets(token: &str) -> std::result::Result<(&str, Vec<&str>), String> {
    let Some(open) = token.find('[') else {
        return Ok((token, Vec::new()));
    };
    let head = &token[..open];
    let mut rest = &token[open..];
    let mut indices = Vec::new();
    while !rest.is_empty() {
        let Some(inner) = rest.strip_prefix('[') else {
            return Err(format!("unexpected text after bracket index: '{rest}'"));
        };
        let Some(close) = inner.find(']') else {
            return Err("unclosed bracket".to_string());
        };
        let index = &inner[..close];
        if !is_index(index) {
            return Err(format!("bracket must contain a row index, found '{index}'"));
        }
        indices.push(index);
        rest = &inner[close + 1..];
    }
    Ok((head, indices))
}

fn is_index(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

fn parse_index(part: &str) -> std::result::Result<usize, String> {
    if part.len() > 1 && part.starts_with('0') {
        return Err(format!("row index '{part}' has a leading zero"));
    }
    part.parse::<usize>()
        .map_err(|_| format!("row index '{part}' is out of range"))
}

fn check_name(part: &str) -> std::result::Result<(), String> {
    if let Some(bad) = part
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '.' | '[' | ']' | '*'))
    {
        return Err(format!("invalid character {bad:?} in segment '{part}'"));
    }
    Ok(())
}

/// Parent path. `None` only for the root; top-level fields have the root as
/// their parent.
pub fn parent_of(path: &Path) -> Option<Path> {
    if path.is_root() {
        return None;
    }
    match path.0.rfind('.') {
        Some(pos) => Some(Path(path.0[..pos].to_string())),
        None => Some(Path::root()),
    }
}

/// True if `path` lies strictly beneath `ancestor`.
pub fn is_descendant_of(path: &Path, ancestor: &Path) -> bool {
    if ancestor.is_root() {
        return !path.is_root();
    }
    path.0.len() > ancestor.0.len()
        && path.0.starts_with(&ancestor.0)
        && path.0.as_bytes()[ancestor.0.len()] == b'.'
}

/// Rewrite the row index of `group_path.old_index` to `new_index`.
///
/// Only the one index segment directly under `group_path` changes; further
/// nested row indices are left alone. Paths outside that row are returned
/// unchanged.
pub fn rewrite_row_index(path: &Path, group_path: &Path, old_index: usize, new_index: usize) -> Path {
    let row = group_path.row(old_index);
    if !path.is_within(&row) {
        return path.clone();
    }
    let position = group_path.depth();
    let rewritten: Vec<String> = path
        .0
        .split('.')
        .enumerate()
        .map(|(i, segment)| {
            if i == position {
                new_index.to_string()
            } else {
                segment.to_string()
            }
        })
        .collect();
    Path(rewritten.join("."))
}

/// Structural shape of a path (`variants.*.images.*.image`).
pub fn shape_of(path: &Path) -> String {
    path.segments()
        .map(|segment| match segment {
            Segment::Name(name) => name.to_string(),
            Segment::Index(_) => ROW_WILDCARD.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(raw: &str) -> Path {
        normalize(raw).unwrap()
    }

    #[test]
    fn normalize_accepts_dotted_and_bracketed_forms() {
        assert_eq!(p("variants.2.images.0.image").as_str(), "variants.2.images.0.image");
        assert_eq!(p("variants[2].images[0].image").as_str(), "variants.2.images.0.image");
        assert_eq!(p("  name  ").as_str(), "name");
        assert!(p("").is_root());
    }

    #[test]
    fn normalize_rejects_bad_syntax() {
        for raw in ["a..b", ".a", "a.", "0.a", "a.01", "a.0.1", "a b", "a[x]", "a[0", "a*", "a.[0]"] {
            let err = normalize(raw).unwrap_err();
            assert!(
                matches!(err, FormError::MalformedPath { .. }),
                "{raw} should be malformed"
            );
        }
    }

    #[test]
    fn parent_of_walks_up_to_root() {
        assert_eq!(parent_of(&p("tags.0.value")), Some(p("tags.0")));
        assert_eq!(parent_of(&p("tags.0")), Some(p("tags")));
        assert_eq!(parent_of(&p("tags")), Some(Path::root()));
        assert_eq!(parent_of(&Path::root()), None);
    }

    #[test]
    fn descendant_requires_segment_boundary() {
        assert!(is_descendant_of(&p("tags.0.value"), &p("tags")));
        assert!(is_descendant_of(&p("tags.0"), &p("tags")));
        assert!(!is_descendant_of(&p("tagsx.0"), &p("tags")));
        assert!(!is_descendant_of(&p("tags"), &p("tags")));
        assert!(is_descendant_of(&p("tags"), &Path::root()));
        assert!(!is_descendant_of(&Path::root(), &Path::root()));
    }

    #[test]
    fn rewrite_touches_only_the_group_index() {
        let group = p("variants.2.images");
        assert_eq!(
            rewrite_row_index(&p("variants.2.images.0.image"), &group, 0, 3),
            p("variants.2.images.3.image")
        );
        assert_eq!(
            rewrite_row_index(&p("variants.2.images.1.image"), &group, 0, 3),
            p("variants.2.images.1.image")
        );
        assert_eq!(
            rewrite_row_index(&p("variants.2.images.0.tags.0"), &group, 0, 1),
            p("variants.2.images.1.tags.0")
        );
        assert_eq!(
            rewrite_row_index(&p("variants.2.images.0.tags.0"), &p("variants"), 2, 0),
            p("variants.0.images.0.tags.0")
        );
    }

    #[test]
    fn shape_replaces_indices() {
        assert_eq!(p("variants.2.images.0.image").shape(), "variants.*.images.*.image");
        assert_eq!(Path::root().shape(), "");
    }

    #[test]
    fn child_and_row_compose() {
        let group = p("tags");
        let row = group.row(3);
        assert_eq!(row.as_str(), "tags.3");
        assert_eq!(row.child("value").unwrap().as_str(), "tags.3.value");
        assert_eq!(Path::root().child("name").unwrap().as_str(), "name");
        assert!(row.child("a.b").is_err());
        assert!(row.child("7").is_err());
        assert!(FieldName::new("").is_err());
        assert_eq!(FieldName::new(" title ").unwrap().as_str(), "title");
    }
}
