//! Path segment and field path types.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// PathError is returned when a dotted/bracketed path cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("malformed path {path:?}: {reason}")]
    MalformedPath { path: String, reason: String },
}

impl PathError {
    /// Creates a malformed path error.
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        PathError::MalformedPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Segment represents one level of path navigation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// Field name inside a map.
    Field(String),
    /// Position inside a list.
    Index(usize),
}

impl Segment {
    /// Creates a new field segment.
    pub fn field(name: impl Into<String>) -> Self {
        Segment::Field(name.into())
    }

    /// Creates a new index segment.
    pub fn index(i: usize) -> Self {
        Segment::Index(i)
    }

    /// Returns the field name if this is a field segment.
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Segment::Field(name) => Some(name),
            Segment::Index(_) => None,
        }
    }

    /// Returns the index if this is an index segment.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Index(i) => Some(*i),
            Segment::Field(_) => None,
        }
    }
}

impl From<&str> for Segment {
    fn from(name: &str) -> Self {
        Segment::Field(name.to_string())
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// FieldPath is an ordered list of segments addressing a value in an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Creates a new empty path.
    pub fn new() -> Self {
        FieldPath {
            segments: Vec::new(),
        }
    }

    /// Creates a path from a vector of segments.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        FieldPath { segments }
    }

    /// Parses a dotted/bracketed path such as `spec.template.spec.containers[0].image`.
    ///
    /// A field name that itself contains `.` or `[` is written as a quoted
    /// JSON string in brackets: `metadata.labels["app.kubernetes.io/name"]`.
    /// A segment that starts with `[` but not `["` has no field name in
    /// front of the bracket group and is kept verbatim as a field name, so
    /// `[0]` parses as the field `"[0]"` and not as an index.
    pub fn parse(input: &str) -> Result<FieldPath, PathError> {
        if input.is_empty() {
            return Err(PathError::malformed(input, "empty path"));
        }

        let mut segments = Vec::new();
        let mut rest = input;
        loop {
            // Leading segment of a dotted part.
            if rest.starts_with("[\"") {
                let (name, tail) = quoted_field(input, rest)?;
                segments.push(Segment::Field(name));
                rest = tail;
            } else {
                let end = if rest.starts_with('[') {
                    rest.find('.').unwrap_or(rest.len())
                } else {
                    rest.find(['.', '[']).unwrap_or(rest.len())
                };
                if end == 0 {
                    return Err(PathError::malformed(input, "empty field segment"));
                }
                segments.push(Segment::field(&rest[..end]));
                rest = &rest[end..];
            }

            // Bracket groups following it.
            while rest.starts_with('[') {
                if rest.starts_with("[\"") {
                    let (name, tail) = quoted_field(input, rest)?;
                    segments.push(Segment::Field(name));
                    rest = tail;
                    continue;
                }
                let close = rest
                    .find(']')
                    .ok_or_else(|| PathError::malformed(input, "unterminated '['"))?;
                let content = &rest[1..close];
                let index = content.parse::<usize>().map_err(|_| {
                    PathError::malformed(input, format!("non-numeric index {:?}", content))
                })?;
                segments.push(Segment::Index(index));
                rest = &rest[close + 1..];
            }

            match rest.strip_prefix('.') {
                Some(tail) => rest = tail,
                None if rest.is_empty() => break,
                None => {
                    return Err(PathError::malformed(
                        input,
                        format!("unexpected {:?} after index", rest),
                    ))
                }
            }
        }

        Ok(FieldPath { segments })
    }

    /// Returns the number of segments in the path.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns an iterator over the segments.
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// Appends a segment.
    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Removes and returns the last segment.
    pub fn pop(&mut self) -> Option<Segment> {
        self.segments.pop()
    }

    /// Returns the last segment.
    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Creates a new path with the given field appended.
    pub fn with_field(&self, name: impl Into<String>) -> Self {
        self.with(Segment::field(name))
    }

    /// Creates a new path with the given index appended.
    pub fn with_index(&self, index: usize) -> Self {
        self.with(Segment::Index(index))
    }

    /// Creates a new path with the given segment appended.
    pub fn with(&self, segment: Segment) -> Self {
        let mut new_path = self.clone();
        new_path.push(segment);
        new_path
    }

    /// Returns true if `prefix` is a (non-strict) prefix of this path.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Returns a slice of the segments.
    pub fn as_slice(&self) -> &[Segment] {
        &self.segments
    }
}

/// Reads a `["..."]` group at the start of `rest`, returning the field name
/// and what follows the closing bracket.
fn quoted_field<'a>(input: &str, rest: &'a str) -> Result<(String, &'a str), PathError> {
    let bytes = rest.as_bytes();
    let mut i = 2;
    let mut escaped = false;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if !escaped => escaped = true,
            b'"' if !escaped => break,
            _ => escaped = false,
        }
        i += 1;
    }
    if i >= bytes.len() {
        return Err(PathError::malformed(input, "unterminated quoted field"));
    }
    let name: String = serde_json::from_str(&rest[1..=i])
        .map_err(|err| PathError::malformed(input, format!("bad quoted field: {}", err)))?;
    let tail = rest[i + 1..]
        .strip_prefix(']')
        .ok_or_else(|| PathError::malformed(input, "expected ']' after quoted field"))?;
    Ok((name, tail))
}

/// Field names that can be written bare in a dotted path.
fn is_plain(name: &str) -> bool {
    !name.is_empty() && !name.contains(['.', '[', ']', '"'])
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::parse(s)
    }
}

impl FromIterator<Segment> for FieldPath {
    fn from_iter<T: IntoIterator<Item = Segment>>(iter: T) -> Self {
        FieldPath {
            segments: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FieldPath {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) if !is_plain(name) => {
                    let quoted = serde_json::to_string(name).map_err(|_| fmt::Error)?;
                    write!(f, "[{}]", quoted)?
                }
                Segment::Field(name) if i == 0 => write!(f, "{}", name)?,
                Segment::Field(name) => write!(f, ".{}", name)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}
