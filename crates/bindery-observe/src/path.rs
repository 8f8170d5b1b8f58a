#![forbid(unsafe_code)]

//! Member path parsing.
//!
//! A [`MemberPath`] is the parsed form of a binding expression such as
//! `Parent.Items[2].Name`. Segments are split on `.` outside brackets and an
//! indexer opens a segment of its own, so the example yields
//! `["Parent", "Items", "[2]", "Name"]`.
//!
//! # Invariants
//!
//! 1. Parsing is pure: equal input text always yields equal paths.
//! 2. No segment is empty; whitespace around segments is dropped.
//! 3. A bracketed segment keeps its brackets and has arity
//!    `commas + 1`, counting only commas outside quotes.

use std::fmt;
use std::sync::Arc;

use bindery_core::Value;

/// Shape of a path, which decides the observer variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// No segments: the target itself.
    Empty,
    Single,
    Multi,
}

/// Immutable, shareable parsed path.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MemberPath {
    raw: Arc<str>,
    segments: Arc<[Arc<str>]>,
}

impl MemberPath {
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let raw = text.trim();
        Self {
            raw: Arc::from(raw),
            segments: split_segments(raw).into(),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::parse("")
    }

    /// Path text as given (trimmed).
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Arc<str>] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn kind(&self) -> PathKind {
        match self.segments.len() {
            0 => PathKind::Empty,
            1 => PathKind::Single,
            _ => PathKind::Multi,
        }
    }

    /// Last segment, if any.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(|s| &**s)
    }
}

impl fmt::Display for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl fmt::Debug for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberPath")
            .field("raw", &self.raw)
            .field("segments", &self.segments)
            .finish()
    }
}

fn split_segments(text: &str) -> Vec<Arc<str>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    let flush = |current: &mut String, segments: &mut Vec<Arc<str>>| {
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            segments.push(Arc::from(trimmed));
        }
        current.clear();
    };

    for ch in text.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' if depth > 0 => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                if depth == 0 {
                    flush(&mut current, &mut segments);
                }
                depth += 1;
                current.push(ch);
            }
            ']' if depth > 0 => {
                current.push(ch);
                depth -= 1;
                if depth == 0 {
                    flush(&mut current, &mut segments);
                }
            }
            '.' if depth == 0 => flush(&mut current, &mut segments),
            _ => current.push(ch),
        }
    }
    flush(&mut current, &mut segments);
    segments
}

/// Whether `segment` is a bracketed indexer such as `[0]` or `[a, b]`.
#[must_use]
pub fn is_indexer(segment: &str) -> bool {
    segment.len() >= 2 && segment.starts_with('[') && segment.ends_with(']')
}

/// Number of index arguments of an indexer segment, `None` for plain names.
#[must_use]
pub fn indexer_arity(segment: &str) -> Option<usize> {
    is_indexer(segment).then(|| split_arguments(&segment[1..segment.len() - 1]).len())
}

/// Parsed index arguments of an indexer segment.
///
/// Integers, floats, `true`/`false`, `null` and quoted strings are
/// recognised; anything else is passed through as text.
#[must_use]
pub fn index_arguments(segment: &str) -> Vec<Value> {
    if !is_indexer(segment) {
        return Vec::new();
    }
    split_arguments(&segment[1..segment.len() - 1])
        .into_iter()
        .map(parse_argument)
        .collect()
}

fn split_arguments(inner: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, ch) in inner.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, ',') => {
                out.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(inner[start..].trim());
    out
}

fn parse_argument(text: &str) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        return Value::Int(i);
    }
    let numeric = text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if numeric {
        if let Ok(f) = text.parse::<f64>() {
            return Value::Float(f);
        }
    }
    match text {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    for q in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(q) && text.ends_with(q) {
            return Value::from(&text[1..text.len() - 1]);
        }
    }
    Value::from(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(text: &str) -> Vec<String> {
        MemberPath::parse(text)
            .segments()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn classification() {
        assert_eq!(MemberPath::parse("").kind(), PathKind::Empty);
        assert_eq!(MemberPath::parse("   ").kind(), PathKind::Empty);
        assert_eq!(MemberPath::parse("Name").kind(), PathKind::Single);
        assert_eq!(MemberPath::parse("A.B").kind(), PathKind::Multi);
        assert_eq!(MemberPath::parse("[0]").kind(), PathKind::Single);
    }

    #[test]
    fn indexers_are_their_own_segment() {
        assert_eq!(segs("Parent.Items[2].Name"), ["Parent", "Items", "[2]", "Name"]);
        assert_eq!(segs("Grid[1, 2]"), ["Grid", "[1, 2]"]);
        assert_eq!(segs("Map['a.b']"), ["Map", "['a.b']"]);
    }

    #[test]
    fn empty_segments_are_skipped() {
        assert_eq!(segs(".A..B."), ["A", "B"]);
        assert_eq!(segs(" A . B "), ["A", "B"]);
    }

    #[test]
    fn arity_counts_commas_outside_quotes() {
        assert_eq!(indexer_arity("[1]"), Some(1));
        assert_eq!(indexer_arity("[1,2]"), Some(2));
        assert_eq!(indexer_arity("['a,b', 3]"), Some(2));
        assert_eq!(indexer_arity("Name"), None);
    }

    #[test]
    fn index_argument_parsing() {
        assert_eq!(
            index_arguments("[1, 2.5, true, 'x', \"y\", null, raw]"),
            vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::Bool(true),
                Value::from("x"),
                Value::from("y"),
                Value::Null,
                Value::from("raw"),
            ]
        );
        assert!(index_arguments("Name").is_empty());
    }

    #[test]
    fn display_round_trips_raw_text() {
        let path = MemberPath::parse(" A.B[0] ");
        assert_eq!(path.to_string(), "A.B[0]");
        assert_eq!(path.last(), Some("[0]"));
    }
}
