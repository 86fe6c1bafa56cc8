//! # Document Patcher
//!
//! Edits to JSON documents are expressed as data: a [`Patch`] is an ordered
//! list of `(path, value)` pairs applied through a single set-by-path
//! primitive. Paths use dotted keys and bracketed array indices, e.g.
//! `jwks.keys[0].kid` or `display[0]`.
//!
//! Setting a path creates any missing intermediate objects or arrays. An
//! index equal to the length of an array appends to it.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::Result;
use crate::error::malformed;

/// One step of a [`JsonPath`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Object member.
    Key(String),

    /// Array element.
    Index(usize),
}

/// A parsed document path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsonPath(Vec<Segment>);

impl JsonPath {
    /// The path's segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }
}

impl FromStr for JsonPath {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = vec![];
        for part in s.split('.') {
            let (key, mut rest) = part.find('[').map_or((part, ""), |idx| part.split_at(idx));
            if !key.is_empty() {
                segments.push(Segment::Key(key.to_string()));
            }
            while let Some(tail) = rest.strip_prefix('[') {
                let Some((index, next)) = tail.split_once(']') else {
                    return Err(malformed!("unterminated index in path `{s}`"));
                };
                let index = index.parse().map_err(|_| malformed!("invalid index in path `{s}`"))?;
                segments.push(Segment::Index(index));
                rest = next;
            }
            if !rest.is_empty() {
                return Err(malformed!("unexpected `{rest}` in path `{s}`"));
            }
        }
        if segments.is_empty() {
            return Err(malformed!("empty path"));
        }
        Ok(Self(segments))
    }
}

impl Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => write!(f, "{key}")?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Set `value` at `path`, creating intermediate containers as needed. A
/// container of the wrong type along the path is replaced.
pub fn set(document: &mut Value, path: &JsonPath, value: Value) {
    let mut node = document;
    for segment in path.segments() {
        node = match segment {
            Segment::Key(key) => {
                if !node.is_object() {
                    *node = Value::Object(Map::new());
                }
                match node {
                    Value::Object(map) => map.entry(key.clone()).or_insert(Value::Null),
                    _ => return,
                }
            }
            Segment::Index(index) => {
                if !node.is_array() {
                    *node = Value::Array(vec![]);
                }
                match node {
                    Value::Array(items) => {
                        if items.len() <= *index {
                            items.resize(*index + 1, Value::Null);
                        }
                        &mut items[*index]
                    }
                    _ => return,
                }
            }
        };
    }
    *node = value;
}

/// An ordered set of path-addressed edits.
#[derive(Clone, Debug, Default)]
pub struct Patch {
    edits: Vec<(JsonPath, Value)>,
}

impl Patch {
    /// Create an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edit setting `value` at `path`.
    ///
    /// # Errors
    ///
    /// Returns an `Error::MalformedTemplate` error if the path cannot be
    /// parsed or the value cannot be serialized.
    pub fn set(mut self, path: &str, value: impl Serialize) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| malformed!("cannot serialize value for `{path}`: {e}"))?;
        self.edits.push((path.parse()?, value));
        Ok(self)
    }

    /// Add an edit only when `condition` holds.
    ///
    /// # Errors
    ///
    /// See [`Patch::set`].
    pub fn set_if(self, condition: bool, path: &str, value: impl Serialize) -> Result<Self> {
        if condition { self.set(path, value) } else { Ok(self) }
    }

    /// Apply every edit, in order.
    #[must_use]
    pub fn apply(&self, mut document: Value) -> Value {
        for (path, value) in &self.edits {
            set(&mut document, path, value.clone());
        }
        document
    }
}

/// Parse `source` as JSON, transform it, and serialize it back with
/// `indent` spaces of indentation. Each `(placeholder, value)` pair is
/// substituted literally in the source text before parsing.
///
/// # Errors
///
/// Returns an `Error::MalformedTemplate` error if the (substituted) source is
/// not valid JSON, or the error returned by `transform`.
pub fn patch(
    source: &str, placeholders: &[(&str, &str)], indent: usize,
    transform: impl FnOnce(Value) -> Result<Value>,
) -> Result<String> {
    let source = placeholders.iter().fold(source.to_string(), |text, (placeholder, value)| {
        text.replace(placeholder, value)
    });
    let document: Value =
        serde_json::from_str(&source).map_err(|e| malformed!("document is not valid JSON: {e}"))?;
    to_string_indented(&transform(document)?, indent)
}

/// Serialize a value as pretty-printed JSON with `indent` spaces.
///
/// # Errors
///
/// Returns an `Error::MalformedTemplate` error if the value cannot be
/// serialized.
pub fn to_string_indented(value: &impl Serialize, indent: usize) -> Result<String> {
    let indent = " ".repeat(indent);
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(
        &mut buf,
        PrettyFormatter::with_indent(indent.as_bytes()),
    );
    value.serialize(&mut ser).map_err(|e| malformed!("cannot serialize document: {e}"))?;
    String::from_utf8(buf).map_err(|e| malformed!("serialized document is not UTF-8: {e}"))
}
