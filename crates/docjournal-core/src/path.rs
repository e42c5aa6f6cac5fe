//! Paths locating containers relative to the document root.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::CoreError;
use crate::value::Value;

/// A single step of a path: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    Key(String),
    Index(usize),
}

impl Selector {
    /// Decode a selector from a journal value (string or non-negative integer).
    pub fn from_value(value: &Value) -> Result<Self, CoreError> {
        match value {
            Value::String(s) => Ok(Selector::Key(s.clone())),
            Value::Int(i) => usize::try_from(*i)
                .map(Selector::Index)
                .map_err(|_| CoreError::MalformedRecord(format!("negative index {}", i))),
            other => Err(CoreError::MalformedRecord(format!(
                "selector must be a string or integer, got {}",
                other.kind()
            ))),
        }
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            Selector::Key(k) => Some(k),
            Selector::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Selector::Key(_) => None,
            Selector::Index(i) => Some(*i),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Key(k) => write!(f, ".{}", k),
            Selector::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl From<&str> for Selector {
    fn from(key: &str) -> Self {
        Selector::Key(key.to_owned())
    }
}

impl From<String> for Selector {
    fn from(key: String) -> Self {
        Selector::Key(key)
    }
}

impl From<usize> for Selector {
    fn from(index: usize) -> Self {
        Selector::Index(index)
    }
}

impl Serialize for Selector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selector::Key(k) => serializer.serialize_str(k),
            Selector::Index(i) => serializer.serialize_u64(*i as u64),
        }
    }
}

/// Ordered list of selectors from the root to a container.
///
/// The root path is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    segments: Vec<Selector>,
}

impl Path {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<Selector>) -> Self {
        Self { segments }
    }

    /// Decode a path from a journal value (an array of selectors).
    pub fn from_value(value: &Value) -> Result<Self, CoreError> {
        let items = value.as_seq().ok_or_else(|| {
            CoreError::MalformedRecord(format!("path must be an array, got {}", value.kind()))
        })?;
        let segments = items
            .iter()
            .map(Selector::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Selector] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// A new path one level deeper.
    pub fn child(&self, selector: impl Into<Selector>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(selector.into());
        Self { segments }
    }

    pub fn parent(&self) -> Option<Path> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn last(&self) -> Option<&Selector> {
        self.segments.last()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.segments)
    }
}

impl FromIterator<Selector> for Path {
    fn from_iter<I: IntoIterator<Item = Selector>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}
