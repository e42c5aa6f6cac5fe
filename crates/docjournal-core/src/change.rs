//! Change records: minimal, path-addressed descriptions of one mutation.
//!
//! On disk a record is an array whose first element names the op:
//!
//! ```text
//! ["set", path, key, value]
//! ["delete", path, key]
//! ["insert", path, index, value]
//! ```
//!
//! A mapping in place of an array is a full snapshot.

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::error::CoreError;
use crate::map::Map;
use crate::path::{Path, Selector};
use crate::value::Value;

/// Op tags as written in the journal.
pub mod ops {
    pub const SET: &str = "set";
    pub const DELETE: &str = "delete";
    pub const INSERT: &str = "insert";
}

/// A single change to the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Container at `path` gets or overwrites entry `key`.
    Set {
        path: Path,
        key: Selector,
        value: Value,
    },
    /// Container at `path` removes entry `key`.
    Delete { path: Path, key: Selector },
    /// Sequence at `path` inserts `value` before `index`.
    Insert {
        path: Path,
        index: usize,
        value: Value,
    },
    /// Replace the whole root mapping.
    Snapshot(Map),
}

impl Change {
    /// The op tag, or `"snapshot"` for full-state records.
    pub fn op(&self) -> &'static str {
        match self {
            Change::Set { .. } => ops::SET,
            Change::Delete { .. } => ops::DELETE,
            Change::Insert { .. } => ops::INSERT,
            Change::Snapshot(_) => "snapshot",
        }
    }

    /// Path of the container this change targets (root for snapshots).
    pub fn path(&self) -> Option<&Path> {
        match self {
            Change::Set { path, .. } | Change::Delete { path, .. } | Change::Insert { path, .. } => {
                Some(path)
            }
            Change::Snapshot(_) => None,
        }
    }

    /// Interpret one decoded journal document.
    ///
    /// Mappings are snapshots; arrays must be a recognized 3- or 4-element
    /// record.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        let items = match value {
            Value::Map(map) => return Ok(Change::Snapshot(map)),
            Value::Seq(items) => items,
            other => {
                return Err(CoreError::MalformedRecord(format!(
                    "expected a mapping or an array, got {}",
                    other.kind()
                )))
            }
        };

        let mut items = items.into_iter();
        let tag = match items.next() {
            Some(Value::String(tag)) => tag,
            Some(other) => {
                return Err(CoreError::MalformedRecord(format!(
                    "op tag must be a string, got {}",
                    other.kind()
                )))
            }
            None => return Err(CoreError::MalformedRecord("empty record".into())),
        };
        let rest: Vec<Value> = items.collect();

        match (tag.as_str(), rest.as_slice()) {
            (ops::SET, [path, key, value]) => Ok(Change::Set {
                path: Path::from_value(path)?,
                key: Selector::from_value(key)?,
                value: value.clone(),
            }),
            (ops::DELETE, [path, key]) => Ok(Change::Delete {
                path: Path::from_value(path)?,
                key: Selector::from_value(key)?,
            }),
            (ops::INSERT, [path, index, value]) => {
                let index = Selector::from_value(index)?.as_index().ok_or_else(|| {
                    CoreError::MalformedRecord("insert index must be an integer".into())
                })?;
                Ok(Change::Insert {
                    path: Path::from_value(path)?,
                    index,
                    value: value.clone(),
                })
            }
            (ops::SET | ops::DELETE | ops::INSERT, _) => Err(CoreError::MalformedRecord(
                format!("{} record with {} elements", tag, rest.len() + 1),
            )),
            _ => Err(CoreError::UnknownOp(tag)),
        }
    }
}

impl Serialize for Change {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Change::Set { path, key, value } => {
                let mut seq = serializer.serialize_seq(Some(4))?;
                seq.serialize_element(ops::SET)?;
                seq.serialize_element(path)?;
                seq.serialize_element(key)?;
                seq.serialize_element(value)?;
                seq.end()
            }
            Change::Delete { path, key } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(ops::DELETE)?;
                seq.serialize_element(path)?;
                seq.serialize_element(key)?;
                seq.end()
            }
            Change::Insert { path, index, value } => {
                let mut seq = serializer.serialize_seq(Some(4))?;
                seq.serialize_element(ops::INSERT)?;
                seq.serialize_element(path)?;
                seq.serialize_element(&(*index as u64))?;
                seq.serialize_element(value)?;
                seq.end()
            }
            Change::Snapshot(map) => map.serialize(serializer),
        }
    }
}
