//! Text codec for journal files.
//!
//! A journal is a stream of YAML documents:
//! - snapshots are block-style mappings with sorted keys;
//! - change records are single-line JSON arrays, which YAML reads as flow
//!   sequences.
//!
//! Documents are separated by a line containing exactly `---`.

use std::io;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::ser::Formatter;

use crate::change::Change;
use crate::error::CoreError;
use crate::map::Map;
use crate::value::Value;

/// Written before every appended change record.
pub const DOCUMENT_SEPARATOR: &str = "\n---\n";

/// Encode the full tree as a block-style snapshot document.
pub fn encode_snapshot(root: &Map) -> Result<String, CoreError> {
    serde_yaml::to_string(&SortedMap(root)).map_err(|e| CoreError::Encoding(e.to_string()))
}

/// Encode a change record as one compact JSON line.
pub fn encode_change(change: &Change) -> Result<String, CoreError> {
    let finite = match change {
        Change::Set { value, .. } | Change::Insert { value, .. } => value.is_finite(),
        Change::Snapshot(map) => map.values().all(Value::is_finite),
        Change::Delete { .. } => true,
    };
    if !finite {
        return Err(CoreError::Encoding(
            "non-finite float cannot be written to a change record".into(),
        ));
    }
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, YamlSafeFormatter);
    change
        .serialize(&mut serializer)
        .map_err(|e| CoreError::Encoding(e.to_string()))?;
    String::from_utf8(out).map_err(|e| CoreError::Encoding(e.to_string()))
}

/// Compact JSON whose strings are also valid YAML double-quoted scalars.
///
/// YAML rejects DEL, the C1 controls and the U+FFFE/U+FFFF noncharacters
/// in a stream, and folds NEL, U+2028 and U+2029 as line breaks. These are
/// written as `\uXXXX` escapes, which JSON and YAML read alike.
struct YamlSafeFormatter;

fn needs_yaml_escape(c: char) -> bool {
    matches!(
        c,
        '\u{7f}'..='\u{9f}' | '\u{2028}' | '\u{2029}' | '\u{feff}' | '\u{fffe}' | '\u{ffff}'
    )
}

impl Formatter for YamlSafeFormatter {
    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if needs_yaml_escape(c) {
                writer.write_all(fragment[start..i].as_bytes())?;
                write!(writer, "\\u{:04x}", u32::from(c))?;
                start = i + c.len_utf8();
            }
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Decode every document of a journal file, in order.
///
/// Empty documents (blank sections, `...` markers) decode as [`Value::Null`].
pub fn decode_documents(text: &str) -> Box<dyn Iterator<Item = Result<Value, CoreError>> + '_> {
    if text.trim().is_empty() {
        return Box::new(std::iter::empty());
    }
    Box::new(
        serde_yaml::Deserializer::from_str(text)
            .map(|document| Value::deserialize(document).map_err(|e| CoreError::Decoding(e.to_string()))),
    )
}

/// Serializes mappings with keys in sorted order, at every depth.
struct SortedMap<'a>(&'a Map);

struct Sorted<'a>(&'a Value);

impl Serialize for SortedMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in self.0.sorted_entries() {
            map.serialize_entry(k, &Sorted(v))?;
        }
        map.end()
    }
}

impl Serialize for Sorted<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Map(m) => SortedMap(m).serialize(serializer),
            Value::Seq(items) => serializer.collect_seq(items.iter().map(Sorted)),
            other => other.serialize(serializer),
        }
    }
}
