//! Proptest generators for property-based testing.

use proptest::prelude::*;

use docjournal_core::{Map, Value};

use crate::script::Edit;

/// Characters that need care in YAML or JSON: C0 and C1 controls, DEL,
/// Unicode line breaks, byte-order mark, noncharacters, indicators.
const AWKWARD: &[char] = &[
    '\0', '\t', '\r', '\n', '\u{1b}', '\u{7f}', '\u{85}', '\u{9b}', '\u{a0}', '\u{2028}',
    '\u{2029}', '\u{feff}', '\u{fffe}', '\u{ffff}', ':', '#', '-', '\'', '"', '\\', '&', '*', '!',
    '|', '>', '%', '@', '{', '}', '[', ']', ',', '?', '~', ' ',
];

/// Generate a character, biased towards awkward ones.
pub fn character() -> impl Strategy<Value = char> {
    prop_oneof![
        3 => prop::char::range('a', 'z'),
        2 => prop::sample::select(AWKWARD),
        1 => any::<char>(),
    ]
}

/// Generate a mapping key.
pub fn key() -> impl Strategy<Value = String> {
    prop::collection::vec(character(), 0..8).prop_map(String::from_iter)
}

/// Generate a string scalar.
pub fn text() -> impl Strategy<Value = String> {
    prop::collection::vec(character(), 0..12).prop_map(String::from_iter)
}

/// Generate a finite float that survives text round-trips exactly.
pub fn float() -> impl Strategy<Value = f64> {
    (-1_000_000i32..1_000_000).prop_map(|n| f64::from(n) / 4.0)
}

/// Generate a scalar value.
pub fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        float().prop_map(Value::Float),
        text().prop_map(Value::String),
    ]
}

/// Generate a value of bounded depth and size.
pub fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Seq),
            prop::collection::vec((key(), inner), 0..4)
                .prop_map(|entries| Value::Map(entries.into_iter().collect())),
        ]
    })
}

/// Generate a root mapping.
pub fn tree() -> impl Strategy<Value = Map> {
    prop::collection::vec((key(), value()), 0..6).prop_map(|entries| entries.into_iter().collect())
}

/// Generate one edit.
pub fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (any::<usize>(), key(), any::<usize>(), value())
            .prop_map(|(target, key, slot, value)| Edit::Set { target, key, slot, value }),
        (any::<usize>(), any::<usize>()).prop_map(|(target, slot)| Edit::Delete { target, slot }),
        (any::<usize>(), any::<usize>(), value())
            .prop_map(|(target, slot, value)| Edit::Insert { target, slot, value }),
    ]
}

/// Generate a script of up to `max_len` edits.
pub fn script(max_len: usize) -> impl Strategy<Value = Vec<Edit>> {
    prop::collection::vec(edit(), 0..=max_len)
}
