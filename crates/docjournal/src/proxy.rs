//! Tracking proxies for nested mappings and sequences.
//!
//! A proxy is an exclusive borrow of the store plus the absolute path of the
//! container it stands for. The container is looked up from the root on
//! every call. Because the borrow is exclusive, nothing can move or remove
//! the container while the proxy is alive, and a child proxy is always
//! derived from the current position of its parent.

use docjournal_core::{tree, Change, Map, Node, Path, Selector, Value};

use crate::document::Inner;
use crate::error::{Error, Result};

static EMPTY_MAP: Map = Map::new();

fn expect_kind(value: &Value, path: &Path, expected: &'static str) -> Result<()> {
    if value.kind() == expected {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            path: path.clone(),
            expected,
            found: value.kind(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mappings
// ─────────────────────────────────────────────────────────────────────────────

/// Mutable view of a mapping inside the store.
#[derive(Debug)]
pub struct MapMut<'a> {
    inner: &'a mut Inner,
    path: Path,
}

impl<'a> MapMut<'a> {
    pub(crate) fn new(inner: &'a mut Inner, path: Path) -> Self {
        Self { inner, path }
    }

    /// Absolute path of this mapping.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The mapping this proxy stands for.
    pub fn as_map(&self) -> &Map {
        match tree::resolve(&self.inner.root, &self.path) {
            Ok(Node::Map(map)) => map,
            // The borrow keeps the path valid, so this arm is never taken.
            _ => &EMPTY_MAP,
        }
    }

    pub fn get(&self, key: &str) -> Result<&Value> {
        self.as_map()
            .get(key)
            .ok_or_else(|| Error::MissingKey(key.to_string()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.as_map().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.as_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_map().is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.as_map().keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.as_map().iter()
    }

    /// Set `key`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<Option<Value>> {
        self.inner.commit(Change::Set {
            path: self.path.clone(),
            key: Selector::Key(key.into()),
            value: value.into(),
        })
    }

    /// Remove `key`, returning its value.
    pub fn delete(&mut self, key: &str) -> Result<Value> {
        let removed = self.inner.commit(Change::Delete {
            path: self.path.clone(),
            key: Selector::Key(key.to_string()),
        })?;
        Ok(removed.unwrap_or_default())
    }

    /// Remove `key` and return its value, or `default` when it is absent.
    pub fn pop_or(&mut self, key: &str, default: impl Into<Value>) -> Result<Value> {
        if self.contains_key(key) {
            self.delete(key)
        } else {
            Ok(default.into())
        }
    }

    /// Set `key` only if it is absent, then return its value.
    pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<&Value> {
        let key = key.into();
        if !self.contains_key(&key) {
            self.set(key.clone(), value)?;
        }
        self.get(&key)
    }

    /// Set every entry of `entries`, one record each.
    pub fn update<I, K, V>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Delete every key, one record each.
    pub fn clear(&mut self) -> Result<()> {
        let keys: Vec<String> = self.keys().map(str::to_string).collect();
        for key in keys {
            self.delete(&key)?;
        }
        Ok(())
    }

    /// Proxy for the mapping under `key`.
    pub fn map(&mut self, key: &str) -> Result<MapMut<'_>> {
        MapMut::new(&mut *self.inner, self.path.clone()).into_map(key)
    }

    /// Proxy for the sequence under `key`.
    pub fn seq(&mut self, key: &str) -> Result<SeqMut<'_>> {
        MapMut::new(&mut *self.inner, self.path.clone()).into_seq(key)
    }

    /// Like [`map`](Self::map), keeping the full borrow.
    pub fn into_map(self, key: &str) -> Result<MapMut<'a>> {
        let path = self.path.child(key);
        expect_kind(self.get(key)?, &path, "mapping")?;
        Ok(MapMut::new(self.inner, path))
    }

    /// Like [`seq`](Self::seq), keeping the full borrow.
    pub fn into_seq(self, key: &str) -> Result<SeqMut<'a>> {
        let path = self.path.child(key);
        expect_kind(self.get(key)?, &path, "sequence")?;
        Ok(SeqMut::new(self.inner, path))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sequences
// ─────────────────────────────────────────────────────────────────────────────

/// Mutable view of a sequence inside the store.
#[derive(Debug)]
pub struct SeqMut<'a> {
    inner: &'a mut Inner,
    path: Path,
}

impl<'a> SeqMut<'a> {
    pub(crate) fn new(inner: &'a mut Inner, path: Path) -> Self {
        Self { inner, path }
    }

    /// Absolute path of this sequence.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The sequence this proxy stands for.
    pub fn as_slice(&self) -> &[Value] {
        match tree::resolve(&self.inner.root, &self.path) {
            Ok(Node::Seq(seq)) => seq,
            _ => &[],
        }
    }

    pub fn get(&self, index: usize) -> Result<&Value> {
        let seq = self.as_slice();
        seq.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: seq.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.as_slice().iter()
    }

    /// Overwrite the element at `index`, returning the old one.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<Value> {
        let previous = self.inner.commit(Change::Set {
            path: self.path.clone(),
            key: Selector::Index(index),
            value: value.into(),
        })?;
        Ok(previous.unwrap_or_default())
    }

    /// Remove the element at `index`, shifting later elements down.
    pub fn delete(&mut self, index: usize) -> Result<Value> {
        let removed = self.inner.commit(Change::Delete {
            path: self.path.clone(),
            key: Selector::Index(index),
        })?;
        Ok(removed.unwrap_or_default())
    }

    /// Insert before `index`; `index == len` appends.
    pub fn insert(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        self.inner.commit(Change::Insert {
            path: self.path.clone(),
            index,
            value: value.into(),
        })?;
        Ok(())
    }

    pub fn push(&mut self, value: impl Into<Value>) -> Result<()> {
        let len = self.len();
        self.insert(len, value)
    }

    /// Append every value, one record each.
    pub fn extend<I, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        for value in values {
            self.push(value)?;
        }
        Ok(())
    }

    /// Delete the first element equal to `value`. Returns whether one was found.
    pub fn remove(&mut self, value: &Value) -> Result<bool> {
        let position = self.iter().position(|v| v == value);
        match position {
            Some(index) => {
                self.delete(index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Reverse in place, swapping elements pairwise from both ends.
    pub fn reverse(&mut self) -> Result<()> {
        let len = self.len();
        for front in 0..len / 2 {
            let back = len - 1 - front;
            let value = self.get(front)?.clone();
            let swapped = self.set(back, value)?;
            self.set(front, swapped)?;
        }
        Ok(())
    }

    /// Remove and return the last element, if any.
    pub fn pop(&mut self) -> Result<Option<Value>> {
        match self.len() {
            0 => Ok(None),
            len => self.delete(len - 1).map(Some),
        }
    }

    /// Proxy for the mapping at `index`.
    pub fn map(&mut self, index: usize) -> Result<MapMut<'_>> {
        SeqMut::new(&mut *self.inner, self.path.clone()).into_map(index)
    }

    /// Proxy for the sequence at `index`.
    pub fn seq(&mut self, index: usize) -> Result<SeqMut<'_>> {
        SeqMut::new(&mut *self.inner, self.path.clone()).into_seq(index)
    }

    pub fn into_map(self, index: usize) -> Result<MapMut<'a>> {
        let path = self.path.child(index);
        expect_kind(self.get(index)?, &path, "mapping")?;
        Ok(MapMut::new(self.inner, path))
    }

    pub fn into_seq(self, index: usize) -> Result<SeqMut<'a>> {
        let path = self.path.child(index);
        expect_kind(self.get(index)?, &path, "sequence")?;
        Ok(SeqMut::new(self.inner, path))
    }
}

#[cfg(test)]
mod tests {
    use crate::{DocumentStore, Error, Value};
    use std::fs;
    use tempfile::TempDir;

    fn open(contents: &str) -> (TempDir, DocumentStore) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.state");
        fs::write(&path, contents).unwrap();
        let store = DocumentStore::open(&path).unwrap();
        (dir, store)
    }

    fn journal_text(store: &DocumentStore) -> String {
        fs::read_to_string(store.path()).unwrap()
    }

    #[test]
    fn test_sequence_edits() {
        let (_dir, mut store) = open("list: [20, 30, 40]\n");
        let mut list = store.seq("list").unwrap();
        assert_eq!(list.delete(1).unwrap(), Value::Int(30));
        list.insert(0, 10).unwrap();
        list.push(50).unwrap();
        assert_eq!(list.as_slice(), &[10, 20, 40, 50].map(Value::from)[..]);

        assert!(journal_text(&store).ends_with(
            "[\"delete\",[\"list\"],1]\n---\n[\"insert\",[\"list\"],0,10]\n---\n[\"insert\",[\"list\"],3,50]"
        ));
    }

    #[test]
    fn test_nested_records_carry_full_path() {
        let (_dir, mut store) =
            open("config:\n  servers:\n    - name: a\n      port: 1\n    - name: b\n      port: 2\n");
        store
            .map("config")
            .unwrap()
            .into_seq("servers")
            .unwrap()
            .into_map(1)
            .unwrap()
            .set("port", 8080)
            .unwrap();

        assert!(journal_text(&store).ends_with("[\"set\",[\"config\",\"servers\",1],\"port\",8080]"));
    }

    #[test]
    fn test_child_path_follows_index_shift() {
        let (_dir, mut store) = open("items:\n  - id: 0\n  - id: 1\n  - id: 2\n");
        let mut items = store.seq("items").unwrap();
        items.delete(0).unwrap();

        let mut item = items.map(1).unwrap();
        assert_eq!(item.path().to_string(), "$.items[1]");
        assert_eq!(item.get("id").unwrap(), &Value::Int(2));
        item.set("done", true).unwrap();

        let tree = store.tree().clone();
        let reopened = DocumentStore::open(store.path()).unwrap();
        assert_eq!(reopened.tree(), &tree);
    }

    #[test]
    fn test_index_errors() {
        let (_dir, mut store) = open("list: [1]\n");
        let mut list = store.seq("list").unwrap();
        assert!(matches!(
            list.get(3),
            Err(Error::IndexOutOfRange { index: 3, len: 1 })
        ));
        assert!(matches!(
            list.set(1, 9),
            Err(Error::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(matches!(
            list.insert(2, 9),
            Err(Error::IndexOutOfRange { index: 2, len: 1 })
        ));
        assert_eq!(list.pop().unwrap(), Some(Value::Int(1)));
        assert_eq!(list.pop().unwrap(), None);
    }

    #[test]
    fn test_strings_are_scalars() {
        let (_dir, mut store) = open("name: abc\n");
        let err = store.seq("name").unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                expected: "sequence",
                found: "string",
                ..
            }
        ));
    }

    #[test]
    fn test_update_and_clear() {
        let (_dir, mut store) = open("inner:\n  a: 1\n");
        let mut inner = store.map("inner").unwrap();
        inner.update([("b", 2), ("c", 3)]).unwrap();
        assert_eq!(inner.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        inner.clear().unwrap();
        assert!(inner.is_empty());
        assert_eq!(store.pending_changes(), 5);
    }

    #[test]
    fn test_nested_set_default() {
        let (_dir, mut store) = open("inner: {}\n");
        let mut inner = store.map("inner").unwrap();
        assert_eq!(inner.set_default("x", "first").unwrap(), &Value::from("first"));
        assert_eq!(inner.set_default("x", "second").unwrap(), &Value::from("first"));
    }

    #[test]
    fn test_sequence_bulk_edits() {
        let (_dir, mut store) = open("list: [1, 2, 3]\n");
        let mut list = store.seq("list").unwrap();
        list.extend([4, 2]).unwrap();
        assert!(list.remove(&Value::Int(2)).unwrap());
        assert!(!list.remove(&Value::Int(9)).unwrap());
        list.reverse().unwrap();
        assert_eq!(list.as_slice(), &[2, 4, 3, 1].map(Value::from)[..]);
        assert_eq!(store.pending_changes(), 7);

        let text = journal_text(&store);
        assert!(text.contains("[\"insert\",[\"list\"],4,2]\n---\n[\"delete\",[\"list\"],1]"));
        let tree = store.tree().clone();
        let reopened = DocumentStore::open(store.path()).unwrap();
        assert_eq!(reopened.tree(), &tree);
    }

    #[test]
    fn test_reverse_short_sequence_records_nothing() {
        let (_dir, mut store) = open("one: [1]\nnone: []\n");
        store.seq("one").unwrap().reverse().unwrap();
        store.seq("none").unwrap().reverse().unwrap();
        assert_eq!(store.pending_changes(), 0);
    }

    #[test]
    fn test_pop_or() {
        let (_dir, mut store) = open("inner:\n  a: 1\n");
        let mut inner = store.map("inner").unwrap();
        assert_eq!(inner.pop_or("a", 0).unwrap(), Value::Int(1));
        assert_eq!(inner.pop_or("a", 0).unwrap(), Value::Int(0));
        assert!(inner.is_empty());
        assert_eq!(store.pending_changes(), 1);
    }
}
