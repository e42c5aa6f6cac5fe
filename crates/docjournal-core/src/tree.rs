//! Path resolution and change application.
//!
//! The same functions drive journal replay and live mutation, so a record
//! that applies in memory also applies when the journal is read back.

use crate::change::Change;
use crate::error::CoreError;
use crate::map::Map;
use crate::path::{Path, Selector};
use crate::value::Value;

/// A borrowed container inside the tree.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Map(&'a Map),
    Seq(&'a [Value]),
}

/// A mutably borrowed container inside the tree.
#[derive(Debug)]
pub enum NodeMut<'a> {
    Map(&'a mut Map),
    Seq(&'a mut Vec<Value>),
}

fn mismatch(selector: &Selector, container: &'static str) -> CoreError {
    CoreError::SelectorMismatch {
        selector: selector.to_string(),
        container,
    }
}

impl<'a> Node<'a> {
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Map(_) => "mapping",
            Node::Seq(_) => "sequence",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Node::Map(m) => m.len(),
            Node::Seq(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a direct child.
    pub fn get(&self, selector: &Selector) -> Result<&'a Value, CoreError> {
        match (*self, selector) {
            (Node::Map(m), Selector::Key(k)) => {
                m.get(k).ok_or_else(|| CoreError::MissingKey(k.clone()))
            }
            (Node::Seq(s), Selector::Index(i)) => s.get(*i).ok_or(CoreError::IndexOutOfRange {
                index: *i,
                len: s.len(),
            }),
            (node, selector) => Err(mismatch(selector, node.kind())),
        }
    }

    fn check_set(&self, key: &Selector) -> Result<(), CoreError> {
        match (self, key) {
            (Node::Map(_), Selector::Key(_)) => Ok(()),
            (Node::Seq(_), Selector::Index(_)) => self.get(key).map(|_| ()),
            (node, key) => Err(mismatch(key, node.kind())),
        }
    }

    fn check_delete(&self, key: &Selector) -> Result<(), CoreError> {
        self.get(key).map(|_| ())
    }

    fn check_insert(&self, index: usize) -> Result<(), CoreError> {
        match self {
            Node::Seq(s) if index <= s.len() => Ok(()),
            Node::Seq(s) => Err(CoreError::IndexOutOfRange {
                index,
                len: s.len(),
            }),
            Node::Map(_) => Err(mismatch(&Selector::Index(index), "mapping")),
        }
    }
}

impl<'a> NodeMut<'a> {
    pub fn kind(&self) -> &'static str {
        match self {
            NodeMut::Map(_) => "mapping",
            NodeMut::Seq(_) => "sequence",
        }
    }

    /// Set or overwrite a child, returning the previous value.
    ///
    /// Sequence indices must already exist.
    pub fn set(&mut self, key: Selector, value: Value) -> Result<Option<Value>, CoreError> {
        match (self, key) {
            (NodeMut::Map(m), Selector::Key(k)) => Ok(m.insert(k, value)),
            (NodeMut::Seq(s), Selector::Index(i)) => {
                let len = s.len();
                let slot = s
                    .get_mut(i)
                    .ok_or(CoreError::IndexOutOfRange { index: i, len })?;
                Ok(Some(std::mem::replace(slot, value)))
            }
            (node, key) => Err(mismatch(&key, node.kind())),
        }
    }

    /// Remove a child, returning it.
    pub fn delete(&mut self, key: &Selector) -> Result<Value, CoreError> {
        match (self, key) {
            (NodeMut::Map(m), Selector::Key(k)) => {
                m.remove(k).ok_or_else(|| CoreError::MissingKey(k.clone()))
            }
            (NodeMut::Seq(s), Selector::Index(i)) if *i < s.len() => Ok(s.remove(*i)),
            (NodeMut::Seq(s), Selector::Index(i)) => Err(CoreError::IndexOutOfRange {
                index: *i,
                len: s.len(),
            }),
            (node, key) => Err(mismatch(key, node.kind())),
        }
    }

    /// Insert into a sequence before `index`; `index == len` appends.
    pub fn insert(&mut self, index: usize, value: Value) -> Result<(), CoreError> {
        match self {
            NodeMut::Seq(s) if index <= s.len() => {
                s.insert(index, value);
                Ok(())
            }
            NodeMut::Seq(s) => Err(CoreError::IndexOutOfRange {
                index,
                len: s.len(),
            }),
            NodeMut::Map(_) => Err(mismatch(&Selector::Index(index), "mapping")),
        }
    }
}

/// Resolve `path` to a container, starting at `root`.
pub fn resolve<'a>(root: &'a Map, path: &Path) -> Result<Node<'a>, CoreError> {
    let mut node = Node::Map(root);
    for selector in path.segments() {
        let child = node
            .get(selector)
            .map_err(|_| CoreError::UnresolvedPath(path.clone()))?;
        node = match child {
            Value::Map(m) => Node::Map(m),
            Value::Seq(s) => Node::Seq(s),
            _ => return Err(CoreError::NotAContainer(path.clone())),
        };
    }
    Ok(node)
}

/// Resolve `path` to a mutable container, starting at `root`.
pub fn resolve_mut<'a>(root: &'a mut Map, path: &Path) -> Result<NodeMut<'a>, CoreError> {
    let mut node = NodeMut::Map(root);
    for selector in path.segments() {
        let child = match (node, selector) {
            (NodeMut::Map(m), Selector::Key(k)) => m.get_mut(k),
            (NodeMut::Seq(s), Selector::Index(i)) => s.get_mut(*i),
            _ => None,
        }
        .ok_or_else(|| CoreError::UnresolvedPath(path.clone()))?;
        node = match child {
            Value::Map(m) => NodeMut::Map(m),
            Value::Seq(s) => NodeMut::Seq(s),
            _ => return Err(CoreError::NotAContainer(path.clone())),
        };
    }
    Ok(node)
}

/// Check that `change` would apply to `root` without modifying anything.
pub fn check(root: &Map, change: &Change) -> Result<(), CoreError> {
    match change {
        Change::Set { path, key, .. } => resolve(root, path)?.check_set(key),
        Change::Delete { path, key } => resolve(root, path)?.check_delete(key),
        Change::Insert { path, index, .. } => resolve(root, path)?.check_insert(*index),
        Change::Snapshot(_) => Ok(()),
    }
}

/// Apply `change` to `root`, returning the value it replaced or removed.
pub fn apply(root: &mut Map, change: Change) -> Result<Option<Value>, CoreError> {
    match change {
        Change::Set { path, key, value } => resolve_mut(root, &path)?.set(key, value),
        Change::Delete { path, key } => resolve_mut(root, &path)?.delete(&key).map(Some),
        Change::Insert { path, index, value } => {
            resolve_mut(root, &path)?.insert(index, value)?;
            Ok(None)
        }
        Change::Snapshot(map) => {
            *root = map;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Map {
        serde_yaml::from_str(
            "config:\n  servers:\n    - name: a\n      port: 1\n    - name: b\n      port: 2\nlist: [20, 30, 40]\ntitle: x\n",
        )
        .unwrap()
    }

    fn set(path: Path, key: impl Into<Selector>, value: impl Into<Value>) -> Change {
        Change::Set {
            path,
            key: key.into(),
            value: value.into(),
        }
    }

    #[test]
    fn test_resolve_nested() {
        let root = sample();
        let path = Path::root().child("config").child("servers").child(1usize);
        let node = resolve(&root, &path).unwrap();
        assert_eq!(node.get(&"name".into()).unwrap(), &Value::from("b"));
    }

    #[test]
    fn test_resolve_errors() {
        let root = sample();
        assert!(matches!(
            resolve(&root, &Path::root().child("missing")),
            Err(CoreError::UnresolvedPath(_))
        ));
        assert!(matches!(
            resolve(&root, &Path::root().child("title")),
            Err(CoreError::NotAContainer(_))
        ));
        assert!(matches!(
            resolve(&root, &Path::root().child("list").child(7usize)),
            Err(CoreError::UnresolvedPath(_))
        ));
        assert!(matches!(
            resolve(&root, &Path::root().child(0usize)),
            Err(CoreError::UnresolvedPath(_))
        ));
    }

    #[test]
    fn test_apply_deep_set() {
        let mut root = sample();
        let path = Path::root().child("config").child("servers").child(0usize);
        apply(&mut root, set(path.clone(), "port", 8080)).unwrap();
        let node = resolve(&root, &path).unwrap();
        assert_eq!(node.get(&"port".into()).unwrap(), &Value::Int(8080));
    }

    #[test]
    fn test_list_scenario() {
        let mut root = sample();
        let list = Path::root().child("list");
        apply(
            &mut root,
            Change::Delete {
                path: list.clone(),
                key: Selector::Index(1),
            },
        )
        .unwrap();
        apply(
            &mut root,
            Change::Insert {
                path: list.clone(),
                index: 0,
                value: Value::Int(10),
            },
        )
        .unwrap();
        apply(
            &mut root,
            Change::Insert {
                path: list.clone(),
                index: 3,
                value: Value::Int(50),
            },
        )
        .unwrap();
        assert_eq!(root.get("list"), Some(&Value::from(vec![10, 20, 40, 50])));
    }

    #[test]
    fn test_check_rejects_without_mutating() {
        let root = sample();
        let list = Path::root().child("list");
        assert!(matches!(
            check(&root, &set(list.clone(), 3usize, 1)),
            Err(CoreError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(check(
            &root,
            &Change::Insert {
                path: list.clone(),
                index: 3,
                value: Value::Null
            }
        )
        .is_ok());
        assert!(matches!(
            check(
                &root,
                &Change::Delete {
                    path: Path::root(),
                    key: "nope".into()
                }
            ),
            Err(CoreError::MissingKey(_))
        ));
        assert!(matches!(
            check(&root, &set(Path::root(), 0usize, 1)),
            Err(CoreError::SelectorMismatch { .. })
        ));
        assert!(check(&root, &set(Path::root(), "new", 1)).is_ok());
    }

    #[test]
    fn test_apply_returns_previous() {
        let mut root = sample();
        let old = apply(&mut root, set(Path::root(), "title", "y")).unwrap();
        assert_eq!(old, Some(Value::from("x")));
        let removed = apply(
            &mut root,
            Change::Delete {
                path: Path::root(),
                key: "title".into(),
            },
        )
        .unwrap();
        assert_eq!(removed, Some(Value::from("y")));
    }

    #[test]
    fn test_snapshot_replaces_root() {
        let mut root = sample();
        let mut replacement = Map::new();
        replacement.insert("only", 1);
        apply(&mut root, Change::Snapshot(replacement.clone())).unwrap();
        assert_eq!(root, replacement);
    }
}
