//! Edit scripts: store-independent descriptions of mutations.
//!
//! An [`Edit`] does not name a path directly. `target` picks one of the
//! containers present when the edit runs and `slot` picks a position inside
//! it, so any generated script applies cleanly to any tree.

use docjournal::{DocumentStore, Error, MapMut, Result, SeqMut};
use docjournal_core::{CoreError, Map, Node, Path, Selector, Value};

/// One mutation, resolved against the tree at the time it is applied.
#[derive(Debug, Clone)]
pub enum Edit {
    /// Set `key` on a mapping. On a sequence, overwrite the element at
    /// `slot`, or push when the sequence is empty.
    Set {
        target: usize,
        key: String,
        slot: usize,
        value: Value,
    },
    /// Delete the entry at `slot`. Empty containers are left alone.
    Delete { target: usize, slot: usize },
    /// Insert into a sequence at `slot`, wrapped to `0..=len`. On a
    /// mapping, set a key derived from `slot`.
    Insert {
        target: usize,
        slot: usize,
        value: Value,
    },
}

/// A container proxy of either kind.
pub enum Target<'a> {
    Map(MapMut<'a>),
    Seq(SeqMut<'a>),
}

/// Paths of every container in the tree: the root first, then depth-first.
pub fn containers(root: &Map) -> Vec<Path> {
    let mut out = vec![Path::root()];
    walk(Node::Map(root), &Path::root(), &mut out);
    out
}

fn walk(node: Node<'_>, path: &Path, out: &mut Vec<Path>) {
    match node {
        Node::Map(map) => {
            for (key, value) in map.iter() {
                visit(value, path.child(key), out);
            }
        }
        Node::Seq(seq) => {
            for (index, value) in seq.iter().enumerate() {
                visit(value, path.child(index), out);
            }
        }
    }
}

fn visit(value: &Value, path: Path, out: &mut Vec<Path>) {
    let node = match value {
        Value::Map(map) => Node::Map(map),
        Value::Seq(seq) => Node::Seq(seq),
        _ => return,
    };
    out.push(path.clone());
    walk(node, &path, out);
}

/// Borrow a proxy for the container at `path`.
pub fn target_at<'a>(store: &'a mut DocumentStore, path: &Path) -> Result<Target<'a>> {
    let mut current = Target::Map(store.root());
    for selector in path.segments() {
        current = match (current, selector) {
            (Target::Map(map), Selector::Key(key)) => {
                if map.get(key)?.as_map().is_some() {
                    Target::Map(map.into_map(key)?)
                } else {
                    Target::Seq(map.into_seq(key)?)
                }
            }
            (Target::Seq(seq), Selector::Index(index)) => {
                if seq.get(*index)?.as_map().is_some() {
                    Target::Map(seq.into_map(*index)?)
                } else {
                    Target::Seq(seq.into_seq(*index)?)
                }
            }
            _ => return Err(Error::Tree(CoreError::UnresolvedPath(path.clone()))),
        };
    }
    Ok(current)
}

/// Apply one edit. Returns `false` when the edit had nothing to act on.
pub fn apply_edit(store: &mut DocumentStore, edit: &Edit) -> Result<bool> {
    let paths = containers(store.tree());
    let pick = |target: usize| paths[target % paths.len()].clone();

    match edit {
        Edit::Set {
            target,
            key,
            slot,
            value,
        } => match target_at(store, &pick(*target))? {
            Target::Map(mut map) => {
                map.set(key.clone(), value.clone())?;
            }
            Target::Seq(mut seq) if seq.is_empty() => seq.push(value.clone())?,
            Target::Seq(mut seq) => {
                let index = slot % seq.len();
                seq.set(index, value.clone())?;
            }
        },
        Edit::Delete { target, slot } => match target_at(store, &pick(*target))? {
            Target::Map(mut map) => {
                let Some(key) = map.keys().nth(slot % map.len().max(1)).map(str::to_string) else {
                    return Ok(false);
                };
                map.delete(&key)?;
            }
            Target::Seq(seq) if seq.is_empty() => return Ok(false),
            Target::Seq(mut seq) => {
                let index = slot % seq.len();
                seq.delete(index)?;
            }
        },
        Edit::Insert {
            target,
            slot,
            value,
        } => match target_at(store, &pick(*target))? {
            Target::Map(mut map) => {
                map.set(format!("k{}", slot % 8), value.clone())?;
            }
            Target::Seq(mut seq) => {
                let index = slot % (seq.len() + 1);
                seq.insert(index, value.clone())?;
            }
        },
    }
    Ok(true)
}

/// Apply a whole script, returning how many edits took effect.
pub fn run_script(store: &mut DocumentStore, script: &[Edit]) -> Result<usize> {
    let mut applied = 0;
    for edit in script {
        if apply_edit(store, edit)? {
            applied += 1;
        }
    }
    Ok(applied)
}
