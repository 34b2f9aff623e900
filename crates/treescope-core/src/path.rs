#![forbid(unsafe_code)]

//! Key-path access into a JSON value graph.
//!
//! Mutation commands address a value inside a component's state/props/context
//! by an ordered sequence of keys. Traversal here never panics and never
//! throws through a missing step: absence is an explicit result
//! ([`None`] for reads, [`PathError`] for writes), and a failed write leaves
//! the target graph untouched.
//!
//! # Invariants
//!
//! 1. `get_in(root, [])` is `Some(root)`.
//! 2. `set_in` requires a non-empty path and mutates at most the final key.
//! 3. `set_in(root, path, v)` followed by `get_in(root, path)` yields `v`
//!    whenever the write succeeded.

use serde_json::Value;
use thiserror::Error;

/// One step of a key path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathKey {
    /// Object member access.
    Key(String),
    /// Array element access.
    Index(usize),
}

impl std::fmt::Display for PathKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Key(k) => f.write_str(k),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Why a [`set_in`] write was rejected. The target graph is unmodified in
/// every case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// `set_in` needs at least one key to write to.
    #[error("empty path")]
    EmptyPath,

    /// An intermediate step resolved to an absent value.
    #[error("missing intermediate container at depth {depth}")]
    MissingIntermediate { depth: usize },

    /// The final parent exists but is a scalar, so the last key cannot be set.
    #[error("value at depth {depth} is not a container")]
    NotAContainer { depth: usize },

    /// Array write past the one-past-the-end position.
    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Resolve one step. Object members by key, array elements by index;
/// everything else (including key-into-array) is absent.
fn step<'a>(value: &'a Value, key: &PathKey) -> Option<&'a Value> {
    match (value, key) {
        (Value::Object(map), PathKey::Key(k)) => map.get(k),
        (Value::Array(items), PathKey::Index(i)) => items.get(*i),
        _ => None,
    }
}

fn step_mut<'a>(value: &'a mut Value, key: &PathKey) -> Option<&'a mut Value> {
    match (value, key) {
        (Value::Object(map), PathKey::Key(k)) => map.get_mut(k),
        (Value::Array(items), PathKey::Index(i)) => items.get_mut(*i),
        _ => None,
    }
}

/// Read the value at `path`, or `None` if any step is absent.
///
/// An empty path returns `root` itself.
#[must_use]
pub fn get_in<'a>(root: &'a Value, path: &[PathKey]) -> Option<&'a Value> {
    let mut current = root;
    for key in path {
        current = step(current, key)?;
    }
    Some(current)
}

/// Write `value` at `path`.
///
/// Walks every key but the last; if any intermediate resolves to an absent
/// value the write is rejected and `root` is unmodified. The final key is set
/// on the resolved container: object members are inserted or replaced, array
/// indices may replace an existing element or append at `len`.
pub fn set_in(root: &mut Value, path: &[PathKey], value: Value) -> Result<(), PathError> {
    let (last, parents) = path.split_last().ok_or(PathError::EmptyPath)?;

    let mut current = root;
    for (depth, key) in parents.iter().enumerate() {
        current = step_mut(current, key).ok_or(PathError::MissingIntermediate { depth })?;
    }

    match (current, last) {
        (Value::Object(map), PathKey::Key(k)) => {
            map.insert(k.clone(), value);
            Ok(())
        }
        (Value::Array(items), PathKey::Index(i)) => {
            if *i < items.len() {
                items[*i] = value;
                Ok(())
            } else if *i == items.len() {
                items.push(value);
                Ok(())
            } else {
                Err(PathError::IndexOutOfBounds {
                    index: *i,
                    len: items.len(),
                })
            }
        }
        _ => Err(PathError::NotAContainer {
            depth: path.len() - 1,
        }),
    }
}

/// Decode a JSON path array (strings and non-negative integers) into keys.
///
/// Returns `None` for anything else; the caller decides how to report it.
#[must_use]
pub fn parse_path(raw: &Value) -> Option<Vec<PathKey>> {
    let items = raw.as_array()?;
    let mut keys = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => keys.push(PathKey::Key(s.clone())),
            Value::Number(n) => keys.push(PathKey::Index(usize::try_from(n.as_u64()?).ok()?)),
            _ => return None,
        }
    }
    Some(keys)
}
