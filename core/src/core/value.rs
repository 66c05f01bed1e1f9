// operon/src/core/value.rs

//! The value model shared by params, context, error tokens, and repository
//! entities.
//!
//! A param slot is any `Value` (in practice almost always a keyed mapping,
//! but the algebra must accept arbitrary values), and context is a `Map`
//! from string keys to values. `serde_json`'s `preserve_order` feature keeps
//! mapping iteration deterministic, which the combinator algebra does not
//! rely on but the tests do.

use serde::{Deserialize, Serialize};
use std::fmt;

pub use serde_json::Value;

/// Keyed mapping used for context, param mappings, and error tokens.
pub type Map = serde_json::Map<String, Value>;

// --- Paths ---

/// One element of a path addressing into nested values: a mapping key or a
/// sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Atom {
  Key(String),
  Index(usize),
}

/// Ordered sequence of atoms denoting a location inside nested params.
pub type Path = Vec<Atom>;

impl From<&str> for Atom {
  fn from(key: &str) -> Self {
    Atom::Key(key.to_string())
  }
}

impl From<String> for Atom {
  fn from(key: String) -> Self {
    Atom::Key(key)
  }
}

impl From<usize> for Atom {
  fn from(index: usize) -> Self {
    Atom::Index(index)
  }
}

impl fmt::Display for Atom {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Atom::Key(key) => write!(f, "{}", key),
      Atom::Index(index) => write!(f, "{}", index),
    }
  }
}

/// Builds a `Path` from key and index literals:
/// `path!["comments", 1, "body"]`.
#[macro_export]
macro_rules! path {
  ($($atom:expr),* $(,)?) => {
    vec![$($crate::core::value::Atom::from($atom)),*]
  };
}

/// Converts a key-only pointer (as used by Namespace and the lookup helpers)
/// into a full `Path`.
pub fn keys_to_path(keys: &[String]) -> Path {
  keys.iter().map(|k| Atom::Key(k.clone())).collect()
}

// --- Traversal ---

/// Walks `path` into `value`, descending mappings by key and sequences by
/// index. Returns `None` as soon as an atom cannot be resolved.
pub fn dig<'a>(value: &'a Value, path: &[Atom]) -> Option<&'a Value> {
  let mut current = value;
  for atom in path {
    current = match (atom, current) {
      (Atom::Key(key), Value::Object(map)) => map.get(key)?,
      (Atom::Index(index), Value::Array(items)) => items.get(*index)?,
      _ => return None,
    };
  }
  Some(current)
}

/// `dig` over a key-only pointer.
pub fn dig_keys<'a>(value: &'a Value, keys: &[String]) -> Option<&'a Value> {
  let mut current = value;
  for key in keys {
    current = current.as_object()?.get(key)?;
  }
  Some(current)
}

// --- Construction ---

/// Wraps `inner` into nested mappings along `keys`: `nest(&[a, b], v)`
/// produces `{a: {b: v}}`. An empty key path returns `inner` unchanged.
pub fn nest(keys: &[String], inner: Value) -> Value {
  keys.iter().rev().fold(inner, |acc, key| {
    let mut map = Map::new();
    map.insert(key.clone(), acc);
    Value::Object(map)
  })
}

/// Recursively merges `overlay` into `base`. Mappings merge key-wise with
/// `overlay` winning on conflicts; any other pairing is replaced by the
/// overlay value.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
  match (base, overlay) {
    (Value::Object(base_map), Value::Object(overlay_map)) => {
      Value::Object(deep_merge_maps(base_map, overlay_map))
    }
    (_, overlay) => overlay,
  }
}

/// Key-wise recursive merge of two mappings, `overlay` winning.
///
/// Existing keys keep their insertion position (`Map::remove` would perturb
/// order under `preserve_order`).
pub fn deep_merge_maps(mut base: Map, overlay: Map) -> Map {
  for (key, overlay_value) in overlay {
    let merged = match base.get(&key) {
      Some(base_value) => deep_merge(base_value.clone(), overlay_value),
      None => overlay_value,
    };
    base.insert(key, merged);
  }
  base
}
