// operon/src/combinators/collection.rs

//! Iteration of a child over a collection addressed by a namespace key.
//!
//! The collection may live in any param slot and/or the context under the
//! same key, as either a sequence (integer keys) or a mapping (symbolic
//! keys). Iteration covers the union of keys across all non-empty sources;
//! ordering follows the first non-empty source. Iteration errors come back
//! prefixed with `[key, k]`.

use crate::core::component::{Component, ComponentId, ComponentRef};
use crate::core::failure::Failure;
use crate::core::outcome::{CallbackState, Changes, Outcome};
use crate::core::signature::Signature;
use crate::core::value::{Atom, Map, Value};
use std::sync::Arc;
use tracing::{event, span, Level};

/// Shape of the first non-empty collection source; decides how per-iteration
/// results are re-assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CollectionKind {
  Sequence,
  Mapping,
}

/// Iterates `child` over the collection found under `key`.
pub struct Collection {
  id: ComponentId,
  key: String,
  child: ComponentRef,
}

impl Collection {
  pub fn new(key: impl Into<String>, child: ComponentRef) -> Self {
    let key = key.into();
    Self {
      id: ComponentId::new(format!("collection[{}]", key)),
      key,
      child,
    }
  }

  pub fn shared(self) -> ComponentRef {
    Arc::new(self)
  }

  /// The keys a source contributes, or `None` for empty/non-collection
  /// sources.
  fn keys_of(value: &Value) -> Option<(CollectionKind, Vec<Atom>)> {
    match value {
      Value::Array(items) if !items.is_empty() => Some((
        CollectionKind::Sequence,
        (0..items.len()).map(Atom::Index).collect(),
      )),
      Value::Object(map) if !map.is_empty() => Some((
        CollectionKind::Mapping,
        map.keys().map(|k| Atom::Key(k.clone())).collect(),
      )),
      _ => None,
    }
  }

  fn element<'a>(collection: &'a Value, key: &Atom) -> Option<&'a Value> {
    match (collection, key) {
      (Value::Array(items), Atom::Index(index)) => items.get(*index),
      (Value::Object(map), Atom::Key(name)) => map.get(name),
      _ => None,
    }
  }
}

impl Component for Collection {
  fn id(&self) -> &ComponentId {
    &self.id
  }

  fn signature(&self) -> Signature {
    Signature::new(self.child.signature().arity, true)
  }

  fn call(&self, params: &[Value], context: &Map) -> Outcome {
    let collection_span = span!(Level::DEBUG, "collection", component = %self.id, key = %self.key);
    let _guard = collection_span.enter();

    // Sources in precedence order: every param slot's entry at `key`, then
    // the context entry at `key`.
    let param_sources: Vec<Option<&Value>> = params
      .iter()
      .map(|param| param.as_object().and_then(|map| map.get(&self.key)))
      .collect();
    let context_source = context.get(&self.key);

    // Union keyset, ordered by the first non-empty source; later sources
    // append their unseen keys. The first non-empty source also fixes the
    // output shape.
    let mut kind: Option<CollectionKind> = None;
    let mut keys: Vec<Atom> = Vec::new();
    for source in param_sources.iter().chain(std::iter::once(&context_source)) {
      if let Some((source_kind, source_keys)) = source.and_then(Self::keys_of) {
        kind.get_or_insert(source_kind);
        for key in source_keys {
          if !keys.contains(&key) {
            keys.push(key);
          }
        }
      }
    }
    let kind = kind.unwrap_or(CollectionKind::Sequence);
    event!(Level::DEBUG, iterations = keys.len(), "iterating collection");

    // One child invocation per key; missing entries iterate as empty
    // mappings.
    let mut iterations: Vec<(Atom, Outcome)> = Vec::with_capacity(keys.len());
    for key in &keys {
      let iteration_params: Vec<Value> = param_sources
        .iter()
        .map(|source| {
          source
            .and_then(|collection| Self::element(collection, key))
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
        })
        .collect();

      let mut iteration_context = context.clone();
      if let Some(Value::Object(entry)) =
        context_source.and_then(|collection| Self::element(collection, key))
      {
        iteration_context.extend(entry.clone());
      }

      let iteration_span = span!(Level::TRACE, "collection_iteration", key = %key);
      let _iteration_guard = iteration_span.enter();
      iterations.push((key.clone(), self.child.call(&iteration_params, &iteration_context)));
    }

    self.compose(kind, iterations)
  }
}

impl Collection {
  /// Re-assembles per-iteration outcomes: params per slot are re-wrapped
  /// under the collection key, contexts compose into `context[key]`, errors
  /// are path-prefixed, callbacks concatenate.
  fn compose(&self, kind: CollectionKind, iterations: Vec<(Atom, Outcome)>) -> Outcome {
    let slots = iterations
      .iter()
      .map(|(_, outcome)| outcome.params().len())
      .max()
      .unwrap_or(0);

    let mut out_params: Vec<Value> = Vec::with_capacity(slots);
    for slot in 0..slots {
      let rebuilt = match kind {
        CollectionKind::Sequence => Value::Array(
          iterations
            .iter()
            .map(|(_, outcome)| outcome.params().get(slot).cloned().unwrap_or(Value::Null))
            .collect(),
        ),
        CollectionKind::Mapping => {
          let mut map = Map::new();
          for (key, outcome) in &iterations {
            if let (Atom::Key(name), Some(value)) = (key, outcome.params().get(slot)) {
              map.insert(name.clone(), value.clone());
            }
          }
          Value::Object(map)
        }
      };
      let mut wrapper = Map::new();
      wrapper.insert(self.key.clone(), rebuilt);
      out_params.push(Value::Object(wrapper));
    }

    let contexts = match kind {
      CollectionKind::Sequence => Value::Array(
        iterations
          .iter()
          .map(|(_, outcome)| Value::Object(outcome.context().clone()))
          .collect(),
      ),
      CollectionKind::Mapping => {
        let mut map = Map::new();
        for (key, outcome) in &iterations {
          if let Atom::Key(name) = key {
            map.insert(name.clone(), Value::Object(outcome.context().clone()));
          }
        }
        Value::Object(map)
      }
    };
    let mut out_context = Map::new();
    out_context.insert(self.key.clone(), contexts);

    let mut errors: Vec<Failure> = Vec::new();
    let mut shortcut = None;
    let mut on_success: Vec<CallbackState> = Vec::new();
    let mut on_failure: Vec<CallbackState> = Vec::new();
    for (key, outcome) in &iterations {
      let prefix = [Atom::Key(self.key.clone()), key.clone()];
      errors.extend(outcome.errors().iter().map(|error| error.prefixed(&prefix)));
      if shortcut.is_none() {
        shortcut = outcome.shortcut().cloned();
      }
      on_success.extend(outcome.on_success().to_vec());
      on_failure.extend(outcome.on_failure().to_vec());
    }

    Outcome::succeeded(self.id.clone(), out_params, out_context).apply(Changes {
      errors: Some(errors),
      shortcut,
      on_success: Some(on_success),
      on_failure: Some(on_failure),
      ..Changes::default()
    })
  }
}
