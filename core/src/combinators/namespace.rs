// operon/src/combinators/namespace.rs

//! Scoping of a sub-pipeline under a key path.
//!
//! The child sees params extracted at the `from` path and a context where
//! the namespaced entries are lifted over the base; its results are wrapped
//! back under the namespace, and its error paths are prefixed with it.
//! Sequential namespacing under the same key deep-merges the successive
//! namespaced contexts.

use crate::core::component::{Component, ComponentId, ComponentRef};
use crate::core::failure::{codes, Failure};
use crate::core::outcome::{Changes, Outcome};
use crate::core::signature::Signature;
use crate::core::value::{deep_merge_maps, dig_keys, keys_to_path, nest, Map, Value};
use std::sync::Arc;
use tracing::{event, span, Level};

/// Scopes `child` under the key path `ns`.
pub struct Namespace {
  id: ComponentId,
  ns: Vec<String>,
  from: Option<Vec<String>>,
  optional: bool,
  child: ComponentRef,
}

impl Namespace {
  /// Panics if `ns` is empty; a namespace needs at least one key.
  pub fn new<I, S>(ns: I, child: ComponentRef) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let ns: Vec<String> = ns.into_iter().map(Into::into).collect();
    if ns.is_empty() {
      panic!("operon setup error: Namespace requires at least one key");
    }
    Self {
      id: ComponentId::new(format!("namespace[{}]", ns.join("."))),
      ns,
      from: None,
      optional: false,
      child,
    }
  }

  /// Overrides the extraction path (defaults to the namespace itself).
  pub fn from<I, S>(mut self, from: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.from = Some(from.into_iter().map(Into::into).collect());
    self
  }

  /// Passes the full params through to the child (`from = []`); the child's
  /// own arity governs distribution.
  pub fn pass_through(mut self) -> Self {
    self.from = Some(Vec::new());
    self
  }

  /// Skips the child cleanly when the extraction path is absent from every
  /// param slot.
  pub fn optional(mut self) -> Self {
    self.optional = true;
    self
  }

  pub fn shared(self) -> ComponentRef {
    Arc::new(self)
  }

  fn extraction_path(&self) -> &[String] {
    self.from.as_deref().unwrap_or(&self.ns)
  }
}

impl Component for Namespace {
  fn id(&self) -> &ComponentId {
    &self.id
  }

  fn signature(&self) -> Signature {
    if self.extraction_path().is_empty() {
      self.child.signature()
    } else {
      Signature::fixed(1, true)
    }
  }

  fn call(&self, params: &[Value], context: &Map) -> Outcome {
    let namespace_span = span!(Level::DEBUG, "namespace", component = %self.id);
    let _guard = namespace_span.enter();

    let from = self.extraction_path().to_vec();
    let pass_through = from.is_empty();

    if !pass_through {
      let present = params.iter().any(|param| dig_keys(param, &from).is_some());
      if !present {
        if self.optional {
          event!(Level::DEBUG, "extraction path absent, skipping optional namespace");
          return Outcome::succeeded(self.id.clone(), params.to_vec(), context.clone());
        }
        event!(Level::DEBUG, "extraction path absent, failing");
        return Outcome::failed(
          self.id.clone(),
          vec![Failure::code(codes::MISSING)
            .at(keys_to_path(&from))
            .with_producer(self.id.clone())],
        );
      }
    }

    // Inner context: base without the namespace head, with the namespaced
    // entries (if a mapping) lifted on top.
    let ns_existing: Map = dig_in_context(context, &self.ns)
      .and_then(Value::as_object)
      .cloned()
      .unwrap_or_default();
    let mut inner_context = context.clone();
    inner_context.shift_remove(&self.ns[0]);
    inner_context.extend(ns_existing.clone());

    // Inner params: slots within the child's arity are extracted at `from`;
    // the rest pass through unchanged.
    let take = self.child.signature().arity.take(params.len());
    let mut inner_params: Vec<Value> = Vec::with_capacity(params.len());
    for (index, param) in params.iter().enumerate() {
      if index < take && !pass_through {
        inner_params.push(
          dig_keys(param, &from)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new())),
        );
      } else {
        inner_params.push(param.clone());
      }
    }

    let child_outcome = self.child.call(&inner_params, &inner_context);

    // Wrap the child's results back under the namespace.
    let out_params: Vec<Value> = child_outcome
      .params()
      .iter()
      .map(|param| nest(&self.ns, param.clone()))
      .collect();

    let mut merged_ns = ns_existing;
    merged_ns.extend(child_outcome.context().clone());
    let wrapped = match nest(&self.ns, Value::Object(merged_ns)) {
      Value::Object(map) => map,
      _ => Map::new(), // ns is non-empty, nest always yields a mapping
    };
    let out_context = deep_merge_maps(context.clone(), wrapped);

    let ns_prefix = keys_to_path(&self.ns);
    let errors: Vec<Failure> = child_outcome
      .errors()
      .iter()
      .map(|error| error.prefixed(&ns_prefix))
      .collect();

    Outcome::succeeded(self.id.clone(), out_params, out_context).apply(Changes {
      errors: Some(errors),
      shortcut: child_outcome.shortcut().cloned(),
      on_success: Some(child_outcome.on_success().to_vec()),
      on_failure: Some(child_outcome.on_failure().to_vec()),
      ..Changes::default()
    })
  }
}

/// `dig` over the context mapping by successive keys.
fn dig_in_context<'a>(context: &'a Map, keys: &[String]) -> Option<&'a Value> {
  let (head, rest) = keys.split_first()?;
  let mut current = context.get(head)?;
  for key in rest {
    current = current.as_object()?.get(key)?;
  }
  Some(current)
}
