// operon/src/lookup/find_one.rs

//! Resolution of a single entity from a repository into the context.

use crate::core::component::{Component, ComponentId};
use crate::core::failure::{codes, Failure};
use crate::core::outcome::Outcome;
use crate::core::signature::Signature;
use crate::core::value::{dig_keys, keys_to_path, Map, Value};
use crate::lookup::repository::{FetchOne, Source};
use std::sync::Arc;
use tracing::{event, span, Level};

/// Column selection for the repository lookup.
enum LookupBy {
  /// One column, pointer defaulting to the column name.
  Column(String),
  /// Several columns, each with a pointer of its own name.
  Columns(Vec<String>),
  /// Explicit column → pointer mapping for deep path extraction.
  Paths(Vec<(String, Vec<String>)>),
}

/// Resolves a single entity and places it in context under `context_key`.
///
/// Idempotent when the context key is already populated: returns an empty
/// success without touching the repository.
pub struct FindOne {
  id: ComponentId,
  context_key: String,
  source: Source<dyn FetchOne>,
  with: Option<String>,
  by: Option<LookupBy>,
  type_path: Option<Vec<String>>,
  nullable: bool,
  omittable: bool,
  skippable: bool,
}

impl FindOne {
  pub fn new(context_key: impl Into<String>, repository: Arc<dyn FetchOne>) -> Self {
    Self::with_source(context_key, Source::single(repository))
  }

  /// Polymorphic variant: the repository is selected by a type tag read
  /// from params (default path: `{context_key}_type`).
  pub fn polymorphic<I, S>(context_key: impl Into<String>, repositories: I) -> Self
  where
    I: IntoIterator<Item = (S, Arc<dyn FetchOne>)>,
    S: Into<String>,
  {
    Self::with_source(context_key, Source::polymorphic(repositories))
  }

  fn with_source(context_key: impl Into<String>, source: Source<dyn FetchOne>) -> Self {
    let context_key = context_key.into();
    Self {
      id: ComponentId::new(format!("find_one[{}]", context_key)),
      context_key,
      source,
      with: None,
      by: None,
      type_path: None,
      nullable: false,
      omittable: false,
      skippable: false,
    }
  }

  /// Param key for the single-column id lookup (default `{context_key}_id`).
  pub fn with(mut self, key: impl Into<String>) -> Self {
    self.with = Some(key.into());
    self
  }

  /// Looks up by one column whose value sits under the same param key.
  pub fn by(mut self, column: impl Into<String>) -> Self {
    self.by = Some(LookupBy::Column(column.into()));
    self
  }

  /// Multi-column lookup, one param key per column.
  pub fn by_columns<I, S>(mut self, columns: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.by = Some(LookupBy::Columns(columns.into_iter().map(Into::into).collect()));
    self
  }

  /// Column → deep extraction path mapping.
  pub fn by_paths<I, S, P, K>(mut self, paths: I) -> Self
  where
    I: IntoIterator<Item = (S, P)>,
    S: Into<String>,
    P: IntoIterator<Item = K>,
    K: Into<String>,
  {
    self.by = Some(LookupBy::Paths(
      paths
        .into_iter()
        .map(|(column, path)| (column.into(), path.into_iter().map(Into::into).collect()))
        .collect(),
    ));
    self
  }

  /// Path to the polymorphic type discriminator (default
  /// `{context_key}_type`).
  pub fn type_from<I, S>(mut self, path: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.type_path = Some(path.into_iter().map(Into::into).collect());
    self
  }

  /// All-nil lookup values resolve to `Success({context_key: nil})`, and a
  /// preloaded context key counts as populated even when nil.
  pub fn nullable(mut self) -> Self {
    self.nullable = true;
    self
  }

  /// A wholly absent lookup key is a clean no-op instead of a failure.
  pub fn omittable(mut self) -> Self {
    self.omittable = true;
    self
  }

  /// A not-found entity is a clean no-op instead of a failure.
  pub fn skippable(mut self) -> Self {
    self.skippable = true;
    self
  }

  pub fn shared(self) -> Arc<dyn Component> {
    Arc::new(self)
  }

  /// One `(column, pointer)` pair per lookup column.
  fn pointers(&self) -> Vec<(String, Vec<String>)> {
    match &self.by {
      Some(LookupBy::Column(column)) => vec![(column.clone(), vec![column.clone()])],
      Some(LookupBy::Columns(columns)) => columns
        .iter()
        .map(|column| (column.clone(), vec![column.clone()]))
        .collect(),
      Some(LookupBy::Paths(paths)) => paths.clone(),
      None => {
        let key = self
          .with
          .clone()
          .unwrap_or_else(|| format!("{}_id", self.context_key));
        vec![("id".to_string(), vec![key])]
      }
    }
  }

  fn success_empty(&self) -> Outcome {
    Outcome::succeeded(self.id.clone(), Vec::new(), Map::new())
  }

  fn success_with(&self, value: Value) -> Outcome {
    let mut context = Map::new();
    context.insert(self.context_key.clone(), value);
    Outcome::succeeded(self.id.clone(), Vec::new(), context)
  }

  fn failed(&self, errors: Vec<Failure>) -> Outcome {
    let errors = errors
      .into_iter()
      .map(|error| error.with_producer(self.id.clone()))
      .collect();
    Outcome::failed(self.id.clone(), errors)
  }

  /// Resolves the repository, reading the type tag for polymorphic sources.
  fn resolve_repository(&self, root: &Value) -> Result<Arc<dyn FetchOne>, Outcome> {
    match &self.source {
      Source::Single(repository) => Ok(Arc::clone(repository)),
      Source::Polymorphic(_) => {
        let type_path = self
          .type_path
          .clone()
          .unwrap_or_else(|| vec![format!("{}_type", self.context_key)]);
        let tag = match dig_keys(root, &type_path) {
          Some(value) => value.as_str().map(str::to_string),
          None => None,
        };
        let Some(tag) = tag else {
          return Err(self.failed(vec![Failure::code(codes::MISSING).at(keys_to_path(&type_path))]));
        };
        match self.source.for_tag(&tag) {
          Some(repository) => Ok(Arc::clone(repository)),
          None => {
            let mut tokens = Map::new();
            tokens.insert(
              "allowed_values".to_string(),
              Value::Array(self.source.allowed_tags().into_iter().map(Value::String).collect()),
            );
            Err(self.failed(vec![Failure::code(codes::INCLUDED)
              .at(keys_to_path(&type_path))
              .with_tokens(tokens)]))
          }
        }
      }
    }
  }
}

impl Component for FindOne {
  fn id(&self) -> &ComponentId {
    &self.id
  }

  fn signature(&self) -> Signature {
    Signature::fixed(1, true)
  }

  fn call(&self, params: &[Value], context: &Map) -> Outcome {
    let lookup_span = span!(Level::DEBUG, "find_one", component = %self.id, context_key = %self.context_key);
    let _guard = lookup_span.enter();

    // Idempotent when preloaded: a non-nil value always counts, and under
    // `nullable` mere key presence does.
    if let Some(existing) = context.get(&self.context_key) {
      if self.nullable || !existing.is_null() {
        event!(Level::DEBUG, "context key already populated, skipping lookup");
        return self.success_empty();
      }
    }

    let empty_root = Value::Object(Map::new());
    let root = params.first().unwrap_or(&empty_root);

    let pointers = self.pointers();
    let missing: Vec<&(String, Vec<String>)> = pointers
      .iter()
      .filter(|(_, pointer)| dig_keys(root, pointer).is_none())
      .collect();

    if !missing.is_empty() {
      if self.omittable && missing.len() == pointers.len() {
        event!(Level::DEBUG, "lookup keys absent, omitting");
        return self.success_empty();
      }
      return self.failed(
        missing
          .into_iter()
          .map(|(_, pointer)| Failure::code(codes::MISSING).at(keys_to_path(pointer)))
          .collect(),
      );
    }

    let values: Vec<Value> = pointers
      .iter()
      .map(|(_, pointer)| dig_keys(root, pointer).cloned().unwrap_or(Value::Null))
      .collect();

    if self.nullable && values.iter().all(Value::is_null) {
      return self.success_with(Value::Null);
    }

    let repository = match self.resolve_repository(root) {
      Ok(repository) => repository,
      Err(outcome) => return outcome,
    };

    let attrs: Vec<(String, Value)> = pointers
      .iter()
      .map(|(column, _)| column.clone())
      .zip(values)
      .collect();

    match repository.get_one(&attrs) {
      Some(entity) => self.success_with(entity),
      None if self.skippable => {
        event!(Level::DEBUG, "entity not found, skipping");
        self.success_empty()
      }
      None => self.failed(
        pointers
          .iter()
          .map(|(_, pointer)| Failure::code(codes::NOT_FOUND).at(keys_to_path(pointer)))
          .collect(),
      ),
    }
  }
}
