// operon/src/lookup/find_many.rs

//! Resolution of a set of entities from a repository into the context.
//!
//! The lookup pointer may traverse nested arrays; every leaf becomes one
//! reference whose path records the array indices it crossed, so missing and
//! not-found errors land at the exact position in the input. Reference
//! values may be scalar ids or lists of ids; lists are flattened (each id
//! gaining its index in the path) and the union is deduplicated before the
//! repository call.

use crate::core::component::{Component, ComponentId};
use crate::core::failure::{codes, Failure};
use crate::core::outcome::Outcome;
use crate::core::signature::Signature;
use crate::core::value::{Atom, Map, Path, Value};
use crate::lookup::repository::{FetchMany, Source};
use crate::lookup::singularize;
use std::sync::Arc;
use tracing::{event, span, Level};

/// One leaf the lookup pointer resolved to: a scalar id or a list of ids.
struct Reference {
  path: Path,
  value: Value,
}

/// One id expected to resolve, at its exact position in the input.
struct ExpectedId {
  path: Path,
  id: Value,
}

/// Resolves a set of entities and places them in context under
/// `context_key`, ordered by first occurrence of their id.
pub struct FindMany {
  id: ComponentId,
  context_key: String,
  source: Source<dyn FetchMany>,
  with: Option<String>,
  by: Option<(String, Vec<String>)>,
  type_path: Option<Vec<String>>,
  nullable: bool,
  omittable: bool,
}

impl FindMany {
  pub fn new(context_key: impl Into<String>, repository: Arc<dyn FetchMany>) -> Self {
    Self::with_source(context_key, Source::single(repository))
  }

  /// Polymorphic variant: references are grouped by type tag and one lookup
  /// is issued per tag.
  pub fn polymorphic<I, S>(context_key: impl Into<String>, repositories: I) -> Self
  where
    I: IntoIterator<Item = (S, Arc<dyn FetchMany>)>,
    S: Into<String>,
  {
    Self::with_source(context_key, Source::polymorphic(repositories))
  }

  fn with_source(context_key: impl Into<String>, source: Source<dyn FetchMany>) -> Self {
    let context_key = context_key.into();
    Self {
      id: ComponentId::new(format!("find_many[{}]", context_key)),
      context_key,
      source,
      with: None,
      by: None,
      type_path: None,
      nullable: false,
      omittable: false,
    }
  }

  /// Param key holding the ids (default: singularized context key +
  /// `_ids`).
  pub fn with(mut self, key: impl Into<String>) -> Self {
    self.with = Some(key.into());
    self
  }

  /// Column and deep extraction path for the references.
  pub fn by<I, S>(mut self, column: impl Into<String>, pointer: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.by = Some((
      column.into(),
      pointer.into_iter().map(Into::into).collect(),
    ));
    self
  }

  /// Path to the polymorphic type discriminator, resolved per reference
  /// (default `{context_key}_type`).
  pub fn type_from<I, S>(mut self, path: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.type_path = Some(path.into_iter().map(Into::into).collect());
    self
  }

  /// Nil ids are skipped instead of reported as not found.
  pub fn nullable(mut self) -> Self {
    self.nullable = true;
    self
  }

  /// The whole lookup is a no-op when no references are found.
  pub fn omittable(mut self) -> Self {
    self.omittable = true;
    self
  }

  pub fn shared(self) -> Arc<dyn Component> {
    Arc::new(self)
  }

  fn pointer(&self) -> (String, Vec<String>) {
    match &self.by {
      Some((column, pointer)) => (column.clone(), pointer.clone()),
      None => {
        let key = self
          .with
          .clone()
          .unwrap_or_else(|| format!("{}_ids", singularize(&self.context_key)));
        ("id".to_string(), vec![key])
      }
    }
  }

  fn success_empty(&self) -> Outcome {
    Outcome::succeeded(self.id.clone(), Vec::new(), Map::new())
  }

  fn failed(&self, errors: Vec<Failure>) -> Outcome {
    let errors = errors
      .into_iter()
      .map(|error| error.with_producer(self.id.clone()))
      .collect();
    Outcome::failed(self.id.clone(), errors)
  }

  /// Depth-first pointer walk. Arrays met mid-path branch per element with
  /// the element index recorded in the path; a key that cannot be resolved
  /// records a missing path at the exact position it would have occupied.
  fn collect_references(
    root: &Value,
    keys: &[String],
    prefix: Path,
    references: &mut Vec<Reference>,
    missing: &mut Vec<Path>,
  ) {
    match keys.split_first() {
      None => references.push(Reference {
        path: prefix,
        value: root.clone(),
      }),
      Some((key, rest)) => match root {
        Value::Array(items) => {
          for (index, item) in items.iter().enumerate() {
            let mut item_prefix = prefix.clone();
            item_prefix.push(Atom::Index(index));
            Self::collect_references(item, keys, item_prefix, references, missing);
          }
        }
        Value::Object(map) => {
          let mut key_path = prefix;
          key_path.push(Atom::Key(key.clone()));
          match map.get(key) {
            Some(value) => Self::collect_references(value, rest, key_path, references, missing),
            None => missing.push(key_path),
          }
        }
        _ => {
          let mut key_path = prefix;
          key_path.push(Atom::Key(key.clone()));
          missing.push(key_path);
        }
      },
    }
  }

  /// Resolves the type tag for one reference by replaying its array index
  /// trail along the type path.
  fn tag_for(&self, root: &Value, type_keys: &[String], trail: &[usize]) -> Result<String, Failure> {
    let mut current = root;
    let mut trail = trail.iter();
    let mut walked: Path = Vec::new();

    for key in type_keys {
      while let Value::Array(items) = current {
        let index = trail.next().copied().unwrap_or(0);
        walked.push(Atom::Index(index));
        match items.get(index) {
          Some(item) => current = item,
          None => return Err(Failure::code(codes::MISSING).at(walked)),
        }
      }
      walked.push(Atom::Key(key.clone()));
      match current.as_object().and_then(|map| map.get(key)) {
        Some(value) => current = value,
        None => return Err(Failure::code(codes::MISSING).at(walked)),
      }
    }

    match current.as_str() {
      Some(tag) => Ok(tag.to_string()),
      None => Err(Failure::code(codes::MISSING).at(walked)),
    }
  }

  /// Queries one repository for one group of expected ids and reports
  /// not-found ids at their exact leaf paths.
  fn resolve_group(
    &self,
    repository: &Arc<dyn FetchMany>,
    column: &str,
    expected: &[ExpectedId],
    errors: &mut Vec<Failure>,
  ) -> Vec<Value> {
    let mut query_ids: Vec<Value> = Vec::new();
    for entry in expected {
      if !entry.id.is_null() && !query_ids.contains(&entry.id) {
        query_ids.push(entry.id.clone());
      }
    }

    let attrs = vec![(column.to_string(), Value::Array(query_ids.clone()))];
    let entities = repository.get_many(&attrs);

    // Pair each returned entity with its id column for matching.
    let found: Vec<(Value, Value)> = entities
      .into_iter()
      .filter_map(|entity| {
        entity
          .as_object()
          .and_then(|map| map.get(column))
          .cloned()
          .map(|id| (id, entity))
      })
      .collect();

    for entry in expected {
      let resolved = found.iter().any(|(id, _)| *id == entry.id);
      if !resolved {
        errors.push(Failure::code(codes::NOT_FOUND).at(entry.path.clone()));
      }
    }

    // Entities ordered by first occurrence of their id among the references.
    query_ids
      .into_iter()
      .filter_map(|id| found.iter().find(|(found_id, _)| *found_id == id).map(|(_, entity)| entity.clone()))
      .collect()
  }
}

impl Component for FindMany {
  fn id(&self) -> &ComponentId {
    &self.id
  }

  fn signature(&self) -> Signature {
    Signature::fixed(1, true)
  }

  fn call(&self, params: &[Value], context: &Map) -> Outcome {
    let lookup_span = span!(Level::DEBUG, "find_many", component = %self.id, context_key = %self.context_key);
    let _guard = lookup_span.enter();

    if let Some(existing) = context.get(&self.context_key) {
      if self.nullable || !existing.is_null() {
        event!(Level::DEBUG, "context key already populated, skipping lookup");
        return self.success_empty();
      }
    }

    let empty_root = Value::Object(Map::new());
    let root = params.first().unwrap_or(&empty_root);

    let (column, pointer) = self.pointer();
    let mut references: Vec<Reference> = Vec::new();
    let mut missing: Vec<Path> = Vec::new();
    Self::collect_references(root, &pointer, Vec::new(), &mut references, &mut missing);

    // Flatten list references into per-id expectations; nil ids are skipped
    // under `nullable` and otherwise report as not found.
    let mut expected: Vec<(Vec<usize>, ExpectedId)> = Vec::new();
    for reference in &references {
      let trail: Vec<usize> = reference
        .path
        .iter()
        .filter_map(|atom| match atom {
          Atom::Index(index) => Some(*index),
          Atom::Key(_) => None,
        })
        .collect();
      match &reference.value {
        Value::Array(ids) => {
          for (index, id) in ids.iter().enumerate() {
            if self.nullable && id.is_null() {
              continue;
            }
            let mut path = reference.path.clone();
            path.push(Atom::Index(index));
            expected.push((trail.clone(), ExpectedId { path, id: id.clone() }));
          }
        }
        id => {
          if self.nullable && id.is_null() {
            continue;
          }
          expected.push((
            trail,
            ExpectedId {
              path: reference.path.clone(),
              id: id.clone(),
            },
          ));
        }
      }
    }

    if self.omittable && expected.is_empty() {
      event!(Level::DEBUG, "no references found, omitting");
      return self.success_empty();
    }

    let mut errors: Vec<Failure> = missing
      .into_iter()
      .map(|path| Failure::code(codes::MISSING).at(path))
      .collect();

    // Group expectations: one group per type tag for polymorphic sources,
    // a single group otherwise.
    let mut groups: Vec<(Arc<dyn FetchMany>, Vec<ExpectedId>)> = Vec::new();
    match &self.source {
      Source::Single(repository) => {
        groups.push((
          Arc::clone(repository),
          expected.into_iter().map(|(_, entry)| entry).collect(),
        ));
      }
      Source::Polymorphic(_) => {
        let type_keys = self
          .type_path
          .clone()
          .unwrap_or_else(|| vec![format!("{}_type", self.context_key)]);
        let mut by_tag: Vec<(String, Vec<ExpectedId>)> = Vec::new();
        for (trail, entry) in expected {
          let tag = match self.tag_for(root, &type_keys, &trail) {
            Ok(tag) => tag,
            Err(failure) => {
              if !errors.contains(&failure) {
                errors.push(failure);
              }
              continue;
            }
          };
          match by_tag.iter_mut().find(|(candidate, _)| *candidate == tag) {
            Some((_, entries)) => entries.push(entry),
            None => by_tag.push((tag, vec![entry])),
          }
        }
        for (tag, entries) in by_tag {
          match self.source.for_tag(&tag) {
            Some(repository) => groups.push((Arc::clone(repository), entries)),
            None => {
              let mut tokens = Map::new();
              tokens.insert(
                "allowed_values".to_string(),
                Value::Array(self.source.allowed_tags().into_iter().map(Value::String).collect()),
              );
              errors.push(
                Failure::code(codes::INCLUDED)
                  .at(entries.first().map(|entry| entry.path.clone()).unwrap_or_default())
                  .with_tokens(tokens),
              );
            }
          }
        }
      }
    }

    let mut entities: Vec<Value> = Vec::new();
    for (repository, group) in &groups {
      entities.extend(self.resolve_group(repository, &column, group, &mut errors));
    }

    if !errors.is_empty() {
      return self.failed(errors);
    }

    let mut context_delta = Map::new();
    context_delta.insert(self.context_key.clone(), Value::Array(entities));
    Outcome::succeeded(self.id.clone(), Vec::new(), context_delta)
  }
}
