// operon/src/lookup/repository.rs

//! The repository seams the lookup helpers call through.
//!
//! The engine never owns a data store; it issues attribute lookups against
//! whatever the caller wired in. Entities are plain [`Value`]s.

use crate::core::value::Value;
use std::sync::Arc;

/// Attribute filter handed to a repository: `(column, value)` pairs.
pub type Attrs = [(String, Value)];

/// Resolves at most one entity matching the attributes.
pub trait FetchOne: Send + Sync {
  fn get_one(&self, attrs: &Attrs) -> Option<Value>;
}

/// Resolves every entity matching the attributes. For id lookups the value
/// of the filtering attribute is a deduplicated array of ids.
pub trait FetchMany: Send + Sync {
  fn get_many(&self, attrs: &Attrs) -> Vec<Value>;
}

/// A repository source: a single repository, or an ordered mapping from
/// string type tags to repositories for polymorphic dispatch.
pub enum Source<R: ?Sized> {
  Single(Arc<R>),
  Polymorphic(Vec<(String, Arc<R>)>),
}

impl<R: ?Sized> Source<R> {
  pub fn single(repository: Arc<R>) -> Self {
    Source::Single(repository)
  }

  pub fn polymorphic<I, S>(repositories: I) -> Self
  where
    I: IntoIterator<Item = (S, Arc<R>)>,
    S: Into<String>,
  {
    Source::Polymorphic(repositories.into_iter().map(|(tag, repo)| (tag.into(), repo)).collect())
  }

  pub fn is_polymorphic(&self) -> bool {
    matches!(self, Source::Polymorphic(_))
  }

  /// The declared type tags, in wiring order. Empty for single sources.
  pub fn allowed_tags(&self) -> Vec<String> {
    match self {
      Source::Single(_) => Vec::new(),
      Source::Polymorphic(repositories) => repositories.iter().map(|(tag, _)| tag.clone()).collect(),
    }
  }

  /// The repository registered for `tag`, if any.
  pub fn for_tag(&self, tag: &str) -> Option<&Arc<R>> {
    match self {
      Source::Single(_) => None,
      Source::Polymorphic(repositories) => repositories
        .iter()
        .find(|(candidate, _)| candidate == tag)
        .map(|(_, repository)| repository),
    }
  }
}

impl<R: ?Sized> Clone for Source<R> {
  fn clone(&self) -> Self {
    match self {
      Source::Single(repository) => Source::Single(Arc::clone(repository)),
      Source::Polymorphic(repositories) => Source::Polymorphic(repositories.clone()),
    }
  }
}
