// operon/src/core/failure.rs

//! The structured failure record carried on an [`Outcome`](crate::Outcome).
//!
//! Failures are never raised by the engine; they accumulate on outcomes and
//! travel up the combinator tree, gaining path prefixes on the way
//! (Namespace, Collection).

use crate::core::component::ComponentId;
use crate::core::value::{Atom, Map, Path};
use serde::Serialize;
use std::fmt;

/// Symbolic error codes produced by the engine itself. Downstream schema
/// engines may contribute arbitrary additional codes.
pub mod codes {
  pub const MISSING: &str = "missing";
  pub const NOT_FOUND: &str = "not_found";
  pub const INCLUDED: &str = "included";
  pub const INVALID: &str = "invalid";
  pub const BLANK: &str = "blank";
}

/// A structured validation or operation failure.
///
/// Invariant: at least one of `code` and `message` is set. The constructors
/// enforce this; there is no way to build a `Failure` with neither.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
  /// Identity of the component that produced this failure, when known.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub producer: Option<ComponentId>,
  /// Symbolic code (`missing`, `not_found`, ...).
  #[serde(skip_serializing_if = "Option::is_none")]
  pub code: Option<String>,
  /// Human-readable message.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  /// Location of the failure in the input, as mapping keys and sequence
  /// indices.
  pub path: Path,
  /// Interpolation tokens for message rendering.
  #[serde(skip_serializing_if = "Map::is_empty")]
  pub tokens: Map,
}

impl Failure {
  /// A failure identified by a symbolic code, at the root path.
  pub fn code(code: impl Into<String>) -> Self {
    Self {
      producer: None,
      code: Some(code.into()),
      message: None,
      path: Vec::new(),
      tokens: Map::new(),
    }
  }

  /// A failure identified by a human-readable message, at the root path.
  pub fn message(message: impl Into<String>) -> Self {
    Self {
      producer: None,
      code: None,
      message: Some(message.into()),
      path: Vec::new(),
      tokens: Map::new(),
    }
  }

  /// Relocates the failure to `path`.
  pub fn at(mut self, path: Path) -> Self {
    self.path = path;
    self
  }

  /// Attaches a human-readable message alongside the code.
  pub fn with_message(mut self, message: impl Into<String>) -> Self {
    self.message = Some(message.into());
    self
  }

  /// Attaches interpolation tokens.
  pub fn with_tokens(mut self, tokens: Map) -> Self {
    self.tokens = tokens;
    self
  }

  /// Stamps the producing component. Combinator wrappers call this for
  /// failures that do not already name a producer.
  pub fn with_producer(mut self, producer: ComponentId) -> Self {
    self.producer = Some(producer);
    self
  }

  pub(crate) fn fill_producer(mut self, producer: &ComponentId) -> Self {
    if self.producer.is_none() {
      self.producer = Some(producer.clone());
    }
    self
  }

  /// Returns a copy of the failure with `prefix` prepended to its path.
  pub fn prefixed(&self, prefix: &[Atom]) -> Self {
    let mut path = prefix.to_vec();
    path.extend(self.path.iter().cloned());
    Self {
      path,
      ..self.clone()
    }
  }
}

impl fmt::Display for Failure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match (&self.code, &self.message) {
      (Some(code), Some(message)) => format!("{}: {}", code, message),
      (Some(code), None) => code.clone(),
      (None, Some(message)) => message.clone(),
      // Unreachable by construction, but Display must not panic.
      (None, None) => "unspecified failure".to_string(),
    };
    if self.path.is_empty() {
      write!(f, "{}", label)
    } else {
      let rendered: Vec<String> = self.path.iter().map(|a| a.to_string()).collect();
      write!(f, "{} (at {})", label, rendered.join("."))
    }
  }
}
