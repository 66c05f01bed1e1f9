// operon/src/core/outcome.rs

//! The immutable record of one component invocation, and the two merge
//! operations every combinator is built from.
//!
//! An `Outcome` is produced per invocation and never mutated afterwards; all
//! evolution goes through [`Outcome::apply`] (field overrides) and
//! [`Outcome::merge`] (evaluation-order combination). `success` is defined as
//! "no errors"; `failure` is its negation.

use crate::core::component::ComponentId;
use crate::core::failure::Failure;
use crate::core::value::{Map, Value};
use crate::transaction::pool::CallbackHandle;

/// A transaction callback slot: either an already-settled outcome (sync
/// mode, or failure hooks) or a pending handle resolving on the worker pool
/// (async mode).
#[derive(Debug, Clone)]
pub enum CallbackState {
  Settled(Outcome),
  Pending(CallbackHandle),
}

impl CallbackState {
  /// Resolves this slot to an outcome, blocking on pending handles.
  pub fn resolve(&self) -> Outcome {
    match self {
      CallbackState::Settled(outcome) => outcome.clone(),
      CallbackState::Pending(handle) => handle.wait(),
    }
  }
}

impl PartialEq for CallbackState {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (CallbackState::Settled(a), CallbackState::Settled(b)) => a == b,
      (CallbackState::Pending(a), CallbackState::Pending(b)) => a.same(b),
      _ => false,
    }
  }
}

/// Field overrides for [`Outcome::apply`]. Unset fields keep the original
/// value; `apply` with a default `Changes` is the identity.
#[derive(Debug, Default)]
pub struct Changes {
  pub operation: Option<ComponentId>,
  pub params: Option<Vec<Value>>,
  pub context: Option<Map>,
  pub errors: Option<Vec<Failure>>,
  pub shortcut: Option<ComponentId>,
  pub on_success: Option<Vec<CallbackState>>,
  pub on_failure: Option<Vec<CallbackState>>,
}

/// Immutable carrier of one component invocation's results.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
  operation: Option<ComponentId>,
  params: Vec<Value>,
  context: Map,
  errors: Vec<Failure>,
  shortcut: Option<ComponentId>,
  on_success: Vec<CallbackState>,
  on_failure: Vec<CallbackState>,
}

impl Outcome {
  /// An anonymous empty success: no producer, no params, no context.
  pub fn empty() -> Self {
    Self {
      operation: None,
      params: Vec::new(),
      context: Map::new(),
      errors: Vec::new(),
      shortcut: None,
      on_success: Vec::new(),
      on_failure: Vec::new(),
    }
  }

  /// A successful outcome produced by `operation`.
  pub fn succeeded(operation: ComponentId, params: Vec<Value>, context: Map) -> Self {
    Self {
      operation: Some(operation),
      params,
      context,
      ..Self::empty()
    }
  }

  /// A failed outcome produced by `operation`.
  pub fn failed(operation: ComponentId, errors: Vec<Failure>) -> Self {
    Self {
      operation: Some(operation),
      errors,
      ..Self::empty()
    }
  }

  // --- Accessors ---

  pub fn operation(&self) -> Option<&ComponentId> {
    self.operation.as_ref()
  }

  pub fn params(&self) -> &[Value] {
    &self.params
  }

  pub fn context(&self) -> &Map {
    &self.context
  }

  pub fn errors(&self) -> &[Failure] {
    &self.errors
  }

  /// The component that triggered early exit, if any.
  pub fn shortcut(&self) -> Option<&ComponentId> {
    self.shortcut.as_ref()
  }

  pub fn on_success(&self) -> &[CallbackState] {
    &self.on_success
  }

  pub fn on_failure(&self) -> &[CallbackState] {
    &self.on_failure
  }

  /// `true` iff no errors were recorded.
  pub fn success(&self) -> bool {
    self.errors.is_empty()
  }

  pub fn failure(&self) -> bool {
    !self.success()
  }

  pub fn is_shortcut(&self) -> bool {
    self.shortcut.is_some()
  }

  // --- Evolution ---

  /// Returns a new outcome with the given field overrides applied.
  pub fn apply(&self, changes: Changes) -> Self {
    Self {
      operation: changes.operation.or_else(|| self.operation.clone()),
      params: changes.params.unwrap_or_else(|| self.params.clone()),
      context: changes.context.unwrap_or_else(|| self.context.clone()),
      errors: changes.errors.unwrap_or_else(|| self.errors.clone()),
      shortcut: changes.shortcut.or_else(|| self.shortcut.clone()),
      on_success: changes.on_success.unwrap_or_else(|| self.on_success.clone()),
      on_failure: changes.on_failure.unwrap_or_else(|| self.on_failure.clone()),
    }
  }

  /// Combines two outcomes in evaluation order:
  ///
  /// - `operation` keeps self's;
  /// - `shortcut`: the first non-nil wins;
  /// - `params`: `other`'s replace self's unless empty;
  /// - `context`: key-wise union, `other` winning on conflicts;
  /// - `errors` and the callback lists concatenate.
  pub fn merge(&self, other: Outcome) -> Self {
    let params = if other.params.is_empty() {
      self.params.clone()
    } else {
      other.params
    };

    let mut context = self.context.clone();
    context.extend(other.context);

    let mut errors = self.errors.clone();
    errors.extend(other.errors);

    let mut on_success = self.on_success.clone();
    on_success.extend(other.on_success);

    let mut on_failure = self.on_failure.clone();
    on_failure.extend(other.on_failure);

    Self {
      operation: self.operation.clone(),
      params,
      context,
      errors,
      shortcut: self.shortcut.clone().or(other.shortcut),
      on_success,
      on_failure,
    }
  }

  /// The monadic view: success wraps the accumulated context, failure wraps
  /// the collected errors.
  pub fn into_result(self) -> Result<Map, Vec<Failure>> {
    if self.errors.is_empty() {
      Ok(self.context)
    } else {
      Err(self.errors)
    }
  }
}
