// operon/src/validate/params.rs

//! Thin adapter over an external params-schema engine.

use crate::core::component::{Component, ComponentId};
use crate::core::outcome::Outcome;
use crate::core::signature::Signature;
use crate::core::value::{Map, Value};
use std::sync::Arc;
use tracing::{event, span, Level};

/// What a schema contract reports back: the validated (possibly coerced)
/// mapping, a context delta, and zero or more failures shaped
/// `{code: predicate-name or "invalid", message, path, tokens}`.
#[derive(Debug, Clone, Default)]
pub struct ContractOutcome {
  pub output: Map,
  pub context: Map,
  pub errors: Vec<crate::core::failure::Failure>,
}

/// External schema engine seam. The engine validates the first param slot
/// against its schema and may read (and extend) the context while doing so.
pub trait SchemaContract: Send + Sync {
  fn validate(&self, input: &Map, context: &Map) -> ContractOutcome;
}

/// Validates the first param slot through a [`SchemaContract`]. The
/// validated mapping replaces the slot; the contract's context delta and
/// errors ride on the outcome.
pub struct ParamsValidator {
  id: ComponentId,
  contract: Arc<dyn SchemaContract>,
  optional: bool,
}

impl ParamsValidator {
  pub fn new(contract: Arc<dyn SchemaContract>) -> Self {
    Self {
      id: ComponentId::new("params_validator"),
      contract,
      optional: false,
    }
  }

  /// An empty input mapping passes untouched instead of being validated.
  pub fn optional(mut self) -> Self {
    self.optional = true;
    self
  }

  pub fn shared(self) -> Arc<dyn Component> {
    Arc::new(self)
  }
}

impl Component for ParamsValidator {
  fn id(&self) -> &ComponentId {
    &self.id
  }

  fn signature(&self) -> Signature {
    Signature::fixed(1, true)
  }

  fn call(&self, params: &[Value], context: &Map) -> Outcome {
    let validator_span = span!(Level::DEBUG, "params_validator", component = %self.id);
    let _guard = validator_span.enter();

    let input: Map = params
      .first()
      .and_then(Value::as_object)
      .cloned()
      .unwrap_or_default();

    if self.optional && input.is_empty() {
      event!(Level::DEBUG, "empty input and optional, passing through");
      return Outcome::succeeded(self.id.clone(), vec![Value::Object(Map::new())], Map::new());
    }

    let validated = self.contract.validate(&input, context);
    if validated.errors.is_empty() {
      Outcome::succeeded(
        self.id.clone(),
        vec![Value::Object(validated.output)],
        validated.context,
      )
    } else {
      event!(Level::DEBUG, errors = validated.errors.len(), "schema validation failed");
      let errors = validated
        .errors
        .into_iter()
        .map(|error| error.fill_producer(&self.id))
        .collect();
      Outcome::failed(self.id.clone(), errors)
    }
  }
}
