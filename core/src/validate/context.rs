// operon/src/validate/context.rs

//! Schema checks for caller-supplied context entries.

use crate::core::component::{Component, ComponentId};
use crate::core::failure::Failure;
use crate::core::outcome::Outcome;
use crate::core::signature::Signature;
use crate::core::value::{Atom, Map, Value};
use std::sync::Arc;
use tracing::{event, span, Level};

/// External type engine seam, the `try` analogue of a dry-types-style
/// checker. `value` is `None` when the context key is absent; a successful
/// check may return a coerced value to record, or `None` to record nothing.
pub trait TypeCheck: Send + Sync {
  fn check(&self, value: Option<&Value>) -> Result<Option<Value>, String>;
}

/// Checks configured context keys against their types and emits the
/// validated values as a context delta. A key that is absent and whose type
/// accepts absence is skipped entirely.
pub struct ContextValidator {
  id: ComponentId,
  schema: Vec<(String, Arc<dyn TypeCheck>)>,
}

impl ContextValidator {
  pub fn new<I, S>(schema: I) -> Self
  where
    I: IntoIterator<Item = (S, Arc<dyn TypeCheck>)>,
    S: Into<String>,
  {
    Self {
      id: ComponentId::new("context_validator"),
      schema: schema.into_iter().map(|(key, check)| (key.into(), check)).collect(),
    }
  }

  pub fn shared(self) -> Arc<dyn Component> {
    Arc::new(self)
  }
}

impl Component for ContextValidator {
  fn id(&self) -> &ComponentId {
    &self.id
  }

  /// `(0, true)`: consumes no positional params.
  fn signature(&self) -> Signature {
    Signature::context_only()
  }

  fn call(&self, _params: &[Value], context: &Map) -> Outcome {
    let validator_span = span!(Level::DEBUG, "context_validator", component = %self.id);
    let _guard = validator_span.enter();

    let mut validated = Map::new();
    let mut errors: Vec<Failure> = Vec::new();

    for (key, check) in &self.schema {
      let value = context.get(key);
      match check.check(value) {
        Ok(Some(coerced)) => {
          validated.insert(key.clone(), coerced);
        }
        Ok(None) => {
          // Absent and acceptable: nothing to record.
        }
        Err(message) => {
          errors.push(
            Failure::message(message)
              .at(vec![Atom::Key(key.clone())])
              .with_producer(self.id.clone()),
          );
        }
      }
    }

    if errors.is_empty() {
      // The outcome carries the original context with the validated values
      // layered on top.
      let mut merged = context.clone();
      merged.extend(validated);
      Outcome::succeeded(self.id.clone(), Vec::new(), merged)
    } else {
      event!(Level::DEBUG, errors = errors.len(), "context validation failed");
      Outcome::failed(self.id.clone(), errors)
    }
  }
}
