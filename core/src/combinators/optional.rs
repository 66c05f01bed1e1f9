// operon/src/combinators/optional.rs

//! Failure-swallowing wrapper.

use crate::core::component::{Component, ComponentId, ComponentRef};
use crate::core::outcome::Outcome;
use crate::core::signature::Signature;
use crate::core::value::{Map, Value};
use std::sync::Arc;
use tracing::{event, span, Level};

/// Wraps one child. Success passes through unchanged; failure is swallowed
/// into a success that keeps the child's params but drops its context delta
/// and errors.
pub struct Optional {
  id: ComponentId,
  child: ComponentRef,
}

impl Optional {
  pub fn new(child: ComponentRef) -> Self {
    Self {
      id: ComponentId::new("optional"),
      child,
    }
  }

  pub fn shared(self) -> ComponentRef {
    Arc::new(self)
  }
}

impl Component for Optional {
  fn id(&self) -> &ComponentId {
    &self.id
  }

  fn signature(&self) -> Signature {
    self.child.signature()
  }

  fn call(&self, params: &[Value], context: &Map) -> Outcome {
    let optional_span = span!(Level::DEBUG, "optional", component = %self.id, child = %self.child.id());
    let _guard = optional_span.enter();

    let outcome = self.child.call(params, context);
    if outcome.success() {
      outcome
    } else {
      event!(Level::DEBUG, errors = outcome.errors().len(), "child failed, swallowing errors");
      Outcome::succeeded(self.id.clone(), outcome.params().to_vec(), Map::new())
    }
  }
}
