// operon/src/combinators/shortcut.rs

//! Early-exit marker for enclosing fail-fast combinators.

use crate::core::component::{Component, ComponentId, ComponentRef};
use crate::core::outcome::{Changes, Outcome};
use crate::core::signature::Signature;
use crate::core::value::{Map, Value};
use std::sync::Arc;
use tracing::{event, span, Level};

/// Wraps one child. On child success the outcome gains a `shortcut` marker
/// naming the wrapped component, instructing enclosing Chain/Split loops to
/// exit early with success. On child failure the errors are discarded and an
/// empty success is returned, so the enclosing pipeline continues.
pub struct Shortcut {
  id: ComponentId,
  child: ComponentRef,
}

impl Shortcut {
  pub fn new(child: ComponentRef) -> Self {
    Self {
      id: ComponentId::new("shortcut"),
      child,
    }
  }

  pub fn shared(self) -> ComponentRef {
    Arc::new(self)
  }
}

impl Component for Shortcut {
  fn id(&self) -> &ComponentId {
    &self.id
  }

  fn signature(&self) -> Signature {
    self.child.signature()
  }

  fn call(&self, params: &[Value], context: &Map) -> Outcome {
    let shortcut_span = span!(Level::DEBUG, "shortcut", component = %self.id, child = %self.child.id());
    let _guard = shortcut_span.enter();

    let outcome = self.child.call(params, context);
    if outcome.success() {
      event!(Level::INFO, child = %self.child.id(), "child succeeded, marking shortcut");
      outcome.apply(Changes {
        shortcut: Some(self.child.id().clone()),
        ..Changes::default()
      })
    } else {
      event!(Level::DEBUG, errors = outcome.errors().len(), "child failed, discarding errors");
      Outcome::succeeded(self.id.clone(), Vec::new(), Map::new())
    }
  }
}
