// operon/src/combinators/either.rs

//! First-success-wins alternation.

use crate::core::component::{Component, ComponentId, ComponentRef};
use crate::core::outcome::{Changes, Outcome};
use crate::core::signature::{Arity, Signature};
use crate::core::value::{Map, Value};
use std::sync::Arc;
use tracing::{event, span, Level};

/// Tries children in order with the same input params and context. The first
/// successful child's outcome is returned (operation rewritten to this
/// combinator); if none succeed, the last failure is returned.
pub struct Either {
  id: ComponentId,
  children: Vec<ComponentRef>,
}

impl Either {
  pub fn new(children: Vec<ComponentRef>) -> Self {
    Self {
      id: ComponentId::new("either"),
      children,
    }
  }

  pub fn shared(self) -> ComponentRef {
    Arc::new(self)
  }
}

impl Component for Either {
  fn id(&self) -> &ComponentId {
    &self.id
  }

  /// Max of children's arities (unbounded if any child is).
  fn signature(&self) -> Signature {
    let arity = self
      .children
      .iter()
      .fold(Arity::Fixed(0), |acc, child| acc.max(child.signature().arity));
    Signature::new(arity, true)
  }

  fn call(&self, params: &[Value], context: &Map) -> Outcome {
    let either_span = span!(Level::DEBUG, "either", component = %self.id, children = self.children.len());
    let _guard = either_span.enter();

    let mut last_failure: Option<Outcome> = None;

    for child in &self.children {
      let child_span = span!(Level::TRACE, "either_child", component = %child.id());
      let _child_guard = child_span.enter();
      let outcome = child.call(params, context);

      if outcome.success() {
        event!(Level::DEBUG, component = %child.id(), "alternative succeeded");
        return outcome.apply(Changes {
          operation: Some(self.id.clone()),
          ..Changes::default()
        });
      }
      last_failure = Some(outcome);
    }

    last_failure.unwrap_or_else(|| Outcome::succeeded(self.id.clone(), Vec::new(), Map::new()))
  }
}
