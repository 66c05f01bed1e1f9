// operon/src/combinators/chain.rs

//! Sequential composition with first-failure-wins control flow.

use crate::core::component::{Component, ComponentId, ComponentRef};
use crate::core::outcome::Outcome;
use crate::core::signature::{Arity, Signature};
use crate::core::value::{Map, Value};
use std::sync::Arc;
use tracing::{event, span, Level};

/// Runs children in order, each seeing the accumulated params and context of
/// its predecessors. Stops before invoking the next child once the
/// accumulator carries errors or a shortcut marker.
pub struct Chain {
  id: ComponentId,
  children: Vec<ComponentRef>,
}

impl Chain {
  pub fn new(children: Vec<ComponentRef>) -> Self {
    Self {
      id: ComponentId::new("chain"),
      children,
    }
  }

  pub fn shared(self) -> ComponentRef {
    Arc::new(self)
  }
}

impl Component for Chain {
  fn id(&self) -> &ComponentId {
    &self.id
  }

  /// The chain's signature is that of its first param-consuming child;
  /// leading zero-arity children are skipped. A chain of only zero-arity
  /// children is `(0, true)`.
  fn signature(&self) -> Signature {
    self
      .children
      .iter()
      .map(|child| child.signature())
      .find(|signature| signature.arity != Arity::Fixed(0))
      .unwrap_or_else(Signature::context_only)
  }

  fn call(&self, params: &[Value], context: &Map) -> Outcome {
    let chain_span = span!(Level::DEBUG, "chain", component = %self.id, children = self.children.len());
    let _guard = chain_span.enter();

    let mut acc = Outcome::succeeded(self.id.clone(), params.to_vec(), context.clone());

    for child in &self.children {
      if acc.failure() {
        event!(Level::DEBUG, "stopping: accumulator carries errors");
        break;
      }
      if acc.is_shortcut() {
        event!(Level::INFO, "stopping: accumulator carries a shortcut");
        break;
      }

      let child_span = span!(Level::TRACE, "chain_child", component = %child.id());
      let _child_guard = child_span.enter();
      let child_outcome = child.call(acc.params(), acc.context());
      acc = acc.merge(child_outcome);
    }

    acc
  }
}
