// operon/src/combinators/fanout.rs

//! Broadcast of the same input params to every child.

use crate::core::component::{Component, ComponentId, ComponentRef};
use crate::core::outcome::{Changes, Outcome};
use crate::core::signature::{Arity, Signature};
use crate::core::value::{Map, Value};
use std::sync::Arc;
use tracing::{event, span, Level};

/// Every child receives the full input params (truncating to its own arity)
/// and the accumulated context. Errors are collected; children's returned
/// params are appended in order.
pub struct Fanout {
  id: ComponentId,
  children: Vec<ComponentRef>,
}

impl Fanout {
  pub fn new(children: Vec<ComponentRef>) -> Self {
    Self {
      id: ComponentId::new("fanout"),
      children,
    }
  }

  pub fn shared(self) -> ComponentRef {
    Arc::new(self)
  }
}

impl Component for Fanout {
  fn id(&self) -> &ComponentId {
    &self.id
  }

  /// Max of the children's fixed arities; unbounded children are ignored
  /// unless every child is unbounded.
  fn signature(&self) -> Signature {
    let fixed = self
      .children
      .iter()
      .filter_map(|child| match child.signature().arity {
        Arity::Fixed(n) => Some(n),
        Arity::Unbounded => None,
      })
      .max();
    match fixed {
      Some(n) => Signature::fixed(n, true),
      None if self.children.is_empty() => Signature::context_only(),
      None => Signature::unbounded(),
    }
  }

  fn call(&self, params: &[Value], context: &Map) -> Outcome {
    let fanout_span = span!(Level::DEBUG, "fanout", component = %self.id, children = self.children.len());
    let _guard = fanout_span.enter();

    let mut acc = Outcome::succeeded(self.id.clone(), Vec::new(), context.clone());
    let mut acc_params: Vec<Value> = Vec::new();

    for child in &self.children {
      if acc.is_shortcut() {
        event!(Level::INFO, "stopping: accumulator carries a shortcut");
        break;
      }

      let child_span = span!(Level::TRACE, "fanout_child", component = %child.id());
      let _child_guard = child_span.enter();
      let child_outcome = child.call(params, acc.context());

      acc_params.extend(child_outcome.params().to_vec());
      acc = acc.merge(child_outcome.apply(Changes {
        params: Some(Vec::new()),
        ..Changes::default()
      }));
    }

    acc.apply(Changes {
      params: Some(acc_params),
      ..Changes::default()
    })
  }
}
