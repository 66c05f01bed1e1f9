// operon/src/combinators/split.rs

//! Parallel's distribution with fail-fast control flow.

use super::parallel::{distribute, ParamsAccumulation};
use crate::core::component::{Component, ComponentId, ComponentRef};
use crate::core::outcome::Outcome;
use crate::core::signature::{Arity, Signature};
use crate::core::value::{Map, Value};
use std::sync::Arc;

/// Distributes params exactly like [`Parallel`](super::Parallel) but stops
/// at the first failing or short-circuiting child.
pub struct Split {
  id: ComponentId,
  children: Vec<ComponentRef>,
}

impl Split {
  pub fn new(children: Vec<ComponentRef>) -> Self {
    Self {
      id: ComponentId::new("split"),
      children,
    }
  }

  pub fn shared(self) -> ComponentRef {
    Arc::new(self)
  }
}

impl Component for Split {
  fn id(&self) -> &ComponentId {
    &self.id
  }

  fn signature(&self) -> Signature {
    let arity = self
      .children
      .iter()
      .fold(Arity::Fixed(0), |acc, child| acc.sum(child.signature().arity));
    Signature::new(arity, true)
  }

  fn call(&self, params: &[Value], context: &Map) -> Outcome {
    distribute(&self.id, &self.children, params, context, true, ParamsAccumulation::Append)
  }
}
