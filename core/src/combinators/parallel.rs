// operon/src/combinators/parallel.rs

//! Arity-driven distribution of input params across children.
//!
//! Children are invoked in construction order (no actual parallelism — see
//! the crate's concurrency model); "parallel" refers to the disjoint slicing
//! of the input params. Split shares this distribution and differs only in
//! its fail-fast policy.

use crate::core::component::{Component, ComponentId, ComponentRef};
use crate::core::outcome::{Changes, Outcome};
use crate::core::signature::{Arity, Signature};
use crate::core::value::{Map, Value};
use std::sync::Arc;
use tracing::{event, span, Level};

/// How distributed children's returned params are accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParamsAccumulation {
  /// Children's params concatenate in order.
  Append,
  /// Params merge index-wise: the mapping at position `i` of each child is
  /// key-merged across children, later children winning; shorter tails fall
  /// back to the longer side's value.
  PackByIndex,
}

/// Allocates disjoint slices of the input params to children by arity and
/// collects every child's errors.
///
/// With a single input param the slice is not consumed: every child receives
/// that same param (the fan-out case). With more than one input param, any
/// params left unconsumed after the walk are re-appended as leftovers.
pub struct Parallel {
  id: ComponentId,
  children: Vec<ComponentRef>,
  accumulation: ParamsAccumulation,
}

impl Parallel {
  pub fn new(children: Vec<ComponentRef>) -> Self {
    Self {
      id: ComponentId::new("parallel"),
      children,
      accumulation: ParamsAccumulation::Append,
    }
  }

  /// Switches params accumulation to index-wise mapping merge.
  pub fn pack_by_index(mut self) -> Self {
    self.accumulation = ParamsAccumulation::PackByIndex;
    self
  }

  pub fn shared(self) -> ComponentRef {
    Arc::new(self)
  }
}

impl Component for Parallel {
  fn id(&self) -> &ComponentId {
    &self.id
  }

  /// Sum of children's arities (unbounded if any child is), context always
  /// accepted.
  fn signature(&self) -> Signature {
    let arity = self
      .children
      .iter()
      .fold(Arity::Fixed(0), |acc, child| acc.sum(child.signature().arity));
    Signature::new(arity, true)
  }

  fn call(&self, params: &[Value], context: &Map) -> Outcome {
    distribute(&self.id, &self.children, params, context, false, self.accumulation)
  }
}

/// The distribution walk shared by Parallel and Split.
pub(crate) fn distribute(
  id: &ComponentId,
  children: &[ComponentRef],
  params: &[Value],
  context: &Map,
  fail_fast: bool,
  accumulation: ParamsAccumulation,
) -> Outcome {
  let walk_span = span!(Level::DEBUG, "distribute", component = %id, children = children.len(), fail_fast);
  let _guard = walk_span.enter();

  let fan_out = params.len() == 1;
  let mut remaining: Vec<Value> = params.to_vec();
  let mut acc = Outcome::succeeded(id.clone(), Vec::new(), context.clone());
  let mut acc_params: Vec<Value> = Vec::new();

  for child in children {
    if acc.is_shortcut() {
      event!(Level::INFO, "stopping: accumulator carries a shortcut");
      break;
    }

    let slice: Vec<Value> = if fan_out {
      // The single param is handed to every child without being consumed.
      remaining.clone()
    } else {
      let take = child.signature().arity.take(remaining.len());
      remaining.drain(..take).collect()
    };

    let child_span = span!(Level::TRACE, "distributed_child", component = %child.id());
    let _child_guard = child_span.enter();
    let child_outcome = child.call(&slice, acc.context());

    let child_params = child_outcome.params().to_vec();
    acc_params = match accumulation {
      ParamsAccumulation::Append => {
        let mut merged = acc_params;
        merged.extend(child_params);
        merged
      }
      ParamsAccumulation::PackByIndex => pack_by_index(acc_params, child_params),
    };

    // Params are accumulated above; blank them so `merge` does not adopt
    // this child's params wholesale.
    acc = acc.merge(child_outcome.apply(Changes {
      params: Some(Vec::new()),
      ..Changes::default()
    }));

    if fail_fast && acc.failure() {
      event!(Level::DEBUG, "stopping: child failed under fail-fast distribution");
      break;
    }
  }

  if !fan_out {
    acc_params.extend(remaining);
  }

  acc.apply(Changes {
    params: Some(acc_params),
    ..Changes::default()
  })
}

fn pack_by_index(acc: Vec<Value>, child: Vec<Value>) -> Vec<Value> {
  let len = acc.len().max(child.len());
  let mut packed = Vec::with_capacity(len);
  let mut acc = acc.into_iter();
  let mut child = child.into_iter();
  for _ in 0..len {
    packed.push(match (acc.next(), child.next()) {
      (Some(Value::Object(base)), Some(Value::Object(overlay))) => {
        let mut merged = base;
        merged.extend(overlay);
        Value::Object(merged)
      }
      // Later children win when the slot is not mergeable.
      (_, Some(overlay)) => overlay,
      (Some(base), None) => base,
      (None, None) => Value::Null,
    });
  }
  packed
}
