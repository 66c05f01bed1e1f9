// operon/src/core/component.rs

//! The `Component` trait — anything that maps positional params plus a keyed
//! context to an [`Outcome`] — and the `Step` wrapper that adapts plain
//! closures into components.
//!
//! Components are constructed once at wiring time and shared as
//! [`ComponentRef`]s; their only per-call state is what they compute and
//! return. Arity is declared explicitly at construction (one constructor per
//! dispatch shape) rather than inferred by runtime reflection, so parameter
//! distribution is fully determined before the first call.

use crate::core::failure::Failure;
use crate::core::outcome::Outcome;
use crate::core::signature::Signature;
use crate::core::value::{Map, Value};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// --- Component identity ---

static NEXT_COMPONENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Identity of a constructed component.
///
/// Stands in for the source's "reference to the producing component": it is
/// what outcomes record as `operation` and `shortcut`, what failures carry as
/// `producer`, and what tracing spans are labelled with. Two ids are equal
/// iff they were handed out by the same construction.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentId {
  seq: u64,
  label: String,
}

impl ComponentId {
  pub fn new(label: impl Into<String>) -> Self {
    Self {
      seq: NEXT_COMPONENT_SEQ.fetch_add(1, Ordering::Relaxed),
      label: label.into(),
    }
  }

  pub fn label(&self) -> &str {
    &self.label
  }
}

impl PartialEq for ComponentId {
  fn eq(&self, other: &Self) -> bool {
    self.seq == other.seq
  }
}

impl Eq for ComponentId {}

impl std::hash::Hash for ComponentId {
  fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
    self.seq.hash(state);
  }
}

impl fmt::Display for ComponentId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}#{}", self.label, self.seq)
  }
}

// --- The component interface ---

/// Anything that maps `(params, context)` to an [`Outcome`].
///
/// Combinators implement this directly; raw closures are adapted via
/// [`Step`]. Implementations must be safe to call concurrently — the engine
/// itself is single-threaded, but transaction callbacks may run components
/// on the worker pool.
pub trait Component: Send + Sync {
  fn id(&self) -> &ComponentId;

  fn signature(&self) -> Signature;

  fn call(&self, params: &[Value], context: &Map) -> Outcome;
}

/// Shared handle to a wired component.
pub type ComponentRef = Arc<dyn Component>;

// --- Return-value normalization ---

/// Successful payload of a step closure, normalized into the params and
/// context deltas of the produced outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepSuccess {
  pub params: Vec<Value>,
  pub context: Map,
}

impl StepSuccess {
  /// Success with no params delta and no context delta.
  pub fn empty() -> Self {
    Self::default()
  }

  /// Success carrying only a context mapping.
  pub fn context(context: Map) -> Self {
    Self {
      params: Vec::new(),
      context,
    }
  }

  /// Success carrying positional values followed by a context mapping.
  pub fn params(params: Vec<Value>, context: Map) -> Self {
    Self { params, context }
  }
}

/// Failing payload of a step closure. Every shape normalizes to one or more
/// [`Failure`] records on the produced outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum StepFailure {
  /// A symbolic code, e.g. `blank`.
  Code(String),
  /// A human-readable message.
  Message(String),
  /// A fully-formed failure record.
  One(Failure),
  /// Several failure records.
  Many(Vec<Failure>),
}

impl StepFailure {
  pub fn code(code: impl Into<String>) -> Self {
    StepFailure::Code(code.into())
  }

  pub fn message(message: impl Into<String>) -> Self {
    StepFailure::Message(message.into())
  }

  /// Normalizes any failing payload shape into failure records. Useful for
  /// embedding components that assemble their own outcomes.
  pub fn into_failures(self) -> Vec<Failure> {
    match self {
      StepFailure::Code(code) => vec![Failure::code(code)],
      StepFailure::Message(message) => vec![Failure::message(message)],
      StepFailure::One(failure) => vec![failure],
      StepFailure::Many(failures) => failures,
    }
  }
}

impl From<Failure> for StepFailure {
  fn from(failure: Failure) -> Self {
    StepFailure::One(failure)
  }
}

impl From<Vec<Failure>> for StepFailure {
  fn from(failures: Vec<Failure>) -> Self {
    StepFailure::Many(failures)
  }
}

/// What a step closure returns; `Err` short-circuits enclosing fail-fast
/// combinators.
pub type StepResult = Result<StepSuccess, StepFailure>;

// --- Step: the raw-callable wrapper ---

type NormalizedFn = Box<dyn Fn(&[Value], &Map) -> StepResult + Send + Sync>;
type RawFn = Box<dyn Fn(&[Value], &Map) -> Outcome + Send + Sync>;

enum StepBody {
  Normalized(NormalizedFn),
  Raw(RawFn),
}

/// Adapts a plain closure into a [`Component`] with an explicitly declared
/// signature. Incoming params are truncated to the declared arity before the
/// closure runs; the closure's return value is normalized into an
/// [`Outcome`] carrying this step's identity.
pub struct Step {
  id: ComponentId,
  signature: Signature,
  body: StepBody,
}

impl Step {
  /// `(0, true)`: the closure reads the context only.
  pub fn with_context(
    label: impl Into<String>,
    f: impl Fn(&Map) -> StepResult + Send + Sync + 'static,
  ) -> Self {
    Self {
      id: ComponentId::new(label),
      signature: Signature::context_only(),
      body: StepBody::Normalized(Box::new(move |_params, context| f(context))),
    }
  }

  /// `(n, false)`: the closure consumes the first `arity` params and ignores
  /// the context.
  pub fn params(
    label: impl Into<String>,
    arity: usize,
    f: impl Fn(&[Value]) -> StepResult + Send + Sync + 'static,
  ) -> Self {
    Self {
      id: ComponentId::new(label),
      signature: Signature::fixed(arity, false),
      body: StepBody::Normalized(Box::new(move |params, _context| f(params))),
    }
  }

  /// `(n, true)`: the closure consumes the first `arity` params and the
  /// context.
  pub fn new(
    label: impl Into<String>,
    arity: usize,
    f: impl Fn(&[Value], &Map) -> StepResult + Send + Sync + 'static,
  ) -> Self {
    Self {
      id: ComponentId::new(label),
      signature: Signature::fixed(arity, true),
      body: StepBody::Normalized(Box::new(f)),
    }
  }

  /// `(*, true)`: the closure consumes all remaining params and the context.
  pub fn all_params(
    label: impl Into<String>,
    f: impl Fn(&[Value], &Map) -> StepResult + Send + Sync + 'static,
  ) -> Self {
    Self {
      id: ComponentId::new(label),
      signature: Signature::unbounded(),
      body: StepBody::Normalized(Box::new(f)),
    }
  }

  /// Passthrough form for closures that already produce an [`Outcome`].
  pub fn raw(
    label: impl Into<String>,
    signature: Signature,
    f: impl Fn(&[Value], &Map) -> Outcome + Send + Sync + 'static,
  ) -> Self {
    Self {
      id: ComponentId::new(label),
      signature,
      body: StepBody::Raw(Box::new(f)),
    }
  }

  /// Convenience: wires the step straight into a [`ComponentRef`].
  pub fn shared(self) -> ComponentRef {
    Arc::new(self)
  }

  fn normalize(&self, result: StepResult) -> Outcome {
    match result {
      Ok(success) => Outcome::succeeded(self.id.clone(), success.params, success.context),
      Err(failure) => {
        let errors = failure
          .into_failures()
          .into_iter()
          .map(|f| f.fill_producer(&self.id))
          .collect();
        Outcome::failed(self.id.clone(), errors)
      }
    }
  }
}

impl Component for Step {
  fn id(&self) -> &ComponentId {
    &self.id
  }

  fn signature(&self) -> Signature {
    self.signature
  }

  fn call(&self, params: &[Value], context: &Map) -> Outcome {
    let take = self.signature.arity.take(params.len());
    let slice = &params[..take];
    match &self.body {
      StepBody::Normalized(f) => self.normalize(f(slice, context)),
      StepBody::Raw(f) => f(slice, context),
    }
  }
}

impl fmt::Debug for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Step")
      .field("id", &self.id)
      .field("signature", &self.signature)
      .finish()
  }
}
