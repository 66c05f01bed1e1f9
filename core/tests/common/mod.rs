// tests/common/mod.rs
#![allow(dead_code)] // Allow unused helpers in this common test module

use once_cell::sync::Lazy;
use operon::{
  ComponentRef, Failure, FetchMany, FetchOne, Map, Step, StepFailure, StepSuccess, TransactionManager,
  TxDisposition, Value,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::Level;

// --- Tracing Setup (call once per test run if needed) ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Value helpers ---

/// Unwraps a `json!` object literal into a `Map`.
pub fn obj(value: Value) -> Map {
  value.as_object().cloned().expect("expected a JSON object literal")
}

// --- Common step builders ---

/// A step that counts its invocations and succeeds with no deltas.
pub fn tally_step(label: &'static str, arity: usize, counter: Arc<AtomicUsize>) -> ComponentRef {
  Step::new(label, arity, move |_params, _context| {
    counter.fetch_add(1, Ordering::SeqCst);
    Ok(StepSuccess::empty())
  })
  .shared()
}

/// A step that merges a fixed context delta into the pipeline.
pub fn context_step(label: &'static str, delta: Value) -> ComponentRef {
  let delta = obj(delta);
  Step::with_context(label, move |_context| Ok(StepSuccess::context(delta.clone()))).shared()
}

/// A step that always fails with one coded failure at the given path.
pub fn failing_step(label: &'static str, failure: Failure) -> ComponentRef {
  Step::new(label, 1, move |_params, _context| Err(StepFailure::One(failure.clone()))).shared()
}

/// A step validating that `field` of its single param mapping is a non-empty
/// string, failing with `{code: blank, path: [field]}` otherwise.
pub fn validate_presence(label: &'static str, field: &'static str) -> ComponentRef {
  Step::new(label, 1, move |params, _context| {
    let present = params
      .first()
      .and_then(Value::as_object)
      .and_then(|map| map.get(field))
      .and_then(Value::as_str)
      .map(|text| !text.is_empty())
      .unwrap_or(false);
    if present {
      Ok(StepSuccess::empty())
    } else {
      Err(StepFailure::One(
        Failure::code(operon::codes::BLANK).at(vec![operon::Atom::Key(field.to_string())]),
      ))
    }
  })
  .shared()
}

// --- Recording repository fake ---

/// In-memory repository that records every attribute lookup it receives.
/// Entities are JSON objects matched field-by-field against the attrs.
pub struct RecordingRepo {
  pub entities: Vec<Value>,
  pub calls: Mutex<Vec<Vec<(String, Value)>>>,
}

impl RecordingRepo {
  pub fn new(entities: Vec<Value>) -> Arc<Self> {
    Arc::new(Self {
      entities,
      calls: Mutex::new(Vec::new()),
    })
  }

  pub fn call_count(&self) -> usize {
    self.calls.lock().len()
  }

  pub fn last_call(&self) -> Option<Vec<(String, Value)>> {
    self.calls.lock().last().cloned()
  }
}

impl FetchOne for RecordingRepo {
  fn get_one(&self, attrs: &[(String, Value)]) -> Option<Value> {
    self.calls.lock().push(attrs.to_vec());
    self
      .entities
      .iter()
      .find(|entity| {
        attrs.iter().all(|(column, value)| {
          entity.as_object().and_then(|map| map.get(column)) == Some(value)
        })
      })
      .cloned()
  }
}

impl FetchMany for RecordingRepo {
  fn get_many(&self, attrs: &[(String, Value)]) -> Vec<Value> {
    self.calls.lock().push(attrs.to_vec());
    let Some((column, Value::Array(ids))) = attrs.first() else {
      return Vec::new();
    };
    self
      .entities
      .iter()
      .filter(|entity| {
        entity
          .as_object()
          .and_then(|map| map.get(column))
          .map(|id| ids.contains(id))
          .unwrap_or(false)
      })
      .cloned()
      .collect()
  }
}

// --- Recording transaction manager fake ---

/// Transaction manager that records scope lifecycles in order. Every call
/// opens a fresh scope, so nesting shows up as interleaved begin events.
#[derive(Default)]
pub struct RecordingTx {
  pub events: Mutex<Vec<String>>,
}

impl RecordingTx {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn events(&self) -> Vec<String> {
    self.events.lock().clone()
  }
}

impl TransactionManager for RecordingTx {
  fn transaction(&self, body: &mut dyn FnMut() -> TxDisposition) -> TxDisposition {
    self.events.lock().push("begin".to_string());
    let disposition = body();
    self.events.lock().push(
      match disposition {
        TxDisposition::Commit => "commit",
        TxDisposition::Rollback => "rollback",
      }
      .to_string(),
    );
    disposition
  }
}
