// operon/src/transaction/mod.rs

//! Transactional side-effect staging: wraps a sub-pipeline in a database
//! transaction scope and orchestrates ordered pre/post callbacks.

pub mod manager;
pub mod pool;

use crate::core::component::{Component, ComponentId, ComponentRef};
use crate::core::failure::Failure;
use crate::core::outcome::{CallbackState, Changes, Outcome};
use crate::core::signature::Signature;
use crate::core::value::{Map, Value};
use self::manager::{TransactionManager, TxDisposition};
use self::pool::{CallbackHandle, SyncModeGuard};
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::{event, span, Level};

/// Hook invoked with the child outcome after a rollback.
pub type FailureHook = Arc<dyn Fn(&Outcome) -> Outcome + Send + Sync>;

/// Wraps one child in a database transaction and manages side-effect
/// callbacks.
///
/// - Child shortcut: commit, no callbacks fire.
/// - Child failure: rollback, then each `on_failure` hook runs synchronously
///   in declaration order; its outcome is appended to the result's
///   `on_failure` list.
/// - Child success: commit, then `on_success` callbacks are scheduled in
///   declaration order per the thread-local callback mode captured at
///   scheduling time. Sync mode runs them inline and appends settled
///   outcomes; async mode submits them to the global worker pool and appends
///   pending handles. A failing callback never rolls the transaction back.
pub struct Transaction {
  id: ComponentId,
  child: ComponentRef,
  manager: Arc<dyn TransactionManager>,
  on_success: Vec<ComponentRef>,
  on_failure: Vec<FailureHook>,
}

impl Transaction {
  pub fn new(child: ComponentRef, manager: Arc<dyn TransactionManager>) -> Self {
    Self {
      id: ComponentId::new("transaction"),
      child,
      manager,
      on_success: Vec::new(),
      on_failure: Vec::new(),
    }
  }

  /// Appends a post-commit callback, invoked with the child outcome's
  /// params and context.
  pub fn on_success(mut self, callback: ComponentRef) -> Self {
    self.on_success.push(callback);
    self
  }

  /// Appends a post-rollback hook, invoked with the whole child outcome.
  pub fn on_failure(mut self, hook: impl Fn(&Outcome) -> Outcome + Send + Sync + 'static) -> Self {
    self.on_failure.push(Arc::new(hook));
    self
  }

  pub fn shared(self) -> ComponentRef {
    Arc::new(self)
  }

  fn run_failure_hooks(&self, child: &Outcome) -> Vec<CallbackState> {
    self
      .on_failure
      .iter()
      .map(|hook| CallbackState::Settled(hook(child)))
      .collect()
  }

  fn schedule_success_callbacks(&self, child: &Outcome) -> Vec<CallbackState> {
    let sync_mode = pool::sync_callbacks();
    event!(Level::DEBUG, sync_mode, callbacks = self.on_success.len(), "scheduling post-commit callbacks");

    if sync_mode {
      return self
        .on_success
        .iter()
        .map(|callback| CallbackState::Settled(callback.call(child.params(), child.context())))
        .collect();
    }

    let mut states = Vec::with_capacity(self.on_success.len());
    for callback in &self.on_success {
      let handle = CallbackHandle::new();
      let job_handle = handle.clone();
      let job_callback = Arc::clone(callback);
      let job_params: Vec<Value> = child.params().to_vec();
      let job_context: Map = child.context().clone();

      let job = move || {
        // Nested transactions inside the callback must see the mode that
        // was in force when this callback was scheduled.
        let _mode = SyncModeGuard::set(sync_mode);
        match catch_unwind(AssertUnwindSafe(|| job_callback.call(&job_params, &job_context))) {
          Ok(outcome) => job_handle.settle(outcome),
          Err(payload) => {
            let failed = Outcome::failed(
              job_callback.id().clone(),
              vec![Failure::message("post-commit callback panicked")],
            );
            job_handle.settle(failed);
            // Re-raise on a detached thread so external error tracking
            // observes the original panic; the pipeline proceeds.
            thread::spawn(move || resume_unwind(payload));
          }
        }
      };

      match pool::global().submit(job) {
        Ok(()) => states.push(CallbackState::Pending(handle)),
        Err(err) => {
          // Pool already shut down: degrade to inline execution rather than
          // dropping the callback.
          event!(Level::WARN, error = %err, "callback pool unavailable, running callback inline");
          states.push(CallbackState::Settled(callback.call(child.params(), child.context())));
        }
      }
    }
    states
  }
}

impl Component for Transaction {
  fn id(&self) -> &ComponentId {
    &self.id
  }

  fn signature(&self) -> Signature {
    self.child.signature()
  }

  fn call(&self, params: &[Value], context: &Map) -> Outcome {
    let tx_span = span!(Level::DEBUG, "transaction", component = %self.id);
    let _guard = tx_span.enter();

    let mut child_outcome: Option<Outcome> = None;
    self.manager.transaction(&mut || {
      let outcome = self.child.call(params, context);
      let disposition = if outcome.failure() {
        TxDisposition::Rollback
      } else {
        TxDisposition::Commit
      };
      child_outcome = Some(outcome);
      disposition
    });

    let outcome = match child_outcome {
      Some(outcome) => outcome,
      None => {
        // Contract violation by the manager, surfaced as a failure rather
        // than a panic so the pipeline stays inspectable.
        event!(Level::ERROR, "transaction manager did not invoke the transaction body");
        return Outcome::failed(
          self.id.clone(),
          vec![Failure::message("transaction manager did not invoke the transaction body")
            .with_producer(self.id.clone())],
        );
      }
    };

    if outcome.is_shortcut() {
      event!(Level::INFO, "child short-circuited, committed without callbacks");
      return outcome;
    }

    if outcome.failure() {
      event!(Level::DEBUG, errors = outcome.errors().len(), "child failed, rolled back");
      let mut on_failure = outcome.on_failure().to_vec();
      on_failure.extend(self.run_failure_hooks(&outcome));
      return outcome.apply(Changes {
        on_failure: Some(on_failure),
        ..Changes::default()
      });
    }

    let mut on_success = outcome.on_success().to_vec();
    on_success.extend(self.schedule_success_callbacks(&outcome));
    outcome.apply(Changes {
      on_success: Some(on_success),
      ..Changes::default()
    })
  }
}
