// operon/src/transaction/pool.rs

//! The process-global callback worker pool and the thread-local sync/async
//! callback mode.
//!
//! The pipeline itself never touches this module; only `Transaction` does,
//! when it dispatches post-commit callbacks in async mode. The pool is
//! lazily initialized, sized from `CALLBACK_THREADS` (default 1), has an
//! unbounded queue, and offers an idempotent shutdown that waits up to a
//! grace period before detaching stragglers.

use crate::core::outcome::Outcome;
use crate::error::{OperonError, OperonResult};
use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};
use std::cell::Cell;
use std::fmt;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{event, Level};

/// Environment variable sizing the pool. Positive integer, default 1.
pub const CALLBACK_THREADS_VAR: &str = "CALLBACK_THREADS";

type Job = Box<dyn FnOnce() + Send + 'static>;

// --- Pending callback handles ---

struct HandleState {
  slot: Mutex<Option<Outcome>>,
  ready: Condvar,
}

/// A pending async-mode callback result. Cloneable; all clones observe the
/// same settlement.
#[derive(Clone)]
pub struct CallbackHandle {
  state: Arc<HandleState>,
}

impl CallbackHandle {
  pub(crate) fn new() -> Self {
    Self {
      state: Arc::new(HandleState {
        slot: Mutex::new(None),
        ready: Condvar::new(),
      }),
    }
  }

  pub(crate) fn settle(&self, outcome: Outcome) {
    let mut slot = self.state.slot.lock();
    *slot = Some(outcome);
    self.state.ready.notify_all();
  }

  /// Blocks until the callback has run, then returns its outcome.
  pub fn wait(&self) -> Outcome {
    let mut slot = self.state.slot.lock();
    while slot.is_none() {
      self.state.ready.wait(&mut slot);
    }
    slot.as_ref().cloned().unwrap_or_else(Outcome::empty)
  }

  /// Blocks up to `timeout`; `None` if the callback has still not settled.
  pub fn wait_timeout(&self, timeout: Duration) -> Option<Outcome> {
    let deadline = Instant::now() + timeout;
    let mut slot = self.state.slot.lock();
    while slot.is_none() {
      if self.state.ready.wait_until(&mut slot, deadline).timed_out() {
        return slot.clone();
      }
    }
    slot.clone()
  }

  /// Non-blocking probe.
  pub fn try_get(&self) -> Option<Outcome> {
    self.state.slot.lock().clone()
  }

  /// Identity comparison: two handles are the same iff they settle together.
  pub fn same(&self, other: &CallbackHandle) -> bool {
    Arc::ptr_eq(&self.state, &other.state)
  }
}

impl fmt::Debug for CallbackHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let settled = self.state.slot.lock().is_some();
    f.debug_struct("CallbackHandle").field("settled", &settled).finish()
  }
}

// --- The worker pool ---

struct PoolState {
  sender: Option<mpsc::Sender<Job>>,
  workers: Vec<thread::JoinHandle<()>>,
}

/// Fixed-size thread pool with an unbounded queue.
pub struct CallbackPool {
  state: Mutex<PoolState>,
}

impl fmt::Debug for CallbackPool {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CallbackPool").finish_non_exhaustive()
  }
}

impl CallbackPool {
  /// Builds a pool with an explicit thread count.
  pub fn new(threads: usize) -> OperonResult<Self> {
    if threads == 0 {
      return Err(OperonError::PoolConfiguration {
        value: "0".to_string(),
      });
    }

    let (sender, receiver) = mpsc::channel::<Job>();
    let receiver = Arc::new(Mutex::new(receiver));

    let mut workers = Vec::with_capacity(threads);
    for index in 0..threads {
      let receiver = Arc::clone(&receiver);
      let handle = thread::Builder::new()
        .name(format!("operon-callback-{}", index))
        .spawn(move || loop {
          // The lock guard must not outlive the recv call, or one idle
          // worker would starve the others.
          let job = { receiver.lock().recv() };
          match job {
            Ok(job) => job(),
            Err(_) => break, // Sender dropped: pool shut down.
          }
        })
        .map_err(|err| OperonError::Internal(format!("failed to spawn callback worker: {}", err)))?;
      workers.push(handle);
    }

    event!(Level::DEBUG, threads, "callback pool initialized");
    Ok(Self {
      state: Mutex::new(PoolState {
        sender: Some(sender),
        workers,
      }),
    })
  }

  /// Builds a pool sized from `CALLBACK_THREADS` (default 1). Non-integer or
  /// non-positive values are a configuration error.
  pub fn from_env() -> OperonResult<Self> {
    let threads = match std::env::var(CALLBACK_THREADS_VAR) {
      Ok(raw) => match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => {
          return Err(OperonError::PoolConfiguration { value: raw });
        }
      },
      Err(_) => 1,
    };
    Self::new(threads)
  }

  /// Enqueues a job. Fails once the pool has been shut down.
  pub fn submit(&self, job: impl FnOnce() + Send + 'static) -> OperonResult<()> {
    let state = self.state.lock();
    match &state.sender {
      Some(sender) => sender
        .send(Box::new(job))
        .map_err(|_| OperonError::Internal("callback pool is shut down".to_string())),
      None => Err(OperonError::Internal("callback pool is shut down".to_string())),
    }
  }

  /// Stops accepting work, waits up to `grace` for queued jobs to drain,
  /// then detaches whatever is still running. Safe to call repeatedly.
  pub fn shutdown(&self, grace: Duration) {
    let workers = {
      let mut state = self.state.lock();
      if state.sender.take().is_none() && state.workers.is_empty() {
        return;
      }
      std::mem::take(&mut state.workers)
    };

    let deadline = Instant::now() + grace;
    for handle in workers {
      while !handle.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
      }
      if handle.is_finished() {
        let _ = handle.join();
      } else {
        event!(Level::WARN, "callback worker did not drain within the grace period, detaching");
        drop(handle);
      }
    }
    event!(Level::DEBUG, "callback pool shut down");
  }
}

static GLOBAL_POOL: Lazy<CallbackPool> = Lazy::new(|| {
  CallbackPool::from_env().unwrap_or_else(|err| panic!("operon setup error: {}", err))
});

/// The process-global pool used by async-mode transaction callbacks.
pub fn global() -> &'static CallbackPool {
  &GLOBAL_POOL
}

/// Shuts the global pool down if it was ever initialized. Idempotent.
pub fn shutdown_global(grace: Duration) {
  if let Some(pool) = Lazy::get(&GLOBAL_POOL) {
    pool.shutdown(grace);
  }
}

// --- The sync/async callback mode flag ---

thread_local! {
  static SYNC_CALLBACKS: Cell<bool> = const { Cell::new(false) };
}

/// Current value of the thread-local callback mode.
pub fn sync_callbacks() -> bool {
  SYNC_CALLBACKS.with(|flag| flag.get())
}

/// Restores the previous mode on drop, so the flag survives early returns
/// and unwinding alike.
pub(crate) struct SyncModeGuard {
  previous: bool,
}

impl SyncModeGuard {
  pub(crate) fn set(value: bool) -> Self {
    let previous = SYNC_CALLBACKS.with(|flag| flag.replace(value));
    Self { previous }
  }
}

impl Drop for SyncModeGuard {
  fn drop(&mut self) {
    SYNC_CALLBACKS.with(|flag| flag.set(self.previous));
  }
}

/// Runs `thunk` with the callback mode set to `value` for its dynamic
/// extent. Transactions read the flag once at the moment they schedule
/// callbacks; async callback bodies restore the captured value so nested
/// transactions inherit the mode.
pub fn with_sync_callbacks<T>(value: bool, thunk: impl FnOnce() -> T) -> T {
  let _guard = SyncModeGuard::set(value);
  thunk()
}
