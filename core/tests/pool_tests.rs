// tests/pool_tests.rs
//
// The pool reads process environment; serialized to keep env mutation safe.

mod common;

use common::*;
use operon::{CallbackPool, OperonError, CALLBACK_THREADS_VAR};
use parking_lot::Mutex;
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;

#[test]
#[serial]
fn pool_defaults_to_one_thread_without_the_env_var() {
  setup_tracing();
  std::env::remove_var(CALLBACK_THREADS_VAR);
  let pool = CallbackPool::from_env().expect("default configuration is valid");
  pool.shutdown(Duration::from_secs(1));
}

#[test]
#[serial]
fn pool_rejects_non_integer_thread_counts() {
  setup_tracing();
  std::env::set_var(CALLBACK_THREADS_VAR, "plenty");
  let error = CallbackPool::from_env().expect_err("non-integer must fail");
  std::env::remove_var(CALLBACK_THREADS_VAR);

  match error {
    OperonError::PoolConfiguration { value } => assert_eq!(value, "plenty"),
    other => panic!("unexpected error: {}", other),
  }
}

#[test]
#[serial]
fn pool_rejects_zero_threads() {
  setup_tracing();
  std::env::set_var(CALLBACK_THREADS_VAR, "0");
  let error = CallbackPool::from_env().expect_err("zero must fail");
  std::env::remove_var(CALLBACK_THREADS_VAR);
  assert!(matches!(error, OperonError::PoolConfiguration { .. }));
}

#[test]
#[serial]
fn pool_runs_submitted_jobs_and_drains_on_shutdown() {
  setup_tracing();
  std::env::set_var(CALLBACK_THREADS_VAR, "2");
  let pool = CallbackPool::from_env().expect("two workers");
  std::env::remove_var(CALLBACK_THREADS_VAR);

  let seen = Arc::new(Mutex::new(Vec::new()));
  for index in 0..8 {
    let seen = seen.clone();
    pool.submit(move || seen.lock().push(index)).expect("pool accepts work");
  }

  pool.shutdown(Duration::from_secs(5));
  let mut done = seen.lock().clone();
  done.sort_unstable();
  assert_eq!(done, (0..8).collect::<Vec<_>>());
}

#[test]
#[serial]
fn shutdown_is_idempotent_and_rejects_new_work() {
  setup_tracing();
  let pool = CallbackPool::new(1).expect("one worker");
  pool.shutdown(Duration::from_secs(1));
  pool.shutdown(Duration::from_secs(1));

  assert!(pool.submit(|| {}).is_err(), "a shut-down pool accepts no work");
}
