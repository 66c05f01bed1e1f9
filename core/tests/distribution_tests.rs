// tests/distribution_tests.rs
//
// Params-distribution algebra: Parallel slicing, fan-out, leftovers,
// pack_by_index, Split's fail-fast policy, Fanout broadcast, and Either.

mod common;

use common::*;
use operon::{Arity, Component, Either, Failure, Fanout, Parallel, Split, Step, StepFailure, StepSuccess};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A step of the given arity that echoes its param slice back tagged with a
/// label, so slicing is observable from the outside.
fn echo_step(label: &'static str, arity: usize) -> operon::ComponentRef {
  Step::new(label, arity, move |params, _context| {
    Ok(StepSuccess::params(
      vec![json!({ "seen_by": label, "count": params.len() })],
      operon::Map::new(),
    ))
  })
  .shared()
}

#[test]
fn parallel_slices_params_by_arity_in_order() {
  setup_tracing();
  let first = Step::new("first", 1, |params, _context| {
    assert_eq!(params, &[json!("a")]);
    Ok(StepSuccess::empty())
  })
  .shared();
  let second = Step::new("second", 2, |params, _context| {
    assert_eq!(params, &[json!("b"), json!("c")]);
    Ok(StepSuccess::empty())
  })
  .shared();

  let parallel = Parallel::new(vec![first, second]);
  let outcome = parallel.call(&[json!("a"), json!("b"), json!("c")], &operon::Map::new());
  assert!(outcome.success());
}

#[test]
fn parallel_fans_out_a_single_param_to_every_child() {
  setup_tracing();
  let seen = Arc::new(AtomicUsize::new(0));
  let watcher = |seen: Arc<AtomicUsize>| {
    Step::new("watcher", 1, move |params, _context| {
      assert_eq!(params, &[json!({"title": "Hi"})]);
      seen.fetch_add(1, Ordering::SeqCst);
      Ok(StepSuccess::empty())
    })
    .shared()
  };

  let parallel = Parallel::new(vec![watcher(seen.clone()), watcher(seen.clone()), watcher(seen.clone())]);
  let outcome = parallel.call(&[json!({"title": "Hi"})], &operon::Map::new());

  assert!(outcome.success());
  assert_eq!(seen.load(Ordering::SeqCst), 3);
}

#[test]
fn parallel_appends_unconsumed_params_as_leftovers() {
  setup_tracing();
  let parallel = Parallel::new(vec![echo_step("only", 1)]);
  let outcome = parallel.call(&[json!("a"), json!("b"), json!("c")], &operon::Map::new());

  assert!(outcome.success());
  assert_eq!(
    outcome.params(),
    &[json!({"seen_by": "only", "count": 1}), json!("b"), json!("c")]
  );
}

#[test]
fn parallel_collects_errors_from_every_child() {
  setup_tracing();
  let parallel = Parallel::new(vec![
    failing_step("bad_one", Failure::code("first")),
    failing_step("bad_two", Failure::code("second")),
  ]);

  let outcome = parallel.call(&[json!({}), json!({})], &operon::Map::new());
  assert!(outcome.failure());
  let codes: Vec<_> = outcome.errors().iter().map(|e| e.code.as_deref()).collect();
  assert_eq!(codes, vec![Some("first"), Some("second")]);
}

#[test]
fn parallel_pack_by_index_merges_mappings_per_slot() {
  setup_tracing();
  let left = Step::new("left", 1, |_params, _context| {
    Ok(StepSuccess::params(
      vec![json!({"a": 1, "shared": "left"}), json!({"tail": true})],
      operon::Map::new(),
    ))
  })
  .shared();
  let right = Step::new("right", 1, |_params, _context| {
    Ok(StepSuccess::params(
      vec![json!({"b": 2, "shared": "right"})],
      operon::Map::new(),
    ))
  })
  .shared();

  let parallel = Parallel::new(vec![left, right]).pack_by_index();
  let outcome = parallel.call(&[json!({}), json!({})], &operon::Map::new());

  assert!(outcome.success());
  // Slot 0 merges key-wise with the later child winning; slot 1 falls back
  // to the longer side.
  assert_eq!(
    outcome.params(),
    &[json!({"a": 1, "shared": "right", "b": 2}), json!({"tail": true})]
  );
}

#[test]
fn parallel_signature_sums_child_arities() {
  setup_tracing();
  let parallel = Parallel::new(vec![echo_step("one", 1), echo_step("two", 2)]);
  assert_eq!(parallel.signature().arity, Arity::Fixed(3));
  assert!(parallel.signature().accepts_context);

  let unbounded = Parallel::new(vec![
    echo_step("one", 1),
    Step::all_params("rest", |_p, _c| Ok(StepSuccess::empty())).shared(),
  ]);
  assert_eq!(unbounded.signature().arity, Arity::Unbounded);
}

#[test]
fn split_stops_at_first_failure() {
  setup_tracing();
  let after = Arc::new(AtomicUsize::new(0));
  let split = Split::new(vec![
    failing_step("bad", Failure::code("boom")),
    tally_step("never", 1, after.clone()),
  ]);

  let outcome = split.call(&[json!({}), json!({})], &operon::Map::new());
  assert!(outcome.failure());
  assert_eq!(outcome.errors().len(), 1);
  assert_eq!(after.load(Ordering::SeqCst), 0);
}

#[test]
fn fanout_broadcasts_the_same_params_to_every_child() {
  setup_tracing();
  let fanout = Fanout::new(vec![
    validate_presence("validate_title", "title"),
    validate_presence("validate_body", "body"),
  ]);

  let outcome = fanout.call(&[json!({"title": "", "body": ""})], &operon::Map::new());

  assert!(outcome.failure());
  let paths: Vec<_> = outcome.errors().iter().map(|e| e.path.clone()).collect();
  assert_eq!(paths, vec![operon::path!["title"], operon::path!["body"]]);
}

#[test]
fn fanout_appends_child_params_in_order() {
  setup_tracing();
  let fanout = Fanout::new(vec![echo_step("left", 1), echo_step("right", 1)]);
  let outcome = fanout.call(&[json!({"x": 1}), json!({"ignored": true})], &operon::Map::new());

  assert!(outcome.success());
  assert_eq!(
    outcome.params(),
    &[
      json!({"seen_by": "left", "count": 1}),
      json!({"seen_by": "right", "count": 1})
    ]
  );
}

#[test]
fn fanout_signature_is_max_of_fixed_arities() {
  setup_tracing();
  let fanout = Fanout::new(vec![
    echo_step("one", 1),
    echo_step("three", 3),
    Step::all_params("rest", |_p, _c| Ok(StepSuccess::empty())).shared(),
  ]);
  assert_eq!(fanout.signature().arity, Arity::Fixed(3));

  let all_unbounded = Fanout::new(vec![Step::all_params("rest", |_p, _c| Ok(StepSuccess::empty())).shared()]);
  assert_eq!(all_unbounded.signature().arity, Arity::Unbounded);
}

#[test]
fn either_returns_first_success_and_skips_the_rest() {
  setup_tracing();
  let tried_after = Arc::new(AtomicUsize::new(0));
  let either = Either::new(vec![
    failing_step("primary", Failure::code("down")),
    context_step("secondary", json!({"via": "secondary"})),
    tally_step("tertiary", 1, tried_after.clone()),
  ]);

  let outcome = either.call(&[json!({})], &operon::Map::new());

  assert!(outcome.success());
  assert_eq!(outcome.context(), &obj(json!({"via": "secondary"})));
  assert_eq!(outcome.operation(), Some(either.id()));
  assert_eq!(tried_after.load(Ordering::SeqCst), 0, "no child runs after the first success");
}

#[test]
fn either_returns_the_last_failure_when_nothing_succeeds() {
  setup_tracing();
  let either = Either::new(vec![
    failing_step("first", Failure::code("first")),
    failing_step("last", Failure::code("last")),
  ]);

  let outcome = either.call(&[json!({})], &operon::Map::new());
  assert!(outcome.failure());
  assert_eq!(outcome.errors().len(), 1);
  assert_eq!(outcome.errors()[0].code.as_deref(), Some("last"));
}

#[test]
fn every_combinator_is_neutral_on_no_op_children() {
  setup_tracing();
  // P4: children returning success with no deltas leave no params delta.
  let noop = || Step::new("noop", 1, |_p, _c| Ok(StepSuccess::empty())).shared();

  for outcome in [
    Parallel::new(vec![noop(), noop()]).call(&[json!({"a": 1}), json!({"b": 2})], &operon::Map::new()),
    Split::new(vec![noop(), noop()]).call(&[json!({"a": 1}), json!({"b": 2})], &operon::Map::new()),
    Fanout::new(vec![noop(), noop()]).call(&[json!({"a": 1})], &operon::Map::new()),
  ] {
    assert!(outcome.success());
    assert!(outcome.context().is_empty());
  }
}

#[test]
fn failing_step_arity_matches_split_slicing() {
  setup_tracing();
  // Split consumes slices exactly like Parallel even under failure.
  let first = Step::new("first", 1, |params, _context| {
    assert_eq!(params, &[json!("a")]);
    Err(StepFailure::code("boom"))
  })
  .shared();
  let split = Split::new(vec![first, echo_step("second", 1)]);

  let outcome = split.call(&[json!("a"), json!("b")], &operon::Map::new());
  assert!(outcome.failure());
  // The second slice was never consumed; it returns as leftover params.
  assert_eq!(outcome.params(), &[json!("b")]);
}
