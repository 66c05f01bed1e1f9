// tests/outcome_tests.rs
mod common;

use common::*;
use operon::{Changes, Component, ComponentId, Failure, Map, Outcome, Step, StepSuccess, Value};
use serde_json::json;

#[test]
fn success_is_defined_as_no_errors() {
  setup_tracing();
  let op = ComponentId::new("op");

  let ok = Outcome::succeeded(op.clone(), Vec::new(), Map::new());
  assert!(ok.success());
  assert!(!ok.failure());

  let bad = Outcome::failed(op, vec![Failure::code("invalid")]);
  assert!(bad.failure());
  assert!(!bad.success());
}

#[test]
fn apply_with_no_changes_is_identity() {
  setup_tracing();
  let op = ComponentId::new("op");
  let outcome = Outcome::succeeded(op, vec![json!({"a": 1})], obj(json!({"k": "v"})));

  assert_eq!(outcome.apply(Changes::default()), outcome);
}

#[test]
fn merge_with_empty_outcome_preserves_everything() {
  setup_tracing();
  let op = ComponentId::new("op");
  let outcome = Outcome::succeeded(op, vec![json!({"a": 1})], obj(json!({"k": "v"})));

  let merged = outcome.merge(Outcome::empty());
  assert_eq!(merged.operation(), outcome.operation());
  assert_eq!(merged.params(), outcome.params());
  assert_eq!(merged.context(), outcome.context());
  assert!(merged.errors().is_empty());
}

#[test]
fn merge_keeps_own_operation_and_concatenates_errors() {
  setup_tracing();
  let left_op = ComponentId::new("left");
  let right_op = ComponentId::new("right");

  let left = Outcome::failed(left_op.clone(), vec![Failure::code("first")]);
  let right = Outcome::failed(right_op, vec![Failure::code("second")]);

  let merged = left.merge(right);
  assert_eq!(merged.operation(), Some(&left_op));
  let codes: Vec<_> = merged.errors().iter().map(|e| e.code.as_deref()).collect();
  assert_eq!(codes, vec![Some("first"), Some("second")]);
}

#[test]
fn merge_adopts_other_params_only_when_non_empty() {
  setup_tracing();
  let op = ComponentId::new("op");
  let base = Outcome::succeeded(op.clone(), vec![json!(1), json!(2)], Map::new());

  let kept = base.merge(Outcome::succeeded(op.clone(), Vec::new(), Map::new()));
  assert_eq!(kept.params(), &[json!(1), json!(2)]);

  let replaced = base.merge(Outcome::succeeded(op, vec![json!(3)], Map::new()));
  assert_eq!(replaced.params(), &[json!(3)]);
}

#[test]
fn merge_unions_context_with_other_winning() {
  setup_tracing();
  let op = ComponentId::new("op");
  let base = Outcome::succeeded(op.clone(), Vec::new(), obj(json!({"a": 1, "b": 1})));
  let other = Outcome::succeeded(op, Vec::new(), obj(json!({"b": 2, "c": 3})));

  let merged = base.merge(other);
  assert_eq!(merged.context(), &obj(json!({"a": 1, "b": 2, "c": 3})));
}

#[test]
fn merge_keeps_first_shortcut() {
  setup_tracing();
  let op = ComponentId::new("op");
  let first = ComponentId::new("first_shortcut");
  let second = ComponentId::new("second_shortcut");

  let with_first = Outcome::succeeded(op.clone(), Vec::new(), Map::new()).apply(Changes {
    shortcut: Some(first.clone()),
    ..Changes::default()
  });
  let with_second = Outcome::succeeded(op, Vec::new(), Map::new()).apply(Changes {
    shortcut: Some(second),
    ..Changes::default()
  });

  let merged = with_first.merge(with_second);
  assert_eq!(merged.shortcut(), Some(&first));
}

#[test]
fn into_result_wraps_context_on_success_and_errors_on_failure() {
  setup_tracing();
  let op = ComponentId::new("op");

  let ok = Outcome::succeeded(op.clone(), Vec::new(), obj(json!({"post": {"id": 1}})));
  assert_eq!(ok.into_result(), Ok(obj(json!({"post": {"id": 1}}))));

  let bad = Outcome::failed(op, vec![Failure::code("invalid")]);
  let errors = bad.into_result().unwrap_err();
  assert_eq!(errors.len(), 1);
  assert_eq!(errors[0].code.as_deref(), Some("invalid"));
}

#[test]
fn wrapped_callable_emits_normalized_params_and_context() {
  setup_tracing();
  let step = Step::new("emitter", 0, |_params, _context| {
    Ok(StepSuccess::params(
      vec![json!({"slot": 1})],
      obj(json!({"added": true})),
    ))
  });

  let outcome = step.call(&[], &Map::new());
  assert!(outcome.success());
  assert_eq!(outcome.params(), &[json!({"slot": 1})]);
  assert_eq!(outcome.context(), &obj(json!({"added": true})));
  assert_eq!(outcome.operation(), Some(step.id()));
}

#[test]
fn step_truncates_params_to_declared_arity() {
  setup_tracing();
  let step = Step::params("first_only", 1, |params| {
    assert_eq!(params.len(), 1);
    Ok(StepSuccess::params(params.to_vec(), Map::new()))
  });

  let outcome = step.call(&[json!(1), json!(2), json!(3)], &Map::new());
  assert_eq!(outcome.params(), &[json!(1)]);
}

#[test]
fn step_failure_shapes_normalize_to_failure_records() {
  setup_tracing();
  let coded = Step::new("coded", 0, |_p, _c| Err(operon::StepFailure::code("missing")));
  let outcome = coded.call(&[], &Map::new());
  assert_eq!(outcome.errors()[0].code.as_deref(), Some("missing"));
  assert!(outcome.errors()[0].path.is_empty());
  assert_eq!(outcome.errors()[0].producer.as_ref(), Some(coded.id()));

  let texted = Step::new("texted", 0, |_p, _c| Err(operon::StepFailure::message("went wrong")));
  let outcome = texted.call(&[], &Map::new());
  assert_eq!(outcome.errors()[0].message.as_deref(), Some("went wrong"));

  let many = Step::new("many", 0, |_p, _c| {
    Err(operon::StepFailure::Many(vec![
      Failure::code("one"),
      Failure::code("two"),
    ]))
  });
  let outcome = many.call(&[], &Map::new());
  assert_eq!(outcome.errors().len(), 2);
}

#[test]
fn failure_display_renders_code_and_path() {
  let failure = Failure::code("blank").at(operon::path!["comments", 1usize, "body"]);
  assert_eq!(failure.to_string(), "blank (at comments.1.body)");

  let value: Value = serde_json::to_value(&failure).expect("failure serializes");
  assert_eq!(value["path"], json!(["comments", 1, "body"]));
}
