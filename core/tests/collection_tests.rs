// tests/collection_tests.rs
mod common;

use common::*;
use operon::{Collection, Component, Step, StepSuccess};
use serde_json::json;

#[test]
fn collection_prefixes_errors_with_key_and_index() {
  setup_tracing();
  let collection = Collection::new("comments", validate_presence("validate", "body"));

  let outcome = collection.call(
    &[json!({"comments": [{"body": "a"}, {"body": ""}]})],
    &operon::Map::new(),
  );

  assert!(outcome.failure());
  assert_eq!(outcome.errors().len(), 1);
  assert_eq!(outcome.errors()[0].path, operon::path!["comments", 1usize, "body"]);
}

#[test]
fn collection_rewraps_returned_params_under_the_key() {
  setup_tracing();
  let upcase = Step::new("upcase", 1, |params, _context| {
    let body = params[0]["body"].as_str().unwrap_or_default().to_uppercase();
    Ok(StepSuccess::params(vec![json!({"body": body})], operon::Map::new()))
  })
  .shared();

  let collection = Collection::new("comments", upcase);
  let outcome = collection.call(
    &[json!({"comments": [{"body": "a"}, {"body": "b"}]})],
    &operon::Map::new(),
  );

  assert!(outcome.success());
  assert_eq!(
    outcome.params(),
    &[json!({"comments": [{"body": "A"}, {"body": "B"}]})]
  );
}

#[test]
fn collection_composes_iteration_contexts_under_the_key() {
  setup_tracing();
  let stamp = Step::new("stamp", 1, |params, _context| {
    let body = params[0]["body"].clone();
    Ok(StepSuccess::context(obj(json!({"checked": body}))))
  })
  .shared();

  let collection = Collection::new("comments", stamp);
  let outcome = collection.call(
    &[json!({"comments": [{"body": "a"}, {"body": "b"}]})],
    &operon::Map::new(),
  );

  assert!(outcome.success());
  let composed = &outcome.context()["comments"];
  assert_eq!(composed[0]["checked"], json!("a"));
  assert_eq!(composed[1]["checked"], json!("b"));
}

#[test]
fn collection_iterates_mapping_collections_by_symbolic_key() {
  setup_tracing();
  let collection = Collection::new("sections", validate_presence("validate", "body"));

  let outcome = collection.call(
    &[json!({"sections": {"intro": {"body": "hi"}, "outro": {"body": ""}}})],
    &operon::Map::new(),
  );

  assert!(outcome.failure());
  assert_eq!(outcome.errors().len(), 1);
  assert_eq!(outcome.errors()[0].path, operon::path!["sections", "outro", "body"]);
}

#[test]
fn collection_iterates_union_of_keys_across_sources() {
  setup_tracing();
  // The param slot has two entries, the context collection has three; the
  // union is iterated and missing entries come through as empty mappings.
  let collection = Collection::new(
    "items",
    Step::new("probe", 1, |params, _context| {
      Ok(StepSuccess::context(obj(json!({"shape": params[0].clone()}))))
    })
    .shared(),
  );

  let outcome = collection.call(
    &[json!({"items": [{"n": 0}, {"n": 1}]})],
    &obj(json!({"items": [{}, {}, {}]})),
  );

  assert!(outcome.success());
  let composed = outcome.context()["items"].as_array().expect("sequence composition");
  assert_eq!(composed.len(), 3);
  assert_eq!(composed[0]["shape"], json!({"n": 0}));
  assert_eq!(composed[1]["shape"], json!({"n": 1}));
  assert_eq!(composed[2]["shape"], json!({}), "missing entry iterates as empty");
}

#[test]
fn collection_merges_per_key_context_entries_into_iterations() {
  setup_tracing();
  let probe = Step::with_context("probe", |context| {
    assert!(context.get("preloaded").is_some());
    Ok(StepSuccess::empty())
  })
  .shared();

  let collection = Collection::new("items", probe);
  let outcome = collection.call(
    &[json!({"items": [{"n": 0}]})],
    &obj(json!({"items": [{"preloaded": true}]})),
  );
  assert!(outcome.success());
}

#[test]
fn empty_collection_produces_empty_composition() {
  setup_tracing();
  let collection = Collection::new("comments", validate_presence("validate", "body"));
  let outcome = collection.call(&[json!({"comments": []})], &operon::Map::new());

  assert!(outcome.success());
  assert_eq!(outcome.context()["comments"], json!([]));
}

#[test]
fn collection_signature_follows_the_child_arity() {
  setup_tracing();
  let collection = Collection::new("comments", validate_presence("validate", "body"));
  assert_eq!(collection.signature().arity, operon::Arity::Fixed(1));
  assert!(collection.signature().accepts_context);
}
