// operon/examples/basic_chain.rs

use operon::{Chain, Component, Failure, Step, StepFailure, StepSuccess};
use serde_json::json;
use tracing::info;

fn main() {
  // Initialize tracing (optional, for demonstration)
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Chain Example ---");

  // 1. Wire the steps. Each step declares its arity explicitly and returns
  //    params/context deltas that the chain accumulates.
  let validate = Step::new("validate", 1, |params, _context| {
    let title = params[0]["title"].as_str().unwrap_or_default();
    if title.is_empty() {
      Err(StepFailure::One(Failure::code("blank").at(operon::path!["title"])))
    } else {
      Ok(StepSuccess::empty())
    }
  })
  .shared();

  let normalize = Step::new("normalize", 1, |params, _context| {
    let title = params[0]["title"].as_str().unwrap_or_default().trim().to_string();
    Ok(StepSuccess::params(vec![json!({ "title": title })], operon::Map::new()))
  })
  .shared();

  let persist = Step::new("persist", 1, |params, _context| {
    info!("persisting {}", params[0]);
    Ok(StepSuccess::context(
      json!({"post": {"id": 1, "title": params[0]["title"]}})
        .as_object()
        .cloned()
        .unwrap_or_default(),
    ))
  })
  .shared();

  let create_post = Chain::new(vec![validate, normalize, persist]);

  // 2. Run the happy path.
  let outcome = create_post.call(&[json!({"title": "  Hello Operon  "})], &operon::Map::new());
  info!("success: {}", outcome.success());
  info!("context: {:?}", outcome.context());
  assert!(outcome.success());
  assert_eq!(outcome.context()["post"]["title"], json!("Hello Operon"));

  // 3. Run the failing path: validation stops the chain, later steps never
  //    run, and the failure carries a positional path.
  let outcome = create_post.call(&[json!({"title": ""})], &operon::Map::new());
  assert!(outcome.failure());
  for error in outcome.errors() {
    info!("error: {}", error);
  }
}
