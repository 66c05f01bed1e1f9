// operon/examples/either_fallback.rs

use operon::{Component, Either, Failure, Step, StepFailure, StepSuccess};
use serde_json::json;
use tracing::info;

fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Either Fallback Example ---");

  // Two providers for the same resource: the cache misses, the database
  // answers. Either returns the first success and never tries what follows.
  let cache = Step::new("cache_lookup", 1, |params, _context| {
    info!("cache miss for {}", params[0]["slug"]);
    Err(StepFailure::One(Failure::code("not_found").at(operon::path!["slug"])))
  })
  .shared();

  let database = Step::new("database_lookup", 1, |params, _context| {
    info!("database hit for {}", params[0]["slug"]);
    Ok(StepSuccess::context(
      json!({"post": {"id": 1, "slug": params[0]["slug"]}})
        .as_object()
        .cloned()
        .unwrap_or_default(),
    ))
  })
  .shared();

  let lookup = Either::new(vec![cache, database]);

  let outcome = lookup.call(&[json!({"slug": "hello"})], &operon::Map::new());
  assert!(outcome.success());
  info!("resolved post: {}", outcome.context()["post"]);

  // When every alternative fails, the last failure is what comes back.
  let all_down = Either::new(vec![
    Step::new("primary", 1, |_p, _c| Err(StepFailure::code("down"))).shared(),
    Step::new("replica", 1, |_p, _c| Err(StepFailure::code("down_too"))).shared(),
  ]);
  let outcome = all_down.call(&[json!({})], &operon::Map::new());
  assert!(outcome.failure());
  info!("last failure code: {:?}", outcome.errors()[0].code);
}
