// operon/examples/entity_lookup.rs

use operon::{Chain, Component, FetchOne, FindOne, Value};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Minimal in-memory repository keyed by arbitrary columns.
struct PostsRepo {
  rows: Vec<Value>,
}

impl FetchOne for PostsRepo {
  fn get_one(&self, attrs: &[(String, Value)]) -> Option<Value> {
    self
      .rows
      .iter()
      .find(|row| {
        attrs
          .iter()
          .all(|(column, value)| row.as_object().and_then(|map| map.get(column)) == Some(value))
      })
      .cloned()
  }
}

fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Entity Lookup Example ---");

  let repo: Arc<dyn FetchOne> = Arc::new(PostsRepo {
    rows: vec![
      json!({"id": 1, "slug": "hello", "title": "Hello"}),
      json!({"id": 2, "slug": "bye", "title": "Goodbye"}),
    ],
  });

  // Resolve a post by slug into context, then use it downstream.
  let pipeline = Chain::new(vec![
    FindOne::new("post", repo).with("slug").shared(),
    operon::Step::with_context("announce", |context| {
      info!("loaded {}", context["post"]["title"]);
      Ok(operon::StepSuccess::empty())
    })
    .shared(),
  ]);

  let outcome = pipeline.call(&[json!({"slug": "hello"})], &operon::Map::new());
  assert!(outcome.success());
  assert_eq!(outcome.context()["post"]["id"], json!(1));

  // A missing slug surfaces a structured not_found error instead of a panic.
  let outcome = pipeline.call(&[json!({"slug": "nope"})], &operon::Map::new());
  assert!(outcome.failure());
  for error in outcome.errors() {
    info!("error: {}", error);
  }
}
