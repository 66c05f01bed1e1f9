// operon/examples/comments_validation.rs

use operon::{Chain, Collection, Component, Failure, Namespace, Step, StepFailure, StepSuccess};
use serde_json::json;
use tracing::info;

fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Nested Validation Example ---");

  // One reusable leaf validator; Namespace and Collection position it inside
  // the input and prefix its error paths accordingly.
  let presence = |field: &'static str| {
    Step::new("validate_presence", 1, move |params, _context| {
      let ok = params[0][field].as_str().map(|s| !s.is_empty()).unwrap_or(false);
      if ok {
        Ok(StepSuccess::empty())
      } else {
        Err(StepFailure::One(Failure::code("blank").at(vec![operon::Atom::Key(field.to_string())])))
      }
    })
    .shared()
  };

  let validate_post = Chain::new(vec![
    presence("title"),
    Namespace::new(["author"], presence("email")).shared(),
    Collection::new("comments", presence("body")).shared(),
  ]);

  let outcome = validate_post.call(
    &[json!({
      "title": "",
      "author": {"email": ""},
      "comments": [{"body": "fine"}, {"body": ""}]
    })],
    &operon::Map::new(),
  );

  // The chain stops at the first failing step, so only the title error
  // surfaces here.
  assert!(outcome.failure());
  assert_eq!(outcome.errors().len(), 1);
  info!("chain error: {}", outcome.errors()[0]);

  // Collected instead: a Fanout runs every branch and gathers all paths.
  let validate_everything = operon::Fanout::new(vec![
    presence("title"),
    Namespace::new(["author"], presence("email")).shared(),
    Collection::new("comments", presence("body")).shared(),
  ]);

  let outcome = validate_everything.call(
    &[json!({
      "title": "",
      "author": {"email": ""},
      "comments": [{"body": "fine"}, {"body": ""}]
    })],
    &operon::Map::new(),
  );

  assert_eq!(outcome.errors().len(), 3);
  for error in outcome.errors() {
    info!("collected: {}", error);
  }
}
