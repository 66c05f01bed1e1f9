// operon/src/lookup/mod.rs

//! Entity lookup helpers: path-based extraction from params into repository
//! lookups, placed into context under a configured key.

pub mod find_many;
pub mod find_one;
pub mod repository;

pub use find_many::FindMany;
pub use find_one::FindOne;
pub use repository::{FetchMany, FetchOne, Source};

/// Naive singularization used for the default `with` key of FindMany
/// (`products` → `product_ids`).
pub(crate) fn singularize(word: &str) -> String {
  if let Some(stem) = word.strip_suffix("ies") {
    format!("{}y", stem)
  } else if let Some(stem) = word.strip_suffix('s') {
    stem.to_string()
  } else {
    word.to_string()
  }
}
