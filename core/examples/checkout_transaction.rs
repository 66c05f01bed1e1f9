// operon/examples/checkout_transaction.rs

use operon::{
  with_sync_callbacks, CallbackState, Component, Step, StepSuccess, Transaction, UnmanagedTransactions,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Transaction Callbacks Example ---");

  // The child pipeline runs inside a transaction scope. A real application
  // wires its database manager here; UnmanagedTransactions runs the scope
  // as a no-op.
  let place_order = Step::new("place_order", 1, |params, _context| {
    info!("placing order {}", params[0]);
    Ok(StepSuccess::params(
      params.to_vec(),
      json!({"order": {"id": 42}}).as_object().cloned().unwrap_or_default(),
    ))
  })
  .shared();

  let send_receipt = Step::new("send_receipt", 1, |_params, context| {
    info!("emailing receipt for {}", context["order"]);
    Ok(StepSuccess::empty())
  })
  .shared();

  let checkout = Transaction::new(place_order, Arc::new(UnmanagedTransactions)).on_success(send_receipt);

  // Sync mode: callbacks run inline after commit and come back settled.
  let outcome = with_sync_callbacks(true, || {
    checkout.call(&[json!({"sku": "book", "qty": 1})], &operon::Map::new())
  });
  assert!(outcome.success());
  assert!(matches!(outcome.on_success()[0], CallbackState::Settled(_)));

  // Async mode (the default): callbacks go to the worker pool and come back
  // as pending handles to await.
  let outcome = checkout.call(&[json!({"sku": "book", "qty": 2})], &operon::Map::new());
  for state in outcome.on_success() {
    let resolved = state.resolve();
    info!("callback finished, success: {}", resolved.success());
  }

  operon::transaction::pool::shutdown_global(std::time::Duration::from_secs(2));
}
