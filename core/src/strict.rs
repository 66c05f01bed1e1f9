// operon/src/strict.rs

//! The raising call surface.

use crate::core::component::Component;
use crate::core::outcome::Outcome;
use crate::core::value::{Map, Value};
use crate::error::{OperonError, OperonResult};

/// Raising variant of [`Component::call`]: any failed outcome becomes
/// `Err(OperonError::OperationFailed)` carrying the full outcome for
/// inspection.
pub trait ComponentExt: Component {
  fn call_strict(&self, params: &[Value], context: &Map) -> OperonResult<Outcome> {
    let outcome = self.call(params, context);
    if outcome.failure() {
      Err(OperonError::OperationFailed { result: outcome })
    } else {
      Ok(outcome)
    }
  }
}

impl<C: Component + ?Sized> ComponentExt for C {}
