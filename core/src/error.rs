// operon/src/error.rs

use crate::core::outcome::Outcome;
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Errors raised by the engine's raising surfaces.
///
/// Pipeline-level failures are never raised — they ride on
/// [`Outcome`](crate::Outcome) as structured records. This enum covers the
/// strict-mode API, configuration problems, and callback-infrastructure
/// faults.
#[derive(Debug, Error)]
pub enum OperonError {
  /// Strict-mode wrapper around a failed outcome. Carries the full outcome
  /// for inspection.
  #[error("operation failed with {} error(s)", .result.errors().len())]
  OperationFailed { result: Outcome },

  /// `CALLBACK_THREADS` did not parse as a positive integer.
  #[error("invalid CALLBACK_THREADS value '{value}': expected a positive integer")]
  PoolConfiguration { value: String },

  /// A component was wired with an invalid configuration.
  #[error("configuration error for component '{component}': {message}")]
  Configuration { component: String, message: String },

  /// Error escaping a user-provided callback or external collaborator.
  #[error("error in user-provided callback. Source: {source}")]
  CallbackError {
    #[source]
    source: AnyhowError,
  },

  #[error("internal operon error: {0}")]
  Internal(String),
}

// External errors funnel into CallbackError, matching how user-provided code
// is surfaced everywhere else in the crate.
impl From<AnyhowError> for OperonError {
  fn from(err: AnyhowError) -> Self {
    OperonError::CallbackError { source: err }
  }
}

pub type OperonResult<T, E = OperonError> = std::result::Result<T, E>;
