// operon/src/lib.rs

//! Operon: a composable business-operation engine for Rust.
//!
//! Operon wires user-provided components into dataflow pipelines with
//! railway-oriented control flow:
//!  - A small combinator set (Chain, Parallel, Fanout, Split, Either,
//!    Collection, Namespace, Shortcut, Optional) composing components into
//!    trees evaluated depth-first in the calling thread.
//!  - Structured error aggregation with positional paths, prefixed as
//!    errors travel out of namespaces and collections.
//!  - Transactional side-effect staging: a sub-pipeline wrapped in a DB
//!    transaction scope with ordered post-commit / post-rollback callbacks,
//!    dispatched synchronously or on a shared worker pool.
//!  - Entity lookup helpers (FindOne, FindMany) normalizing repository
//!    access, including polymorphic dispatch by type tag.
//!
//! Control flow is carried on values, never on unwinding: a component call
//! always returns an [`Outcome`], and enclosing combinators decide whether
//! to continue, collect, or short-circuit.

pub mod combinators;
pub mod core;
pub mod error;
pub mod lookup;
pub mod strict;
pub mod transaction;
pub mod validate;

// --- Re-exports for the Public API ---

// Core model types that users interact with constantly.
pub use crate::core::component::{Component, ComponentId, ComponentRef, Step, StepFailure, StepResult, StepSuccess};
pub use crate::core::failure::{codes, Failure};
pub use crate::core::outcome::{CallbackState, Changes, Outcome};
pub use crate::core::signature::{Arity, Signature};
pub use crate::core::value::{deep_merge, deep_merge_maps, dig, dig_keys, keys_to_path, nest, Atom, Map, Path, Value};

// The combinator set.
pub use crate::combinators::{Chain, Collection, Either, Fanout, Namespace, Optional, Parallel, Shortcut, Split};

// Transactional staging and the callback infrastructure.
pub use crate::transaction::manager::{TransactionManager, TxDisposition, UnmanagedTransactions};
pub use crate::transaction::pool::{
  shutdown_global, sync_callbacks, with_sync_callbacks, CallbackHandle, CallbackPool, CALLBACK_THREADS_VAR,
};
pub use crate::transaction::{FailureHook, Transaction};

// Lookup helpers and their repository seams.
pub use crate::lookup::{FetchMany, FetchOne, FindMany, FindOne, Source};

// Validation adapters.
pub use crate::validate::{ContextValidator, ContractOutcome, ParamsValidator, SchemaContract, TypeCheck};

// The raising surface.
pub use crate::error::{OperonError, OperonResult};
pub use crate::strict::ComponentExt;
