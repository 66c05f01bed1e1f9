// operon/src/validate/mod.rs

//! Adapters over external validation engines: a params contract for the
//! positional input mapping and a schema check for caller-supplied context
//! entries.

pub mod context;
pub mod params;

pub use context::{ContextValidator, TypeCheck};
pub use params::{ContractOutcome, ParamsValidator, SchemaContract};
