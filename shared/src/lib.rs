//! Shared vocabulary for the radiology report pipeline
//!
//! Contains the domain types exchanged between pipeline stages (section keys,
//! case records, task results, failure taxonomy, configuration) plus
//! cross-cutting logging and error helpers. Stage-internal types stay in the
//! `reporter` crate.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
