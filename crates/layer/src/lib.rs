//! Validation layer.
//!
//! This crate hosts checkers behind the interception hooks. It decides from
//! configuration which checkers are active, keeps the list of registered
//! checkers, and routes each intercepted call to them from the prologue or
//! epilogue.

mod config;
mod layer;

pub use config::{LayerConfig, ENABLE_EVENTS_DEADLOCK_VAR, MAX_PATH_LEN_VAR};
pub use layer::ValidationLayer;
