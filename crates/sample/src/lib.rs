//! Sample scenarios for the event deadlock checker.
//!
//! A [`Scenario`] is a list of steps over named events. The
//! [`SimulatedDriver`] plays the part of the runtime: it hands out handles,
//! and sends every step through the validation layer's prologue and epilogue
//! hooks the way the interception framework would.

mod driver;
mod scenario;

pub use driver::{RunSummary, SimulatedDriver};
pub use scenario::{Scenario, ScenarioError, Step};
