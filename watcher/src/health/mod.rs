//! Node health evaluation
//!
//! Turns a target probe and a reference probe into a sorted list of
//! human-readable problems. Pure, no I/O.

pub mod evaluator;
pub mod types;

pub use evaluator::{check_reference, evaluate};
pub use types::{HealthAssessment, HealthVerdict};
