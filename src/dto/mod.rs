//! Serde-facing types exchanged with hosts and collaborators.

pub mod events;
pub mod phase;
pub mod quiz;
pub mod results;
pub mod validation;
