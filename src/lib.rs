//! Timed quiz engine: session state machine, countdown, lifelines, scoring and review.

pub mod config;
pub mod dto;
pub mod error;
pub mod services;
pub mod state;

pub use crate::{
    config::{EngineConfig, ScoringConfig, SessionConfig},
    error::{OperationError, ValidationError},
    services::clock::{SessionHandle, SharedSession},
    state::{Direction, NavigationMode, QuizPhase, QuizSession, SubmitReason},
};
