//! Notifications published to hosts observing a running session.

use serde::Serialize;

use crate::{
    dto::{phase::VisibleQuizPhase, results::ScoreReport},
    state::{lifelines::Lifeline, state_machine::SubmitReason},
};

/// Notification pushed to hosts observing a [`crate::services::clock::SessionHandle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The session moved to another phase or question.
    PhaseChanged {
        /// Visible phase after the change.
        phase: VisibleQuizPhase,
        /// Question now in focus.
        question: usize,
        /// Session version after the change.
        version: u64,
    },
    /// One second elapsed on the countdown.
    TimerTick {
        /// Seconds left.
        remaining: u32,
        /// Whether the clock should be flagged as running low.
        low: bool,
    },
    /// The countdown reached zero.
    TimeExpired {
        /// Question in focus when time ran out.
        question: usize,
    },
    /// A lifeline was spent.
    LifelineUsed {
        /// Which lifeline.
        lifeline: Lifeline,
        /// Question it was used on.
        question: usize,
    },
    /// The session reached its terminal phase.
    Submitted {
        /// Why it ended.
        reason: SubmitReason,
        /// Final score.
        report: ScoreReport,
    },
}
