//! Phase projection exposed to presentation layers.

use serde::Serialize;

use crate::state::state_machine::QuizPhase;

/// Phase exposed to presentation layers.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleQuizPhase {
    /// A question is on screen and can be answered.
    Presenting,
    /// Answer locked, verdict pending.
    Locked,
    /// Verdict for the current question is shown.
    Revealing,
    /// Session is over.
    Submitted,
}

impl From<&QuizPhase> for VisibleQuizPhase {
    fn from(value: &QuizPhase) -> Self {
        match value {
            QuizPhase::Presenting(_) => VisibleQuizPhase::Presenting,
            QuizPhase::Locked(_) => VisibleQuizPhase::Locked,
            QuizPhase::Revealing(_) => VisibleQuizPhase::Revealing,
            QuizPhase::Submitted => VisibleQuizPhase::Submitted,
        }
    }
}
