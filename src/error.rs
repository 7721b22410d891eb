//! Error types returned by the engine.

use thiserror::Error;
use validator::ValidationErrors;

use crate::state::{lifelines::Lifeline, state_machine::InvalidTransition};

/// A quiz definition was rejected by [`crate::state::QuizSession::start`].
///
/// Fatal: no session is created.
#[derive(Debug, Clone, Error)]
#[error("invalid quiz definition: {0}")]
pub struct ValidationError(#[from] ValidationErrors);

impl ValidationError {
    /// Field-level details reported by the validator.
    pub fn errors(&self) -> &ValidationErrors {
        &self.0
    }
}

/// A session operation was rejected. The session is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// The option is not offered by the question, or the question does not exist.
    #[error("option `{option}` is not offered by question {question}")]
    InvalidOption {
        /// Question the option was submitted for.
        question: usize,
        /// Rejected option text.
        option: String,
    },
    /// The question index is outside the quiz.
    #[error("question {question} is out of range (quiz has {count} questions)")]
    QuestionOutOfRange {
        /// Requested question index.
        question: usize,
        /// Number of questions in the quiz.
        count: usize,
    },
    /// The option was hidden by a 50:50.
    #[error("option `{option}` was eliminated for question {question}")]
    OptionEliminated {
        /// Question the option belongs to.
        question: usize,
        /// Eliminated option text.
        option: String,
    },
    /// Locking requires a tentative selection.
    #[error("no option selected for question {question}")]
    NoSelection {
        /// Question being locked.
        question: usize,
    },
    /// The answer for this question is final.
    #[error("answer for question {question} is already locked")]
    AnswerLocked {
        /// Locked question.
        question: usize,
    },
    /// Lock-step sessions only accept input for the question on screen.
    #[error("question {question} is not the question being presented")]
    QuestionNotActive {
        /// Requested question.
        question: usize,
    },
    /// The session has been submitted.
    #[error("session is closed")]
    SessionClosed,
    /// Results are only available once the session has been submitted.
    #[error("session is still in progress")]
    SessionInProgress,
    /// The lifeline has already been spent.
    #[error("{0} lifeline already used")]
    LifelineUsed(Lifeline),
    /// The operation does not apply to the current phase or navigation mode.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}
