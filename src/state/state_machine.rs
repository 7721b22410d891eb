//! Phase machine shared by lock-step and free-navigation sessions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a participant moves through the questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMode {
    /// Answer and lock each question before the next one is shown.
    #[default]
    LockStep,
    /// Move freely between questions and submit once at the end.
    FreeNavigation,
}

/// Phases a quiz session can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    /// Question is on screen and its answer can still be edited.
    Presenting(usize),
    /// Answer has been locked; short pause before the verdict.
    Locked(usize),
    /// Verdict for the question is shown before moving on.
    Revealing(usize),
    /// Terminal: answers and lifelines are frozen.
    Submitted,
}

impl QuizPhase {
    /// Whether the session is over.
    pub fn is_submitted(&self) -> bool {
        matches!(self, QuizPhase::Submitted)
    }
}

/// Why a session reached [`QuizPhase::Submitted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitReason {
    /// The participant submitted explicitly.
    Manual,
    /// The whole-session countdown ran out.
    TimeExpired,
    /// The last question of a lock-step session was revealed.
    Completed,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizEvent {
    /// Participant locks the presented answer.
    Lock,
    /// Per-question countdown reached zero.
    Expire,
    /// "Final answer" pause is over; show the verdict.
    Reveal,
    /// Feedback window is over; move to the next question.
    Advance,
    /// Jump to another question (free navigation only).
    Navigate(usize),
    /// Close the session.
    Submit(SubmitReason),
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?} ({mode:?})")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: QuizPhase,
    /// The event that cannot be applied from this phase.
    pub event: QuizEvent,
    /// Navigation mode of the session.
    pub mode: NavigationMode,
}

/// Phase machine shared by both navigation modes.
///
/// `version` counts applied transitions only; it is what phase follow-up tickets are
/// checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizStateMachine {
    phase: QuizPhase,
    version: u64,
    navigation: NavigationMode,
    question_count: usize,
}

impl QuizStateMachine {
    /// Create a state machine presenting the first question.
    pub fn new(navigation: NavigationMode, question_count: usize) -> Self {
        Self {
            phase: QuizPhase::Presenting(0),
            version: 0,
            navigation,
            question_count,
        }
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    /// Number of transitions applied so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Navigation mode the machine enforces.
    pub fn navigation(&self) -> NavigationMode {
        self.navigation
    }

    /// Phase `event` would lead to, without applying it.
    pub fn peek(&self, event: QuizEvent) -> Result<QuizPhase, InvalidTransition> {
        self.compute_transition(event)
    }

    /// Apply `event`, returning the new phase. Rejected events leave the machine untouched.
    pub fn apply(&mut self, event: QuizEvent) -> Result<QuizPhase, InvalidTransition> {
        self.phase = self.compute_transition(event)?;
        self.version += 1;
        Ok(self.phase)
    }

    fn next_after(&self, index: usize) -> QuizPhase {
        if index + 1 < self.question_count {
            QuizPhase::Presenting(index + 1)
        } else {
            QuizPhase::Submitted
        }
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: QuizEvent) -> Result<QuizPhase, InvalidTransition> {
        use NavigationMode::{FreeNavigation, LockStep};

        let next = match (self.phase, event, self.navigation) {
            (QuizPhase::Presenting(i), QuizEvent::Lock, LockStep) => QuizPhase::Locked(i),
            (QuizPhase::Presenting(i), QuizEvent::Expire, LockStep) => QuizPhase::Revealing(i),
            (QuizPhase::Presenting(i), QuizEvent::Expire, FreeNavigation) => self.next_after(i),
            (QuizPhase::Locked(i), QuizEvent::Reveal, _) => QuizPhase::Revealing(i),
            (QuizPhase::Revealing(i), QuizEvent::Advance, _) => self.next_after(i),
            (QuizPhase::Presenting(_), QuizEvent::Navigate(j), FreeNavigation)
                if j < self.question_count =>
            {
                QuizPhase::Presenting(j)
            }
            (QuizPhase::Submitted, _, _) => {
                return Err(self.invalid(event));
            }
            (_, QuizEvent::Submit(_), _) => QuizPhase::Submitted,
            _ => return Err(self.invalid(event)),
        };

        Ok(next)
    }

    fn invalid(&self, event: QuizEvent) -> InvalidTransition {
        InvalidTransition {
            from: self.phase,
            event,
            mode: self.navigation,
        }
    }
}
