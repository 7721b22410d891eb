//! Score reports, review items and session exports.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::{dto::phase::VisibleQuizPhase, state::answers::AnswerRecord};

/// Qualitative label derived from the score percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyLevel {
    /// Lowest tier.
    Novice,
    /// Some of the material is understood.
    Learner,
    /// Solid grasp of the basics.
    Proficient,
    /// Strong command of the topic.
    Advanced,
    /// Near-perfect result.
    Master,
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProficiencyLevel::Novice => "Novice",
            ProficiencyLevel::Learner => "Learner",
            ProficiencyLevel::Proficient => "Proficient",
            ProficiencyLevel::Advanced => "Advanced",
            ProficiencyLevel::Master => "Master",
        };
        f.write_str(label)
    }
}

/// Statistics derived from a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    /// Selections equal to the correct answer.
    pub correct: usize,
    /// Selections that differ from the correct answer.
    pub wrong: usize,
    /// Questions without a recorded selection.
    pub skipped: usize,
    /// Questions in the quiz.
    pub total: usize,
    /// Rounded to the nearest whole percent, halves rounding up.
    pub percentage: u32,
    /// Letter grade from the configured scale.
    pub grade: String,
    /// Proficiency tier reached.
    pub proficiency_level: ProficiencyLevel,
    /// Points per correct answer plus the completion bonus, saturating.
    pub points: u32,
}

/// Right/wrong reconstruction of one question, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    /// Prompt text.
    pub question: String,
    /// Final selection, if any.
    pub selected_option: Option<String>,
    /// Correct option text.
    pub correct_option: String,
    /// Whether the selection matched.
    pub is_correct: bool,
    /// Question explanation, or a default text.
    pub explanation: String,
}

/// Everything a host needs to hand over to a grading or storage collaborator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResults {
    /// Session the data belongs to.
    pub session_id: Uuid,
    /// Quiz title.
    pub title: String,
    /// Quiz topic.
    pub topic: String,
    /// Raw answer records in question order.
    pub answers: Vec<AnswerRecord>,
    /// Final score.
    pub report: ScoreReport,
}

/// Point-in-time view of a session for change detection and rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Session the data belongs to.
    pub session_id: Uuid,
    /// Visible phase.
    pub phase: VisibleQuizPhase,
    /// Question in focus.
    pub current_question: usize,
    /// Questions in the quiz.
    pub question_count: usize,
    /// Seconds left on the countdown.
    pub remaining_seconds: u32,
    /// Incremented on every mutation.
    pub version: u64,
}
