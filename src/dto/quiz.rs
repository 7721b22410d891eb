//! Quiz definitions supplied by the content-generation or storage collaborator.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::{
    dto::validation::{validate_correct_answer, validate_options, validate_prompt},
    state::timer::TimingMode,
};

/// A complete quiz as handed to [`crate::state::QuizSession::start`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuizDefinition {
    /// Display title of the quiz.
    pub title: String,
    /// Topic the quiz was generated for.
    pub topic: String,
    /// Ordered questions; order is preserved exactly.
    #[validate(length(min = 1, message = "a quiz requires at least one question"), nested)]
    pub questions: Vec<Question>,
    /// Timing suggested by the author. Session configuration takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingMode>,
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Prompt text.
    pub question: String,
    /// Ordered answer options.
    pub options: Vec<String>,
    /// Must equal exactly one entry of `options`.
    pub correct_answer: String,
    /// Shown in the review after submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Free-form metadata tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Question {
    /// Position of the correct option inside `options`.
    pub fn correct_index(&self) -> Option<usize> {
        self.options
            .iter()
            .position(|option| *option == self.correct_answer)
    }

    /// Position of `option` inside `options`.
    pub fn option_index(&self, option: &str) -> Option<usize> {
        self.options.iter().position(|candidate| candidate == option)
    }

    /// Indexes of every option except the correct one.
    pub fn incorrect_indices(&self) -> Vec<usize> {
        self.options
            .iter()
            .enumerate()
            .filter(|(_, option)| **option != self.correct_answer)
            .map(|(index, _)| index)
            .collect()
    }
}

impl Validate for Question {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_prompt(&self.question) {
            errors.add("question", e);
        }

        if let Err(e) = validate_options(&self.options) {
            errors.add("options", e);
        }

        if let Err(e) = validate_correct_answer(&self.options, &self.correct_answer) {
            errors.add("correct_answer", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl QuizDefinition {
    /// Number of questions in the quiz.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}
