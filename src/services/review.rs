//! Post-submission right/wrong reconstruction.

use crate::{
    dto::{quiz::QuizDefinition, results::ReviewItem},
    state::answers::AnswerTracker,
};

/// Shown when a question carries no explanation of its own.
pub const DEFAULT_EXPLANATION: &str = "No detailed explanation is available for this question.";

/// One [`ReviewItem`] per question, in definition order.
pub fn review(definition: &QuizDefinition, answers: &AnswerTracker) -> Vec<ReviewItem> {
    definition
        .questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let selected_option = answers.selection(index).map(str::to_string);
            let is_correct = selected_option.as_deref() == Some(question.correct_answer.as_str());
            ReviewItem {
                question: question.question.clone(),
                selected_option,
                correct_option: question.correct_answer.clone(),
                is_correct,
                explanation: question
                    .explanation
                    .as_deref()
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or(DEFAULT_EXPLANATION)
                    .to_string(),
            }
        })
        .collect()
}
