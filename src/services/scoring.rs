//! Score derivation over a frozen answer tracker.

use crate::{
    config::ScoringConfig,
    dto::{quiz::QuizDefinition, results::ScoreReport},
    state::answers::AnswerTracker,
};

/// Derive the score report for `answers` against `definition`.
///
/// Pure: a recorded selection counts as correct when it equals the question's correct
/// answer byte for byte, as wrong when it differs, and anything else is skipped.
/// Records pointing outside the quiz are ignored.
pub fn score(
    definition: &QuizDefinition,
    answers: &AnswerTracker,
    config: &ScoringConfig,
) -> ScoreReport {
    let total = definition.questions.len();
    let (correct, wrong) = definition
        .questions
        .iter()
        .enumerate()
        .filter_map(|(index, question)| {
            answers
                .selection(index)
                .map(|selected| selected == question.correct_answer)
        })
        .fold((0, 0), |(correct, wrong), is_correct| {
            if is_correct {
                (correct + 1, wrong)
            } else {
                (correct, wrong + 1)
            }
        });

    let percentage = rounded_percentage(correct, total);
    ScoreReport {
        correct,
        wrong,
        skipped: total - correct - wrong,
        total,
        percentage,
        grade: config.grades.grade_for(percentage).to_string(),
        proficiency_level: config.proficiency.level_for(percentage),
        points: config
            .points_per_correct
            .saturating_mul(u32::try_from(correct).unwrap_or(u32::MAX))
            .saturating_add(config.completion_bonus),
    }
}

/// `round(100 * part / total)` with halves rounding up; zero for an empty quiz.
fn rounded_percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part * 200 + total) / (total * 2)) as u32
}
