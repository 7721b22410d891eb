//! Human-readable performance feedback shown alongside a score report.

use serde::Serialize;

use crate::dto::results::ScoreReport;

const STRONG_PERCENTAGE: u32 = 80;
const PASSING_PERCENTAGE: u32 = 50;

/// Suggestions and encouragement derived from a score report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformanceFeedback {
    /// One-line encouragement.
    pub encouragement: String,
    /// Summary first, then strengths or weaknesses, then a next step.
    pub suggestions: Vec<String>,
}

/// Build feedback for `report` on `topic`.
pub fn performance_feedback(report: &ScoreReport, topic: &str) -> PerformanceFeedback {
    let score = format!("{}/{}", report.correct, report.total);
    let suggestions = if report.percentage >= STRONG_PERCENTAGE {
        vec![
            format!("Excellent mastery of {topic}! You answered {score} correctly."),
            "Strengths: consistent performance across the quiz.".to_string(),
            "Recommendation: attempt harder quizzes or explore related topics.".to_string(),
        ]
    } else if report.percentage >= PASSING_PERCENTAGE {
        vec![
            format!("Good foundation in {topic}. Score: {score}."),
            "Weaknesses: some application questions were missed.".to_string(),
            format!("Tip: review the core concepts of {topic} before the next attempt."),
        ]
    } else {
        vec![
            format!("Needs improvement in {topic}. Score: {score}."),
            "Weaknesses: fundamental concepts seem unclear.".to_string(),
            "Action plan: re-read the core material and retry at an easier level.".to_string(),
        ]
    };

    PerformanceFeedback {
        encouragement: encouragement(report.percentage).to_string(),
        suggestions,
    }
}

fn encouragement(percentage: u32) -> &'static str {
    match percentage {
        90.. => "Awesome! You're a true subject master!",
        75..=89 => "Great work! You're racing ahead!",
        50..=74 => "Good effort! Solid progress being made!",
        _ => "Keep practising, every attempt counts!",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::results::ProficiencyLevel;

    fn report(correct: usize, total: usize, percentage: u32) -> ScoreReport {
        ScoreReport {
            correct,
            wrong: total - correct,
            skipped: 0,
            total,
            percentage,
            grade: "B".into(),
            proficiency_level: ProficiencyLevel::Proficient,
            points: 0,
        }
    }

    #[test]
    fn tiers_follow_the_percentage() {
        let strong = performance_feedback(&report(9, 10, 90), "Fractions");
        assert!(strong.suggestions[0].contains("9/10"));
        assert!(strong.suggestions[0].starts_with("Excellent mastery of Fractions"));
        assert_eq!(strong.encouragement, "Awesome! You're a true subject master!");

        let middle = performance_feedback(&report(3, 5, 60), "Fractions");
        assert!(middle.suggestions[0].starts_with("Good foundation"));
        assert_eq!(middle.encouragement, "Good effort! Solid progress being made!");

        let weak = performance_feedback(&report(1, 5, 20), "Fractions");
        assert!(weak.suggestions[0].starts_with("Needs improvement"));
        assert_eq!(weak.suggestions.len(), 3);
    }
}
