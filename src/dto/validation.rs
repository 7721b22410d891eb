//! Validation helpers for quiz definitions.

use std::collections::HashSet;

use validator::ValidationError;

/// Minimum number of options a question must offer.
pub const MIN_OPTIONS: usize = 2;

/// Validates that a question prompt carries some non-whitespace text.
pub fn validate_prompt(prompt: &str) -> Result<(), ValidationError> {
    if prompt.trim().is_empty() {
        let mut err = ValidationError::new("question_prompt_empty");
        err.message = Some("Question prompt must not be empty".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a question offers at least [`MIN_OPTIONS`] pairwise distinct options.
///
/// Options are compared byte for byte; `"Paris"` and `"paris"` are two different options.
///
/// # Examples
///
/// ```ignore
/// validate_options(&["A".into(), "B".into()]) // Ok
/// validate_options(&["A".into()])             // Err - too few
/// validate_options(&["A".into(), "A".into()]) // Err - duplicate
/// ```
pub fn validate_options(options: &[String]) -> Result<(), ValidationError> {
    if options.len() < MIN_OPTIONS {
        let mut err = ValidationError::new("options_count");
        err.message = Some(
            format!(
                "Question must offer at least {MIN_OPTIONS} options (got {})",
                options.len()
            )
            .into(),
        );
        return Err(err);
    }

    let mut seen = HashSet::with_capacity(options.len());
    if let Some(duplicate) = options.iter().find(|option| !seen.insert(option.as_str())) {
        let mut err = ValidationError::new("options_duplicate");
        err.message = Some(format!("Option `{duplicate}` is listed more than once").into());
        return Err(err);
    }

    Ok(())
}

/// Validates that `correct_answer` is byte-for-byte equal to one of `options`.
///
/// No trimming or case folding is applied.
pub fn validate_correct_answer(
    options: &[String],
    correct_answer: &str,
) -> Result<(), ValidationError> {
    if options.iter().any(|option| option == correct_answer) {
        return Ok(());
    }

    let mut err = ValidationError::new("correct_answer_missing");
    err.message = Some(
        format!("Correct answer `{correct_answer}` is not one of the question's options").into(),
    );
    Err(err)
}
