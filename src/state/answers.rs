//! Per-question answer records and their lock state.

use std::collections::BTreeMap;

use serde::Serialize;

/// Answer recorded for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    /// Index of the question in the definition.
    pub question: usize,
    /// Chosen option text; `None` when the question was locked without a choice.
    pub selected: Option<String>,
    /// Locked records are final and can no longer be edited.
    pub locked: bool,
}

/// Answers keyed by question index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerTracker {
    records: BTreeMap<usize, AnswerRecord>,
}

impl AnswerTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tentative selection, replacing any earlier tentative one.
    ///
    /// Returns `false` when the same option was already selected. Callers must reject
    /// locked questions before calling.
    pub fn select(&mut self, question: usize, option: &str) -> bool {
        match self.records.get_mut(&question) {
            Some(record) if record.selected.as_deref() == Some(option) => false,
            Some(record) => {
                record.selected = Some(option.to_string());
                true
            }
            None => {
                self.records.insert(
                    question,
                    AnswerRecord {
                        question,
                        selected: Some(option.to_string()),
                        locked: false,
                    },
                );
                true
            }
        }
    }

    /// Drop the tentative selection for `question`, if unlocked.
    pub fn clear_tentative(&mut self, question: usize) -> bool {
        match self.records.get(&question) {
            Some(record) if !record.locked => {
                self.records.remove(&question);
                true
            }
            _ => false,
        }
    }

    /// Finalise `question` with whatever is currently selected (possibly nothing).
    pub fn lock(&mut self, question: usize) {
        self.records
            .entry(question)
            .and_modify(|record| record.locked = true)
            .or_insert(AnswerRecord {
                question,
                selected: None,
                locked: true,
            });
    }

    /// Finalise every tentative selection.
    pub fn lock_all_selected(&mut self) {
        for record in self.records.values_mut() {
            record.locked = true;
        }
    }

    /// Drop every tentative selection, keeping only locked records.
    pub fn discard_tentative(&mut self) {
        self.records.retain(|_, record| record.locked);
    }

    /// Record for `question`, if any.
    pub fn get(&self, question: usize) -> Option<&AnswerRecord> {
        self.records.get(&question)
    }

    /// Option currently selected for `question`.
    pub fn selection(&self, question: usize) -> Option<&str> {
        self.records
            .get(&question)
            .and_then(|record| record.selected.as_deref())
    }

    /// Whether `question` has been finalised.
    pub fn is_locked(&self, question: usize) -> bool {
        self.records
            .get(&question)
            .is_some_and(|record| record.locked)
    }

    /// Records in question order.
    pub fn records(&self) -> impl Iterator<Item = &AnswerRecord> {
        self.records.values()
    }

    /// Number of questions with a selected option.
    pub fn answered_count(&self) -> usize {
        self.records
            .values()
            .filter(|record| record.selected.is_some())
            .count()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<AnswerRecord> for AnswerTracker {
    fn from_iter<I: IntoIterator<Item = AnswerRecord>>(iter: I) -> Self {
        Self {
            records: iter
                .into_iter()
                .map(|record| (record.question, record))
                .collect(),
        }
    }
}
