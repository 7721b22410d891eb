//! Limited-use aids: session-wide 50:50 elimination and per-question hints.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};

use rand::{
    Rng, rng,
    seq::{IndexedRandom, SliceRandom},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{dto::quiz::Question, error::OperationError};

/// Incorrect options hidden by a 50:50, at most.
pub const FIFTY_FIFTY_ELIMINATIONS: usize = 2;
/// Answers longer than this many characters count as "long" for length clues.
const LONG_ANSWER_CHARS: usize = 15;
/// Answers shorter than this are only checked for quoted leaks.
const MIN_LEAK_CHECK_CHARS: usize = 4;

const NUDGES: [&str; 2] = [
    "Hint: read the question carefully and look for keywords that match the answer.",
    "Think: recall the core concept of this topic; the answer relates to its primary function.",
];
const LAST_RESORT_HINTS: [&str; 2] = ["No hint is available for this question.", "?"];

/// The aids a participant can spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifeline {
    /// Hide two incorrect options, once per session.
    FiftyFifty,
    /// Ask for a hint, once per question.
    Hint,
}

impl fmt::Display for Lifeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifeline::FiftyFifty => f.write_str("50:50"),
            Lifeline::Hint => f.write_str("hint"),
        }
    }
}

/// Lifeline usage for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifelineState {
    fifty_fifty_consumed: bool,
    hinted_questions: BTreeSet<usize>,
    eliminated_options: BTreeMap<usize, BTreeSet<usize>>,
    cached_hints: BTreeMap<usize, String>,
}

impl LifelineState {
    /// Whether the single 50:50 of this session has been spent.
    pub fn fifty_fifty_consumed(&self) -> bool {
        self.fifty_fifty_consumed
    }

    /// Option indexes hidden for `question`.
    pub fn eliminated(&self, question: usize) -> Option<&BTreeSet<usize>> {
        self.eliminated_options.get(&question)
    }

    /// Whether option `option` of `question` has been hidden.
    pub fn is_eliminated(&self, question: usize, option: usize) -> bool {
        self.eliminated(question)
            .is_some_and(|hidden| hidden.contains(&option))
    }

    /// Hint already produced for `question`.
    pub fn cached_hint(&self, question: usize) -> Option<&str> {
        self.cached_hints.get(&question).map(String::as_str)
    }

    /// Questions a hint was requested for.
    pub fn hinted_questions(&self) -> &BTreeSet<usize> {
        &self.hinted_questions
    }
}

/// How the 50:50 chooses which incorrect options to hide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationPolicy {
    /// Shuffle the incorrect options and hide the first ones.
    #[default]
    Random,
    /// Hide the incorrect options with the lowest indexes.
    LowestIndex,
}

impl EliminationPolicy {
    /// Pick up to [`FIFTY_FIFTY_ELIMINATIONS`] incorrect option indexes of `question`.
    pub fn pick(&self, question: &Question) -> BTreeSet<usize> {
        let mut candidates = question.incorrect_indices();
        if matches!(self, EliminationPolicy::Random) {
            candidates.shuffle(&mut rng());
        }
        candidates
            .into_iter()
            .take(FIFTY_FIFTY_ELIMINATIONS)
            .collect()
    }
}

/// Source of hint text for a question.
///
/// Implementations must not reveal or paraphrase the correct option; the
/// [`LifelineManager`] still screens every hint and swaps leaking text for a
/// generic nudge.
pub trait HintPolicy: Send + Sync + fmt::Debug {
    /// Produce a hint for `question`, given the options already hidden by a 50:50.
    fn hint(&self, question: &Question, eliminated: &BTreeSet<usize>) -> String;
}

/// Built-in hint policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintStrategy {
    /// Pick one of the other strategies at random.
    #[default]
    Mixed,
    /// Name the first incorrect option still visible.
    RuleOut,
    /// A conceptual nudge that says nothing about the options.
    Nudge,
    /// Say whether the answer is long or short.
    LengthClue,
}

impl HintPolicy for HintStrategy {
    fn hint(&self, question: &Question, eliminated: &BTreeSet<usize>) -> String {
        match self {
            HintStrategy::Mixed => {
                let visible = visible_incorrect(question, eliminated);
                let mut rng = rng();
                match rng.random_range(0..3u8) {
                    0 => match visible.choose(&mut rng) {
                        Some(&index) => rule_out(&question.options[index]),
                        None => nudge(question),
                    },
                    1 => length_clue(question),
                    _ => nudge(question),
                }
            }
            HintStrategy::RuleOut => match visible_incorrect(question, eliminated).first() {
                Some(&index) => rule_out(&question.options[index]),
                None => nudge(question),
            },
            HintStrategy::Nudge => nudge(question),
            HintStrategy::LengthClue => length_clue(question),
        }
    }
}

fn visible_incorrect(question: &Question, eliminated: &BTreeSet<usize>) -> Vec<usize> {
    question
        .incorrect_indices()
        .into_iter()
        .filter(|index| !eliminated.contains(index))
        .collect()
}

fn rule_out(option: &str) -> String {
    format!("Tip: it is definitely not \"{option}\".")
}

fn nudge(question: &Question) -> String {
    NUDGES[question.question.len() % NUDGES.len()].to_string()
}

fn length_clue(question: &Question) -> String {
    if question.correct_answer.chars().count() > LONG_ANSWER_CHARS {
        "Clue: the answer is one of the longer options.".to_string()
    } else {
        "Clue: the answer is short and precise.".to_string()
    }
}

/// Whether `hint` gives away `correct`.
fn reveals_answer(hint: &str, correct: &str) -> bool {
    let correct = correct.trim();
    if correct.is_empty() {
        return false;
    }
    if hint.contains(&format!("\"{correct}\"")) {
        return true;
    }
    correct.chars().count() >= MIN_LEAK_CHECK_CHARS
        && hint.to_lowercase().contains(&correct.to_lowercase())
}

/// Outcome of a hint request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintOutcome {
    /// Hint text, identical on every request for the same question.
    pub text: String,
    /// `true` when the text came from the cache and nothing changed.
    pub cached: bool,
}

/// Applies lifelines to a [`LifelineState`].
#[derive(Debug, Clone)]
pub struct LifelineManager {
    elimination: EliminationPolicy,
    hints: Arc<dyn HintPolicy>,
}

impl LifelineManager {
    /// Build a manager from an elimination policy and a hint policy.
    pub fn new(elimination: EliminationPolicy, hints: Arc<dyn HintPolicy>) -> Self {
        Self { elimination, hints }
    }

    /// Spend the session's 50:50 on `question`, returning the hidden option indexes.
    ///
    /// The correct option is never hidden. Once spent, every further call fails with
    /// [`OperationError::LifelineUsed`] and leaves `state` untouched.
    pub fn fifty_fifty(
        &self,
        state: &mut LifelineState,
        index: usize,
        question: &Question,
    ) -> Result<BTreeSet<usize>, OperationError> {
        if state.fifty_fifty_consumed {
            return Err(OperationError::LifelineUsed(Lifeline::FiftyFifty));
        }

        let hidden = self.elimination.pick(question);
        debug_assert!(
            question
                .correct_index()
                .is_none_or(|correct| !hidden.contains(&correct))
        );

        state.fifty_fifty_consumed = true;
        state.eliminated_options.insert(index, hidden.clone());
        debug!(question = index, hidden = ?hidden, "50:50 applied");
        Ok(hidden)
    }

    /// Hint for `question`, produced once and cached.
    pub fn hint(
        &self,
        state: &mut LifelineState,
        index: usize,
        question: &Question,
    ) -> HintOutcome {
        if let Some(text) = state.cached_hints.get(&index) {
            return HintOutcome {
                text: text.clone(),
                cached: true,
            };
        }

        let empty = BTreeSet::new();
        let eliminated = state.eliminated(index).unwrap_or(&empty);
        let mut text = self.hints.hint(question, eliminated);
        if reveals_answer(&text, &question.correct_answer) {
            debug!(question = index, "hint policy leaked the answer; using a generic nudge");
            text = NUDGES
                .iter()
                .chain(LAST_RESORT_HINTS.iter())
                .find(|candidate| !reveals_answer(candidate, &question.correct_answer))
                .map(|candidate| candidate.to_string())
                .unwrap_or_default();
        }

        state.hinted_questions.insert(index);
        state.cached_hints.insert(index, text.clone());
        HintOutcome { text, cached: false }
    }
}

impl Default for LifelineManager {
    fn default() -> Self {
        Self::new(EliminationPolicy::default(), Arc::new(HintStrategy::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(options: &[&str], correct: &str) -> Question {
        Question {
            question: "Which one?".into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: correct.into(),
            explanation: None,
            tags: Vec::new(),
        }
    }

    fn manager(hints: HintStrategy) -> LifelineManager {
        LifelineManager::new(EliminationPolicy::LowestIndex, Arc::new(hints))
    }

    #[derive(Debug)]
    struct Blabbermouth;

    impl HintPolicy for Blabbermouth {
        fn hint(&self, question: &Question, _eliminated: &BTreeSet<usize>) -> String {
            format!("The answer is {}", question.correct_answer)
        }
    }

    #[test]
    fn fifty_fifty_never_hides_the_correct_option() {
        let q = question(&["Oxygen", "Nitrogen", "Carbon", "Helium"], "Carbon");
        for _ in 0..50 {
            let mut state = LifelineState::default();
            let hidden = LifelineManager::default()
                .fifty_fifty(&mut state, 0, &q)
                .unwrap();
            assert_eq!(hidden.len(), 2);
            assert!(!hidden.contains(&2));
        }
    }

    #[test]
    fn fifty_fifty_is_single_use_per_session() {
        let q = question(&["A", "B", "C", "D"], "A");
        let mut state = LifelineState::default();
        let manager = manager(HintStrategy::Nudge);

        assert_eq!(
            manager.fifty_fifty(&mut state, 0, &q).unwrap(),
            BTreeSet::from([1, 2])
        );
        let before = state.clone();

        assert_eq!(
            manager.fifty_fifty(&mut state, 3, &q),
            Err(OperationError::LifelineUsed(Lifeline::FiftyFifty))
        );
        assert_eq!(
            manager.fifty_fifty(&mut state, 0, &q),
            Err(OperationError::LifelineUsed(Lifeline::FiftyFifty))
        );
        assert_eq!(state, before);
    }

    #[test]
    fn fifty_fifty_on_two_options_hides_one() {
        let q = question(&["True", "False"], "False");
        let mut state = LifelineState::default();
        let hidden = manager(HintStrategy::Nudge)
            .fifty_fifty(&mut state, 0, &q)
            .unwrap();
        assert_eq!(hidden, BTreeSet::from([0]));
    }

    #[test]
    fn hint_is_cached_verbatim() {
        let q = question(&["Paris", "Rome", "Madrid"], "Paris");
        let mut state = LifelineState::default();
        let manager =
            LifelineManager::new(EliminationPolicy::Random, Arc::new(HintStrategy::Mixed));

        let first = manager.hint(&mut state, 0, &q);
        let second = manager.hint(&mut state, 0, &q);

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.text, second.text);
        assert!(state.hinted_questions().contains(&0));
    }

    #[test]
    fn rule_out_skips_eliminated_options() {
        let q = question(&["Paris", "Rome", "Madrid", "Berlin"], "Paris");
        let mut state = LifelineState::default();
        let manager = manager(HintStrategy::RuleOut);
        manager.fifty_fifty(&mut state, 0, &q).unwrap();

        let hint = manager.hint(&mut state, 0, &q);
        assert_eq!(hint.text, "Tip: it is definitely not \"Berlin\".");
    }

    #[test]
    fn length_clue_describes_the_answer_length() {
        let q = question(
            &["Photosynthesis in chloroplasts", "Osmosis"],
            "Photosynthesis in chloroplasts",
        );
        assert_eq!(
            HintStrategy::LengthClue.hint(&q, &BTreeSet::new()),
            "Clue: the answer is one of the longer options."
        );
    }

    #[test]
    fn leaking_hints_are_replaced() {
        let q = question(&["Mitochondria", "Ribosome"], "Mitochondria");
        let mut state = LifelineState::default();
        let manager = LifelineManager::new(EliminationPolicy::LowestIndex, Arc::new(Blabbermouth));

        let hint = manager.hint(&mut state, 0, &q);
        assert!(!hint.text.to_lowercase().contains("mitochondria"));
        assert!(NUDGES.contains(&hint.text.as_str()));
    }
}
