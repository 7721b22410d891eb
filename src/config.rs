//! Engine configuration: session behaviour and scoring thresholds, optionally loaded from JSON.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{info, warn};

use crate::{
    dto::{quiz::QuizDefinition, results::ProficiencyLevel},
    state::{
        lifelines::{EliminationPolicy, HintStrategy},
        state_machine::NavigationMode,
        timer::{DEFAULT_QUESTION_SECONDS, DEFAULT_SESSION_SECONDS, TimingMode},
    },
};

/// Default location on disk where the engine looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/quiz.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_ENGINE_CONFIG_PATH";

/// Pause between locking an answer and revealing the verdict.
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(1_000);
/// How long the verdict stays on screen after a locked answer.
pub const DEFAULT_FEEDBACK_WINDOW: Duration = Duration::from_millis(2_500);
/// How long the verdict stays on screen after the question timed out.
pub const DEFAULT_TIMEOUT_FEEDBACK_WINDOW: Duration = Duration::from_millis(2_000);
/// Points per correct answer.
pub const DEFAULT_POINTS_PER_CORRECT: u32 = 20;
/// Points granted for finishing a session.
pub const DEFAULT_COMPLETION_BONUS: u32 = 50;

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Session flow and lifeline behaviour.
    pub session: SessionConfig,
    /// Score derivation constants.
    pub scoring: ScoringConfig,
}

impl EngineConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        navigation = ?config.session.navigation,
                        "loaded quiz engine config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document. Missing keys take their default values.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

/// How a session flows and which lifeline policies it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Lock-step or free navigation.
    pub navigation: NavigationMode,
    /// Overrides the timing suggested by the quiz definition.
    pub timing: Option<TimingMode>,
    /// Pause between [`crate::state::QuizPhase::Locked`] and the verdict.
    pub reveal_delay: Duration,
    /// Verdict display time after a locked answer.
    pub feedback_window: Duration,
    /// Verdict display time after a per-question timeout.
    pub timeout_feedback_window: Duration,
    /// Which incorrect options a 50:50 hides.
    pub elimination: EliminationPolicy,
    /// Built-in hint policy.
    pub hints: HintStrategy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            navigation: NavigationMode::default(),
            timing: None,
            reveal_delay: DEFAULT_REVEAL_DELAY,
            feedback_window: DEFAULT_FEEDBACK_WINDOW,
            timeout_feedback_window: DEFAULT_TIMEOUT_FEEDBACK_WINDOW,
            elimination: EliminationPolicy::default(),
            hints: HintStrategy::default(),
        }
    }
}

impl SessionConfig {
    /// Lock-step flow with default timing.
    pub fn lock_step() -> Self {
        Self::default()
    }

    /// Free-navigation flow with default timing.
    pub fn free_navigation() -> Self {
        Self {
            navigation: NavigationMode::FreeNavigation,
            ..Self::default()
        }
    }

    /// Replace the timing override.
    pub fn with_timing(mut self, timing: TimingMode) -> Self {
        self.timing = Some(timing);
        self
    }

    /// Timing used for `definition`: this config, then the definition, then the mode default.
    pub fn effective_timing(&self, definition: &QuizDefinition) -> TimingMode {
        self.timing
            .or(definition.timing)
            .unwrap_or(match self.navigation {
                NavigationMode::LockStep => TimingMode::PerQuestion {
                    seconds: DEFAULT_QUESTION_SECONDS,
                },
                NavigationMode::FreeNavigation => TimingMode::WholeSession {
                    seconds: DEFAULT_SESSION_SECONDS,
                },
            })
    }
}

/// Constants used to derive a score report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringConfig {
    /// Letter grades.
    pub grades: GradeScale,
    /// Proficiency tier cutoffs.
    pub proficiency: ProficiencyThresholds,
    /// Points per correct answer.
    pub points_per_correct: u32,
    /// Points granted for finishing.
    pub completion_bonus: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            grades: GradeScale::default(),
            proficiency: ProficiencyThresholds::default(),
            points_per_correct: DEFAULT_POINTS_PER_CORRECT,
            completion_bonus: DEFAULT_COMPLETION_BONUS,
        }
    }
}

/// Letter grades keyed by the minimum percentage that earns them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeScale {
    /// Label to minimum percentage, in display order.
    pub bands: IndexMap<String, u32>,
    /// Label used when no band is reached.
    pub fallback: String,
}

impl Default for GradeScale {
    fn default() -> Self {
        Self {
            bands: IndexMap::from([("A".to_string(), 80), ("B".to_string(), 50)]),
            fallback: "C".to_string(),
        }
    }
}

impl GradeScale {
    /// Label of the highest band `percentage` reaches.
    pub fn grade_for(&self, percentage: u32) -> &str {
        self.bands
            .iter()
            .filter(|(_, min)| percentage >= **min)
            .max_by_key(|(_, min)| **min)
            .map(|(label, _)| label.as_str())
            .unwrap_or(&self.fallback)
    }

    /// Label of the highest configured band.
    pub fn top(&self) -> &str {
        self.grade_for(100)
    }
}

/// Minimum percentages for each proficiency tier; anything lower is novice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProficiencyThresholds {
    /// Cutoff for [`ProficiencyLevel::Master`].
    pub master: u32,
    /// Cutoff for [`ProficiencyLevel::Advanced`].
    pub advanced: u32,
    /// Cutoff for [`ProficiencyLevel::Proficient`].
    pub proficient: u32,
    /// Cutoff for [`ProficiencyLevel::Learner`].
    pub learner: u32,
}

impl Default for ProficiencyThresholds {
    fn default() -> Self {
        Self {
            master: 90,
            advanced: 70,
            proficient: 50,
            learner: 30,
        }
    }
}

impl ProficiencyThresholds {
    /// Tier reached by `percentage`.
    pub fn level_for(&self, percentage: u32) -> ProficiencyLevel {
        if percentage >= self.master {
            ProficiencyLevel::Master
        } else if percentage >= self.advanced {
            ProficiencyLevel::Advanced
        } else if percentage >= self.proficient {
            ProficiencyLevel::Proficient
        } else if percentage >= self.learner {
            ProficiencyLevel::Learner
        } else {
            ProficiencyLevel::Novice
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    session: RawSessionConfig,
    scoring: RawScoringConfig,
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSessionConfig {
    navigation: Option<NavigationMode>,
    timing: Option<TimingMode>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    reveal_delay_ms: Option<Duration>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    feedback_window_ms: Option<Duration>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    timeout_feedback_window_ms: Option<Duration>,
    elimination: Option<EliminationPolicy>,
    hints: Option<HintStrategy>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawScoringConfig {
    grades: Option<IndexMap<String, u32>>,
    grade_fallback: Option<String>,
    proficiency: Option<ProficiencyThresholds>,
    points_per_correct: Option<u32>,
    completion_bonus: Option<u32>,
}

impl From<RawConfig> for EngineConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            session: value.session.into(),
            scoring: value.scoring.into(),
        }
    }
}

impl From<RawSessionConfig> for SessionConfig {
    fn from(value: RawSessionConfig) -> Self {
        let defaults = SessionConfig::default();
        Self {
            navigation: value.navigation.unwrap_or(defaults.navigation),
            timing: value.timing,
            reveal_delay: value.reveal_delay_ms.unwrap_or(defaults.reveal_delay),
            feedback_window: value.feedback_window_ms.unwrap_or(defaults.feedback_window),
            timeout_feedback_window: value
                .timeout_feedback_window_ms
                .unwrap_or(defaults.timeout_feedback_window),
            elimination: value.elimination.unwrap_or(defaults.elimination),
            hints: value.hints.unwrap_or(defaults.hints),
        }
    }
}

impl From<RawScoringConfig> for ScoringConfig {
    fn from(value: RawScoringConfig) -> Self {
        let defaults = ScoringConfig::default();
        Self {
            grades: GradeScale {
                bands: value.grades.unwrap_or(defaults.grades.bands),
                fallback: value.grade_fallback.unwrap_or(defaults.grades.fallback),
            },
            proficiency: value.proficiency.unwrap_or(defaults.proficiency),
            points_per_correct: value
                .points_per_correct
                .unwrap_or(defaults.points_per_correct),
            completion_bonus: value.completion_bonus.unwrap_or(defaults.completion_bonus),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
