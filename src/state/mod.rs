//! In-memory quiz session: phase machine, countdown, answers and lifelines.

pub mod answers;
pub mod lifelines;
pub mod state_machine;
pub mod timer;

use std::{collections::BTreeSet, sync::Arc, time::Duration};

use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::{ScoringConfig, SessionConfig},
    dto::{
        quiz::{Question, QuizDefinition},
        results::{ReviewItem, ScoreReport, SessionResults, SessionSnapshot},
    },
    error::{OperationError, ValidationError},
    services::{review, scoring},
};

pub use self::state_machine::{NavigationMode, QuizPhase, SubmitReason};
use self::{
    answers::AnswerTracker,
    lifelines::{HintPolicy, LifelineManager, LifelineState},
    state_machine::{QuizEvent, QuizStateMachine},
    timer::{Countdown, Tick, TimerTicket},
};

/// Identifies the phase transition a delayed follow-up was scheduled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhaseTicket {
    /// Session the follow-up belongs to.
    pub session_id: Uuid,
    /// State machine version at scheduling time.
    pub transition: u64,
}

/// Work the host must schedule: call [`QuizSession::resolve_followup`] after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Followup {
    /// Guard checked when the follow-up fires.
    pub ticket: PhaseTicket,
    /// How long to wait.
    pub delay: Duration,
}

/// Result of resolving a [`Followup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowupOutcome {
    /// The session moved on since scheduling; nothing happened.
    Stale,
    /// The verdict is now shown; schedule the returned follow-up to move on.
    Revealing(Followup),
    /// The session moved to a new question or was submitted.
    Moved(QuizPhase),
}

/// Result of delivering one timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick was scheduled against a countdown that no longer exists.
    Stale,
    /// The countdown is stopped.
    Idle,
    /// One second consumed.
    Ticked {
        /// Seconds left.
        remaining: u32,
    },
    /// The countdown reached zero and the session reacted.
    Expired {
        /// Question in focus when time ran out.
        question: usize,
        /// Phase after the reaction.
        phase: QuizPhase,
        /// Follow-up to schedule, when the verdict is being shown.
        followup: Option<Followup>,
    },
}

/// Direction for free navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// One question back.
    Previous,
    /// One question forward.
    Next,
}

/// Mutable state of one quiz run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    session_id: Uuid,
    current_index: usize,
    machine: QuizStateMachine,
    countdown: Countdown,
    answers: AnswerTracker,
    lifelines: LifelineState,
    version: u64,
    submit_reason: Option<SubmitReason>,
}

impl SessionState {
    fn initial(definition: &QuizDefinition, config: &SessionConfig) -> Self {
        let mut countdown = Countdown::new(config.effective_timing(definition));
        countdown.arm();

        Self {
            session_id: Uuid::new_v4(),
            current_index: 0,
            machine: QuizStateMachine::new(config.navigation, definition.question_count()),
            countdown,
            answers: AnswerTracker::new(),
            lifelines: LifelineState::default(),
            version: 0,
            submit_reason: None,
        }
    }

    /// Identifier, renewed by every restart.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Question in focus.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Current phase.
    pub fn phase(&self) -> QuizPhase {
        self.machine.phase()
    }

    /// Countdown backing the session timer.
    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    /// Recorded answers.
    pub fn answers(&self) -> &AnswerTracker {
        &self.answers
    }

    /// Lifeline usage.
    pub fn lifelines(&self) -> &LifelineState {
        &self.lifelines
    }

    /// Incremented on every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of phase transitions so far. Follow-up tickets are checked against it.
    pub fn phase_version(&self) -> u64 {
        self.machine.version()
    }

    /// Why the session ended, once submitted.
    pub fn submit_reason(&self) -> Option<SubmitReason> {
        self.submit_reason
    }
}

/// The quiz engine: owns the definition, the configuration and the session state.
///
/// All mutation goes through the methods below. Each one either commits completely or
/// returns an [`OperationError`] with the state untouched.
#[derive(Debug)]
pub struct QuizSession {
    definition: QuizDefinition,
    config: SessionConfig,
    lifeline_manager: LifelineManager,
    state: SessionState,
}

impl QuizSession {
    /// Validate `definition` and start a session presenting the first question.
    pub fn start(
        definition: QuizDefinition,
        config: SessionConfig,
    ) -> Result<Self, ValidationError> {
        let hints = Arc::new(config.hints);
        Self::start_with_hints(definition, config, hints)
    }

    /// Like [`Self::start`], with a custom hint policy.
    pub fn start_with_hints(
        definition: QuizDefinition,
        config: SessionConfig,
        hints: Arc<dyn HintPolicy>,
    ) -> Result<Self, ValidationError> {
        definition.validate()?;

        let state = SessionState::initial(&definition, &config);
        info!(
            session_id = %state.session_id,
            title = %definition.title,
            questions = definition.question_count(),
            navigation = ?config.navigation,
            timing = ?state.countdown.mode(),
            "quiz session started"
        );

        Ok(Self {
            lifeline_manager: LifelineManager::new(config.elimination, hints),
            definition,
            config,
            state,
        })
    }

    /// Discard all progress and start over with a new session id.
    pub fn restart(&mut self) -> Uuid {
        let previous = self.state.session_id;
        self.state = SessionState::initial(&self.definition, &self.config);
        info!(
            session_id = %self.state.session_id,
            previous = %previous,
            "quiz session restarted"
        );
        self.state.session_id
    }

    /// Quiz being played.
    pub fn definition(&self) -> &QuizDefinition {
        &self.definition
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Full session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current session id.
    pub fn id(&self) -> Uuid {
        self.state.session_id
    }

    /// Current phase.
    pub fn phase(&self) -> QuizPhase {
        self.state.phase()
    }

    /// Change counter for hosts.
    pub fn version(&self) -> u64 {
        self.state.version
    }

    /// Ticket to attach to the next timer tick, while the countdown runs.
    pub fn timer_ticket(&self) -> Option<TimerTicket> {
        self.state.countdown.ticket(self.state.session_id)
    }

    /// Point-in-time view for rendering and change detection.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.state.session_id,
            phase: (&self.state.phase()).into(),
            current_question: self.state.current_index,
            question_count: self.definition.question_count(),
            remaining_seconds: self.state.countdown.remaining(),
            version: self.state.version,
        }
    }

    /// Record a tentative selection for question `index`.
    pub fn select_option(&mut self, index: usize, option: &str) -> Result<(), OperationError> {
        self.ensure_open()?;
        let invalid = || OperationError::InvalidOption {
            question: index,
            option: option.to_string(),
        };
        let question = self.definition.questions.get(index).ok_or_else(invalid)?;
        let option_index = question.option_index(option).ok_or_else(invalid)?;
        self.ensure_editable(index)?;

        if self.state.lifelines.is_eliminated(index, option_index) {
            return Err(OperationError::OptionEliminated {
                question: index,
                option: option.to_string(),
            });
        }

        if self.state.answers.select(index, option) {
            self.touch();
        }
        Ok(())
    }

    /// Record a tentative selection by option position.
    pub fn select_option_at(
        &mut self,
        index: usize,
        option_index: usize,
    ) -> Result<(), OperationError> {
        let option = self
            .definition
            .questions
            .get(index)
            .and_then(|question| question.options.get(option_index))
            .cloned()
            .ok_or_else(|| OperationError::InvalidOption {
                question: index,
                option: format!("#{option_index}"),
            })?;
        self.select_option(index, &option)
    }

    /// Lock the presented answer (lock-step only) and schedule the reveal.
    pub fn lock_answer(&mut self) -> Result<Followup, OperationError> {
        self.ensure_open()?;
        self.state.machine.peek(QuizEvent::Lock)?;
        let index = self.state.current_index;
        if self.state.answers.selection(index).is_none() {
            return Err(OperationError::NoSelection { question: index });
        }

        self.state.machine.apply(QuizEvent::Lock)?;
        self.state.answers.lock(index);
        if self.state.countdown.mode().is_per_question() {
            self.state.countdown.cancel();
        }
        self.touch();
        debug!(session_id = %self.state.session_id, question = index, "answer locked");

        Ok(self.followup(self.config.reveal_delay))
    }

    /// Continue a delayed phase change scheduled by an earlier operation.
    pub fn resolve_followup(&mut self, ticket: PhaseTicket) -> FollowupOutcome {
        if ticket.session_id != self.state.session_id
            || ticket.transition != self.state.phase_version()
        {
            debug!(session_id = %self.state.session_id, ?ticket, "discarding stale follow-up");
            return FollowupOutcome::Stale;
        }

        match self.state.phase() {
            QuizPhase::Locked(_) => match self.transition(QuizEvent::Reveal) {
                Ok(_) => FollowupOutcome::Revealing(self.followup(self.config.feedback_window)),
                Err(err) => {
                    debug!(error = %err, "reveal follow-up rejected");
                    FollowupOutcome::Stale
                }
            },
            QuizPhase::Revealing(_) => match self.advance() {
                Ok(phase) => FollowupOutcome::Moved(phase),
                Err(err) => {
                    debug!(error = %err, "advance follow-up rejected");
                    FollowupOutcome::Stale
                }
            },
            QuizPhase::Presenting(_) | QuizPhase::Submitted => FollowupOutcome::Stale,
        }
    }

    /// Move one question back or forward (free navigation only), clamped to the quiz.
    pub fn navigate(&mut self, direction: Direction) -> Result<usize, OperationError> {
        let current = self.state.current_index;
        let target = match direction {
            Direction::Previous => current.saturating_sub(1),
            Direction::Next => (current + 1).min(self.definition.question_count() - 1),
        };
        self.move_to(target)
    }

    /// Jump to question `index` (free navigation only).
    pub fn jump_to(&mut self, index: usize) -> Result<usize, OperationError> {
        let count = self.definition.question_count();
        if index >= count {
            return Err(OperationError::QuestionOutOfRange {
                question: index,
                count,
            });
        }
        self.move_to(index)
    }

    /// Close the session. Unfinalised answers count as skipped.
    pub fn submit(&mut self) -> Result<(), OperationError> {
        self.ensure_open()?;
        self.close(SubmitReason::Manual)
    }

    /// Stop the countdown without changing phase. Returns whether it was running.
    pub fn cancel_timer(&mut self) -> bool {
        if self.state.countdown.cancel() {
            self.touch();
            debug!(session_id = %self.state.session_id, "timer cancelled");
            true
        } else {
            false
        }
    }

    /// Deliver one timer tick scheduled with `ticket`.
    pub fn on_tick(&mut self, ticket: TimerTicket) -> TickOutcome {
        if ticket.session_id != self.state.session_id || !self.state.countdown.accepts(&ticket) {
            debug!(session_id = %self.state.session_id, ?ticket, "discarding stale tick");
            return TickOutcome::Stale;
        }

        match self.state.countdown.tick() {
            Tick::Idle => TickOutcome::Idle,
            Tick::Running(remaining) => {
                self.touch();
                TickOutcome::Ticked { remaining }
            }
            Tick::Expired => {
                self.touch();
                self.on_expired()
            }
        }
    }

    /// Spend the session's 50:50 on question `index`, returning the hidden option indexes.
    pub fn fifty_fifty(&mut self, index: usize) -> Result<BTreeSet<usize>, OperationError> {
        self.ensure_open()?;
        if self.state.lifelines.fifty_fifty_consumed() {
            return Err(OperationError::LifelineUsed(lifelines::Lifeline::FiftyFifty));
        }
        let question = question_at(&self.definition, index)?;
        self.ensure_editable(index)?;

        let hidden =
            self.lifeline_manager
                .fifty_fifty(&mut self.state.lifelines, index, question)?;
        let selected_hidden = self
            .state
            .answers
            .selection(index)
            .and_then(|selected| question.option_index(selected))
            .is_some_and(|selected| hidden.contains(&selected));
        if selected_hidden {
            self.state.answers.clear_tentative(index);
        }
        self.touch();
        info!(session_id = %self.state.session_id, question = index, "50:50 used");

        Ok(hidden)
    }

    /// Hint for question `index`. Repeated calls return the cached text unchanged.
    pub fn hint(&mut self, index: usize) -> Result<String, OperationError> {
        let question = question_at(&self.definition, index)?;
        if let Some(text) = self.state.lifelines.cached_hint(index) {
            return Ok(text.to_string());
        }
        self.ensure_open()?;
        self.ensure_editable(index)?;

        let outcome = self
            .lifeline_manager
            .hint(&mut self.state.lifelines, index, question);
        self.touch();
        info!(session_id = %self.state.session_id, question = index, "hint used");

        Ok(outcome.text)
    }

    /// Score report of a submitted session.
    pub fn report(&self, config: &ScoringConfig) -> Result<ScoreReport, OperationError> {
        self.ensure_submitted()?;
        Ok(scoring::score(&self.definition, &self.state.answers, config))
    }

    /// Per-question review of a submitted session.
    pub fn review(&self) -> Result<Vec<ReviewItem>, OperationError> {
        self.ensure_submitted()?;
        Ok(review::review(&self.definition, &self.state.answers))
    }

    /// Results to hand over to a grading or storage collaborator.
    pub fn results(&self, config: &ScoringConfig) -> Result<SessionResults, OperationError> {
        let report = self.report(config)?;
        Ok(SessionResults {
            session_id: self.state.session_id,
            title: self.definition.title.clone(),
            topic: self.definition.topic.clone(),
            answers: self.state.answers.records().cloned().collect(),
            report,
        })
    }

    fn on_expired(&mut self) -> TickOutcome {
        let question = self.state.current_index;
        info!(
            session_id = %self.state.session_id,
            question,
            mode = ?self.state.countdown.mode(),
            "time expired"
        );

        let result = if self.state.countdown.mode().is_per_question() {
            self.expire_question(question)
        } else {
            self.close(SubmitReason::TimeExpired).map(|()| None)
        };

        match result {
            Ok(followup) => TickOutcome::Expired {
                question,
                phase: self.state.phase(),
                followup,
            },
            Err(err) => {
                debug!(error = %err, "expiry had no effect");
                TickOutcome::Idle
            }
        }
    }

    fn expire_question(&mut self, index: usize) -> Result<Option<Followup>, OperationError> {
        let phase = self.transition(QuizEvent::Expire)?;
        self.state.answers.lock(index);

        match phase {
            QuizPhase::Revealing(_) => Ok(Some(self.followup(self.config.timeout_feedback_window))),
            QuizPhase::Presenting(next) => {
                self.present(next);
                Ok(None)
            }
            QuizPhase::Submitted => {
                self.finish(SubmitReason::TimeExpired);
                Ok(None)
            }
            QuizPhase::Locked(_) => Ok(None),
        }
    }

    fn advance(&mut self) -> Result<QuizPhase, OperationError> {
        let phase = self.transition(QuizEvent::Advance)?;
        match phase {
            QuizPhase::Presenting(next) => self.present(next),
            QuizPhase::Submitted => self.finish(SubmitReason::Completed),
            QuizPhase::Locked(_) | QuizPhase::Revealing(_) => {}
        }
        Ok(phase)
    }

    fn move_to(&mut self, target: usize) -> Result<usize, OperationError> {
        self.ensure_open()?;
        self.state.machine.peek(QuizEvent::Navigate(target))?;
        if target == self.state.current_index {
            return Ok(target);
        }

        self.state.machine.apply(QuizEvent::Navigate(target))?;
        self.present(target);
        Ok(target)
    }

    fn close(&mut self, reason: SubmitReason) -> Result<(), OperationError> {
        self.transition(QuizEvent::Submit(reason))?;
        self.finish(reason);
        Ok(())
    }

    /// Freeze answers and the countdown once the machine reached `Submitted`.
    fn finish(&mut self, reason: SubmitReason) {
        match self.state.machine.navigation() {
            NavigationMode::FreeNavigation => self.state.answers.lock_all_selected(),
            NavigationMode::LockStep => self.state.answers.discard_tentative(),
        }
        self.state.countdown.cancel();
        self.state.submit_reason = Some(reason);
        self.touch();
        info!(
            session_id = %self.state.session_id,
            ?reason,
            answered = self.state.answers.answered_count(),
            "quiz session submitted"
        );
    }

    fn present(&mut self, index: usize) {
        self.state.current_index = index;
        if self.state.countdown.mode().is_per_question() {
            self.state.countdown.arm();
        }
        self.touch();
    }

    fn transition(&mut self, event: QuizEvent) -> Result<QuizPhase, OperationError> {
        let phase = self.state.machine.apply(event)?;
        self.touch();
        Ok(phase)
    }

    fn followup(&self, delay: Duration) -> Followup {
        Followup {
            ticket: PhaseTicket {
                session_id: self.state.session_id,
                transition: self.state.phase_version(),
            },
            delay,
        }
    }

    fn ensure_open(&self) -> Result<(), OperationError> {
        if self.state.phase().is_submitted() {
            return Err(OperationError::SessionClosed);
        }
        Ok(())
    }

    fn ensure_submitted(&self) -> Result<(), OperationError> {
        if !self.state.phase().is_submitted() {
            return Err(OperationError::SessionInProgress);
        }
        Ok(())
    }

    /// Whether the answer to `index` may still change.
    fn ensure_editable(&self, index: usize) -> Result<(), OperationError> {
        if self.state.answers.is_locked(index) {
            return Err(OperationError::AnswerLocked { question: index });
        }
        match (self.state.machine.navigation(), self.state.phase()) {
            (NavigationMode::LockStep, QuizPhase::Presenting(current)) if current == index => {
                Ok(())
            }
            (NavigationMode::LockStep, _) => {
                Err(OperationError::QuestionNotActive { question: index })
            }
            (NavigationMode::FreeNavigation, _) => Ok(()),
        }
    }

    fn touch(&mut self) {
        self.state.version += 1;
    }
}

fn question_at(definition: &QuizDefinition, index: usize) -> Result<&Question, OperationError> {
    definition
        .questions
        .get(index)
        .ok_or(OperationError::QuestionOutOfRange {
            question: index,
            count: definition.question_count(),
        })
}

#[cfg(test)]
mod tests {
    use super::{lifelines::Lifeline, timer::TimingMode, *};
    use crate::{dto::results::ProficiencyLevel, state::lifelines::EliminationPolicy};

    fn question(prompt: &str, options: &[&str], correct: &str) -> Question {
        Question {
            question: prompt.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer: correct.into(),
            explanation: None,
            tags: Vec::new(),
        }
    }

    /// Five questions whose correct answer is always "right".
    fn five_questions() -> QuizDefinition {
        QuizDefinition {
            title: "Checkpoint".into(),
            topic: "General".into(),
            questions: (0..5)
                .map(|i| question(&format!("Question {i}"), &["right", "wrong", "other"], "right"))
                .collect(),
            timing: None,
        }
    }

    fn lock_step(seconds: u32) -> SessionConfig {
        SessionConfig {
            elimination: EliminationPolicy::LowestIndex,
            ..SessionConfig::lock_step().with_timing(TimingMode::PerQuestion { seconds })
        }
    }

    fn free(seconds: u32) -> SessionConfig {
        SessionConfig::free_navigation().with_timing(TimingMode::WholeSession { seconds })
    }

    /// Lock the current selection and run both follow-ups.
    fn lock_and_advance(session: &mut QuizSession) -> QuizPhase {
        let reveal = session.lock_answer().unwrap();
        let FollowupOutcome::Revealing(next) = session.resolve_followup(reveal.ticket) else {
            panic!("expected the verdict to be revealed");
        };
        match session.resolve_followup(next.ticket) {
            FollowupOutcome::Moved(phase) => phase,
            other => panic!("expected to move on, got {other:?}"),
        }
    }

    fn tick_until_expired(session: &mut QuizSession) -> TickOutcome {
        loop {
            let ticket = session.timer_ticket().expect("timer should be running");
            match session.on_tick(ticket) {
                TickOutcome::Ticked { .. } => continue,
                other => return other,
            }
        }
    }

    #[test]
    fn start_rejects_malformed_definitions() {
        let mut empty = five_questions();
        empty.questions.clear();
        assert!(QuizSession::start(empty, lock_step(30)).is_err());

        let mut one_option = five_questions();
        one_option.questions[2] = question("Lonely", &["only"], "only");
        assert!(QuizSession::start(one_option, lock_step(30)).is_err());

        let mut missing = five_questions();
        missing.questions[4].correct_answer = "Right".into();
        let err = QuizSession::start(missing, lock_step(30)).unwrap_err();
        assert!(err.to_string().contains("invalid quiz definition"));
    }

    #[test]
    fn start_presents_first_question_with_armed_timer() {
        let session = QuizSession::start(five_questions(), lock_step(30)).unwrap();
        assert_eq!(session.phase(), QuizPhase::Presenting(0));
        assert_eq!(session.state().countdown().remaining(), 30);
        assert!(session.timer_ticket().is_some());
        assert_eq!(session.version(), 0);
    }

    #[test]
    fn lock_step_flow_records_and_advances() {
        let mut session = QuizSession::start(five_questions(), lock_step(30)).unwrap();

        session.select_option(0, "wrong").unwrap();
        session.select_option(0, "right").unwrap();
        let reveal = session.lock_answer().unwrap();
        assert_eq!(session.phase(), QuizPhase::Locked(0));
        assert_eq!(reveal.delay, session.config().reveal_delay);
        assert!(session.timer_ticket().is_none());

        let FollowupOutcome::Revealing(next) = session.resolve_followup(reveal.ticket) else {
            panic!("expected reveal");
        };
        assert_eq!(session.phase(), QuizPhase::Revealing(0));
        assert_eq!(next.delay, session.config().feedback_window);

        assert_eq!(
            session.resolve_followup(next.ticket),
            FollowupOutcome::Moved(QuizPhase::Presenting(1))
        );
        assert_eq!(session.state().current_index(), 1);
        assert_eq!(session.state().countdown().remaining(), 30);

        let record = session.state().answers().get(0).unwrap();
        assert!(record.locked);
        assert_eq!(record.selected.as_deref(), Some("right"));
    }

    #[test]
    fn locking_requires_a_selection() {
        let mut session = QuizSession::start(five_questions(), lock_step(30)).unwrap();
        let before = session.state().clone();

        assert_eq!(
            session.lock_answer(),
            Err(OperationError::NoSelection { question: 0 })
        );
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn rejected_operations_leave_state_untouched() {
        let mut session = QuizSession::start(five_questions(), lock_step(30)).unwrap();
        session.select_option(0, "wrong").unwrap();
        let before = session.state().clone();

        assert!(matches!(
            session.select_option(0, "missing"),
            Err(OperationError::InvalidOption { question: 0, .. })
        ));
        assert!(matches!(
            session.select_option(9, "right"),
            Err(OperationError::InvalidOption { question: 9, .. })
        ));
        assert_eq!(
            session.select_option(1, "right"),
            Err(OperationError::QuestionNotActive { question: 1 })
        );
        assert!(matches!(
            session.navigate(Direction::Next),
            Err(OperationError::InvalidTransition(_))
        ));
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn locked_answers_cannot_change() {
        let mut session = QuizSession::start(five_questions(), lock_step(30)).unwrap();
        session.select_option(0, "right").unwrap();
        session.lock_answer().unwrap();

        assert_eq!(
            session.select_option(0, "wrong"),
            Err(OperationError::AnswerLocked { question: 0 })
        );
        assert!(matches!(
            session.lock_answer(),
            Err(OperationError::InvalidTransition(_))
        ));
    }

    #[test]
    fn per_question_expiry_finalises_and_advances_by_one() {
        let mut session = QuizSession::start(five_questions(), lock_step(3)).unwrap();
        session.select_option(0, "wrong").unwrap();

        let TickOutcome::Expired {
            question,
            phase,
            followup: Some(followup),
        } = tick_until_expired(&mut session)
        else {
            panic!("expected expiry with a follow-up");
        };
        assert_eq!(question, 0);
        assert_eq!(phase, QuizPhase::Revealing(0));
        assert_eq!(followup.delay, session.config().timeout_feedback_window);
        assert!(session.state().answers().is_locked(0));
        assert_eq!(session.state().answers().selection(0), Some("wrong"));

        assert_eq!(
            session.resolve_followup(followup.ticket),
            FollowupOutcome::Moved(QuizPhase::Presenting(1))
        );

        // No selection this time: finalised as unanswered.
        let TickOutcome::Expired {
            followup: Some(followup),
            ..
        } = tick_until_expired(&mut session)
        else {
            panic!("expected expiry with a follow-up");
        };
        let record = session.state().answers().get(1).unwrap();
        assert!(record.locked);
        assert_eq!(record.selected, None);
        session.resolve_followup(followup.ticket);
        assert_eq!(session.state().current_index(), 2);
    }

    #[test]
    fn expiry_on_last_question_submits() {
        let definition = QuizDefinition {
            questions: vec![question("Only one", &["yes", "no"], "yes")],
            ..five_questions()
        };
        let mut session = QuizSession::start(definition, lock_step(1)).unwrap();

        let TickOutcome::Expired {
            followup: Some(followup),
            ..
        } = tick_until_expired(&mut session)
        else {
            panic!("expected expiry");
        };
        assert_eq!(
            session.resolve_followup(followup.ticket),
            FollowupOutcome::Moved(QuizPhase::Submitted)
        );
        assert_eq!(session.state().submit_reason(), Some(SubmitReason::Completed));
    }

    #[test]
    fn whole_session_expiry_forces_submit() {
        let mut session = QuizSession::start(five_questions(), free(2)).unwrap();
        session.select_option(3, "right").unwrap();

        let outcome = tick_until_expired(&mut session);
        assert!(matches!(
            outcome,
            TickOutcome::Expired {
                phase: QuizPhase::Submitted,
                followup: None,
                ..
            }
        ));
        assert_eq!(session.state().submit_reason(), Some(SubmitReason::TimeExpired));
        assert!(session.state().answers().is_locked(3));
        assert_eq!(session.select_option(0, "right"), Err(OperationError::SessionClosed));
    }

    #[test]
    fn free_navigation_moves_and_clamps() {
        let mut session = QuizSession::start(five_questions(), free(600)).unwrap();

        assert_eq!(session.navigate(Direction::Previous), Ok(0));
        assert_eq!(session.navigate(Direction::Next), Ok(1));
        assert_eq!(session.jump_to(4), Ok(4));
        let version = session.version();
        assert_eq!(session.navigate(Direction::Next), Ok(4));
        assert_eq!(session.version(), version);
        assert_eq!(
            session.jump_to(5),
            Err(OperationError::QuestionOutOfRange {
                question: 5,
                count: 5
            })
        );
        assert!(matches!(
            session.lock_answer(),
            Err(OperationError::InvalidTransition(_))
        ));
        assert!(session.state().answers().is_empty());
    }

    #[test]
    fn partial_submission_scores_skips() {
        let mut session = QuizSession::start(five_questions(), free(600)).unwrap();
        session.select_option(0, "right").unwrap();
        session.select_option(1, "wrong").unwrap();
        assert_eq!(
            session.report(&ScoringConfig::default()),
            Err(OperationError::SessionInProgress)
        );

        session.submit().unwrap();
        let report = session.report(&ScoringConfig::default()).unwrap();
        assert_eq!(report.correct, 1);
        assert_eq!(report.wrong, 1);
        assert_eq!(report.skipped, 3);
        assert_eq!(session.submit(), Err(OperationError::SessionClosed));
    }

    #[test]
    fn lock_step_submit_discards_tentative_selection() {
        let mut session = QuizSession::start(five_questions(), lock_step(30)).unwrap();
        session.select_option(0, "right").unwrap();
        lock_and_advance(&mut session);
        session.select_option(1, "right").unwrap();
        session.submit().unwrap();

        let report = session.report(&ScoringConfig::default()).unwrap();
        assert_eq!(report.correct, 1);
        assert_eq!(report.skipped, 4);
        assert!(session.timer_ticket().is_none());
    }

    #[test]
    fn full_lock_step_run_scores_three_of_five() {
        let mut session = QuizSession::start(five_questions(), lock_step(30)).unwrap();
        let mut phase = session.phase();
        for pick in ["right", "wrong", "right", "wrong", "right"] {
            let QuizPhase::Presenting(index) = phase else {
                panic!("unexpected phase {phase:?}");
            };
            session.select_option(index, pick).unwrap();
            phase = lock_and_advance(&mut session);
        }
        assert_eq!(phase, QuizPhase::Submitted);

        let report = session.report(&ScoringConfig::default()).unwrap();
        assert_eq!((report.correct, report.wrong, report.skipped), (3, 2, 0));
        assert_eq!(report.percentage, 60);
        assert_eq!(report.grade, "B");
        assert_eq!(report.proficiency_level, ProficiencyLevel::Proficient);
        assert_eq!(report.points, 110);

        let review = session.review().unwrap();
        assert!(review[0].is_correct);
        assert_eq!(review[0].selected_option.as_deref(), Some(review[0].correct_option.as_str()));
        assert!(!review[1].is_correct);

        let results = session.results(&ScoringConfig::default()).unwrap();
        assert_eq!(results.answers.len(), 5);
        assert_eq!(results.report, report);
    }

    #[test]
    fn stale_callbacks_are_ignored_after_submit_restart_and_cancel() {
        let mut session = QuizSession::start(five_questions(), lock_step(30)).unwrap();
        let tick = session.timer_ticket().unwrap();
        session.select_option(0, "right").unwrap();
        let reveal = session.lock_answer().unwrap();

        // Locking cancelled the per-question countdown.
        assert_eq!(session.on_tick(tick), TickOutcome::Stale);

        session.submit().unwrap();
        let frozen = session.state().clone();
        assert_eq!(session.resolve_followup(reveal.ticket), FollowupOutcome::Stale);
        assert_eq!(session.state(), &frozen);

        session.restart();
        let old_id_ticket = PhaseTicket {
            session_id: frozen.session_id(),
            transition: session.state().phase_version(),
        };
        assert_eq!(session.resolve_followup(old_id_ticket), FollowupOutcome::Stale);

        let tick = session.timer_ticket().unwrap();
        assert!(session.cancel_timer());
        assert_eq!(session.on_tick(tick), TickOutcome::Stale);
        assert_eq!(session.phase(), QuizPhase::Presenting(0));
    }

    #[test]
    fn restart_matches_a_fresh_start() {
        let mut session = QuizSession::start(five_questions(), lock_step(30)).unwrap();
        let initial = session.state().clone();

        session.select_option(0, "right").unwrap();
        session.fifty_fifty(0).unwrap();
        session.hint(0).unwrap();
        lock_and_advance(&mut session);
        session.on_tick(session.timer_ticket().unwrap());

        let new_id = session.restart();
        assert_ne!(new_id, initial.session_id);

        let mut restarted = session.state().clone();
        restarted.session_id = initial.session_id;
        assert_eq!(restarted, initial);
        assert!(!session.state().lifelines().fifty_fifty_consumed());
    }

    #[test]
    fn fifty_fifty_leaves_only_the_correct_option_of_three() {
        let mut session = QuizSession::start(five_questions(), lock_step(30)).unwrap();
        let hidden = session.fifty_fifty(0).unwrap();
        assert_eq!(hidden, BTreeSet::from([1, 2]));

        let remaining: Vec<&str> = session.definition().questions[0]
            .options
            .iter()
            .enumerate()
            .filter(|(i, _)| !session.state().lifelines().is_eliminated(0, *i))
            .map(|(_, option)| option.as_str())
            .collect();
        assert_eq!(remaining, vec!["right"]);
        assert_eq!(
            session.select_option(0, "wrong"),
            Err(OperationError::OptionEliminated {
                question: 0,
                option: "wrong".into()
            })
        );
    }

    #[test]
    fn fifty_fifty_is_single_use_across_questions() {
        let mut session = QuizSession::start(five_questions(), free(600)).unwrap();
        session.select_option(2, "other").unwrap();
        session.fifty_fifty(2).unwrap();
        assert_eq!(session.state().answers().selection(2), None);

        let before = session.state().clone();
        assert_eq!(
            session.fifty_fifty(3),
            Err(OperationError::LifelineUsed(Lifeline::FiftyFifty))
        );
        assert_eq!(
            session.fifty_fifty(2),
            Err(OperationError::LifelineUsed(Lifeline::FiftyFifty))
        );
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn hint_is_idempotent_and_safe() {
        let mut session = QuizSession::start(five_questions(), lock_step(30)).unwrap();
        let first = session.hint(0).unwrap();
        let version = session.version();
        let second = session.hint(0).unwrap();

        assert_eq!(first, second);
        assert_eq!(session.version(), version);
        assert!(!first.contains("\"right\""));
        assert_eq!(
            session.hint(1),
            Err(OperationError::QuestionNotActive { question: 1 })
        );
    }

    #[test]
    fn lifelines_are_frozen_after_submit() {
        let mut session = QuizSession::start(five_questions(), free(600)).unwrap();
        let hint = session.hint(0).unwrap();
        session.submit().unwrap();

        assert_eq!(session.fifty_fifty(1), Err(OperationError::SessionClosed));
        assert_eq!(session.hint(1), Err(OperationError::SessionClosed));
        assert_eq!(session.hint(0), Ok(hint));
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut session = QuizSession::start(five_questions(), free(90)).unwrap();
        session.jump_to(2).unwrap();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.session_id, session.id());
        assert_eq!(snapshot.current_question, 2);
        assert_eq!(snapshot.question_count, 5);
        assert_eq!(snapshot.remaining_seconds, 90);
        assert_eq!(snapshot.version, session.version());
    }
}
