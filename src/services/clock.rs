use std::{
    collections::BTreeSet,
    sync::{Arc, Weak},
    time::Duration,
};

use tokio::{
    sync::{Mutex, broadcast, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at, sleep},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    config::ScoringConfig,
    dto::{
        events::SessionEvent,
        results::{ReviewItem, ScoreReport, SessionResults, SessionSnapshot},
    },
    error::OperationError,
    services::events::EventHub,
    state::{
        Direction, FollowupOutcome, Followup, QuizPhase, QuizSession, TickOutcome,
        lifelines::Lifeline,
        timer::{TimerTicket, is_running_low},
    },
};

/// Period of the session clock.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Shared handle to a [`SessionHandle`].
pub type SharedSession = Arc<SessionHandle>;

/// Async host adapter around a [`QuizSession`].
///
/// Serialises every call behind one mutex, drives the countdown, schedules delayed phase
/// changes and publishes what happened to observers.
#[derive(Debug)]
pub struct SessionHandle {
    session: Mutex<QuizSession>,
    scoring: ScoringConfig,
    events: EventHub,
    version: watch::Sender<u64>,
}

/// Phase and question observed before an operation, used to detect what changed.
#[derive(Clone, Copy)]
struct Before {
    phase: QuizPhase,
    question: usize,
    session_id: Uuid,
}

impl Before {
    fn of(session: &QuizSession) -> Self {
        Self {
            phase: session.phase(),
            question: session.state().current_index(),
            session_id: session.id(),
        }
    }
}

impl SessionHandle {
    /// Wrap a started session.
    pub fn new(session: QuizSession, scoring: ScoringConfig) -> SharedSession {
        let (version, _rx) = watch::channel(session.version());
        Arc::new(Self {
            session: Mutex::new(session),
            scoring,
            events: EventHub::default(),
            version,
        })
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Subscribe to version updates.
    pub fn version_watcher(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Point-in-time view of the session.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    /// Record a tentative selection.
    pub async fn select_option(&self, index: usize, option: &str) -> Result<(), OperationError> {
        let mut session = self.session.lock().await;
        session.select_option(index, option)?;
        self.notify_version(session.version());
        Ok(())
    }

    /// Lock the presented answer and schedule the reveal and the move to the next question.
    pub async fn lock_answer(self: &Arc<Self>) -> Result<(), OperationError> {
        let mut session = self.session.lock().await;
        let before = Before::of(&session);
        let followup = session.lock_answer()?;
        self.publish(&session, before);
        drop(session);

        self.schedule(followup);
        Ok(())
    }

    /// Move one question back or forward.
    pub async fn navigate(&self, direction: Direction) -> Result<usize, OperationError> {
        let mut session = self.session.lock().await;
        let before = Before::of(&session);
        let index = session.navigate(direction)?;
        self.publish(&session, before);
        Ok(index)
    }

    /// Jump to a question.
    pub async fn jump_to(&self, index: usize) -> Result<usize, OperationError> {
        let mut session = self.session.lock().await;
        let before = Before::of(&session);
        let index = session.jump_to(index)?;
        self.publish(&session, before);
        Ok(index)
    }

    /// Submit the session and return its score report.
    pub async fn submit(&self) -> Result<ScoreReport, OperationError> {
        let mut session = self.session.lock().await;
        let before = Before::of(&session);
        session.submit()?;
        self.publish(&session, before);
        session.report(&self.scoring)
    }

    /// Start over. Pending follow-ups and ticks of the previous run are discarded.
    pub async fn restart(&self) -> Uuid {
        let mut session = self.session.lock().await;
        let before = Before::of(&session);
        let id = session.restart();
        self.publish(&session, before);
        id
    }

    /// Stop the countdown.
    pub async fn cancel_timer(&self) -> bool {
        let mut session = self.session.lock().await;
        let cancelled = session.cancel_timer();
        self.notify_version(session.version());
        cancelled
    }

    /// Spend the 50:50 on a question.
    pub async fn fifty_fifty(&self, index: usize) -> Result<BTreeSet<usize>, OperationError> {
        let mut session = self.session.lock().await;
        let hidden = session.fifty_fifty(index)?;
        self.events.broadcast(SessionEvent::LifelineUsed {
            lifeline: Lifeline::FiftyFifty,
            question: index,
        });
        self.notify_version(session.version());
        Ok(hidden)
    }

    /// Hint for a question.
    pub async fn hint(&self, index: usize) -> Result<String, OperationError> {
        let mut session = self.session.lock().await;
        let version = session.version();
        let text = session.hint(index)?;
        if session.version() != version {
            self.events.broadcast(SessionEvent::LifelineUsed {
                lifeline: Lifeline::Hint,
                question: index,
            });
            self.notify_version(session.version());
        }
        Ok(text)
    }

    /// Score report of the submitted session.
    pub async fn report(&self) -> Result<ScoreReport, OperationError> {
        self.session.lock().await.report(&self.scoring)
    }

    /// Per-question review of the submitted session.
    pub async fn review(&self) -> Result<Vec<ReviewItem>, OperationError> {
        self.session.lock().await.review()
    }

    /// Results export of the submitted session.
    pub async fn results(&self) -> Result<SessionResults, OperationError> {
        self.session.lock().await.results(&self.scoring)
    }

    /// Drive the countdown once per second until the handle is dropped.
    pub fn spawn_clock(self: &Arc<Self>) -> JoinHandle<()> {
        let handle = Arc::downgrade(self);
        tokio::spawn(run_clock(handle))
    }

    fn schedule(self: &Arc<Self>, followup: Followup) {
        let handle = Arc::clone(self);
        tokio::spawn(async move {
            sleep(followup.delay).await;

            let mut session = handle.session.lock().await;
            let before = Before::of(&session);
            let outcome = session.resolve_followup(followup.ticket);
            match outcome {
                FollowupOutcome::Stale => {
                    debug!(ticket = ?followup.ticket, "follow-up no longer applies");
                }
                FollowupOutcome::Revealing(next) => {
                    handle.publish(&session, before);
                    drop(session);
                    handle.schedule(next);
                }
                FollowupOutcome::Moved(_) => handle.publish(&session, before),
            }
        });
    }

    fn on_tick(self: &Arc<Self>, session: &mut QuizSession, ticket: TimerTicket) {
        let before = Before::of(session);

        match session.on_tick(ticket) {
            TickOutcome::Stale | TickOutcome::Idle => {}
            TickOutcome::Ticked { remaining } => {
                let whole_session = !session.state().countdown().mode().is_per_question();
                self.events.broadcast(SessionEvent::TimerTick {
                    remaining,
                    low: whole_session && is_running_low(remaining),
                });
                self.notify_version(session.version());
            }
            TickOutcome::Expired {
                question, followup, ..
            } => {
                self.events.broadcast(SessionEvent::TimeExpired { question });
                self.publish(session, before);
                if let Some(followup) = followup {
                    self.schedule(followup);
                }
            }
        }
    }

    /// Publish `version` to watchers, unless they already hold it.
    fn notify_version(&self, version: u64) {
        self.version.send_if_modified(|current| {
            if *current == version {
                return false;
            }
            *current = version;
            true
        });
    }

    /// Broadcast phase changes and the terminal report, then the version.
    fn publish(&self, session: &QuizSession, before: Before) {
        let phase = session.phase();
        let question = session.state().current_index();
        let restarted = session.id() != before.session_id;

        if restarted || phase != before.phase || question != before.question {
            self.events.broadcast(SessionEvent::PhaseChanged {
                phase: (&phase).into(),
                question,
                version: session.version(),
            });
        }

        if phase.is_submitted() && !before.phase.is_submitted() {
            if let (Some(reason), Ok(report)) =
                (session.state().submit_reason(), session.report(&self.scoring))
            {
                self.events.broadcast(SessionEvent::Submitted { reason, report });
            }
        }

        self.notify_version(session.version());
    }
}

async fn run_clock(handle: Weak<SessionHandle>) {
    let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticket: Option<TimerTicket> = None;

    info!("session clock started");
    loop {
        ticker.tick().await;

        let Some(handle) = handle.upgrade() else {
            break;
        };
        let Ok(mut session) = handle.session.try_lock() else {
            debug!("session busy; dropping tick");
            continue;
        };

        // A countdown armed since the last tick gets its first second in full.
        let current = session.timer_ticket();
        match ticket {
            Some(held) if Some(held) == current => {
                handle.on_tick(&mut session, held);
                ticket = session.timer_ticket();
            }
            _ => ticket = current,
        }
    }
    info!("session clock stopped");
}
