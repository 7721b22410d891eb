//! Cancellable one-second countdown used for per-question and whole-session timing.
//!
//! The countdown itself never schedules anything: a host (see
//! [`crate::services::clock`]) delivers ticks, each carrying the [`TimerTicket`] it
//! was scheduled against. Arming or cancelling bumps the countdown epoch, which turns
//! every outstanding ticket stale.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-question budget used when nothing else is configured.
pub const DEFAULT_QUESTION_SECONDS: u32 = 30;
/// Whole-session budget used when nothing else is configured.
pub const DEFAULT_SESSION_SECONDS: u32 = 600;
/// Below this many seconds the clock is flagged as running low.
pub const LOW_TIME_THRESHOLD_SECS: u32 = 60;

/// How a session is timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimingMode {
    /// Fresh budget on every question transition.
    PerQuestion {
        /// Seconds granted per question.
        seconds: u32,
    },
    /// One budget shared by the whole session.
    WholeSession {
        /// Seconds granted for the whole session.
        seconds: u32,
    },
    /// No countdown at all.
    Untimed,
}

impl TimingMode {
    /// Budget in seconds, or `None` when untimed.
    pub fn budget_secs(&self) -> Option<u32> {
        match self {
            TimingMode::PerQuestion { seconds } | TimingMode::WholeSession { seconds } => {
                Some(*seconds)
            }
            TimingMode::Untimed => None,
        }
    }

    /// Whether the countdown restarts on every question transition.
    pub fn is_per_question(&self) -> bool {
        matches!(self, TimingMode::PerQuestion { .. })
    }
}

/// Identifies the armed countdown a tick was scheduled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerTicket {
    /// Session the countdown belongs to.
    pub session_id: Uuid,
    /// Countdown epoch at scheduling time.
    pub epoch: u64,
}

/// Result of feeding one tick into a [`Countdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still counting; carries the seconds left.
    Running(u32),
    /// Reached zero on this tick. Reported once per arming.
    Expired,
    /// The countdown is not running; the tick had no effect.
    Idle,
}

/// Countdown state owned by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    mode: TimingMode,
    remaining: u32,
    running: bool,
    epoch: u64,
}

impl Countdown {
    /// Create a stopped countdown holding the full budget of `mode`.
    pub fn new(mode: TimingMode) -> Self {
        Self {
            mode,
            remaining: mode.budget_secs().unwrap_or(0),
            running: false,
            epoch: 0,
        }
    }

    /// Reset to the full budget and start counting. Untimed countdowns stay stopped.
    pub fn arm(&mut self) {
        let Some(budget) = self.mode.budget_secs() else {
            return;
        };
        self.remaining = budget;
        self.running = true;
        self.epoch += 1;
    }

    /// Stop counting and invalidate outstanding tickets. Returns whether it was running.
    pub fn cancel(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.epoch += 1;
        true
    }

    /// Consume one second.
    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            Tick::Expired
        } else {
            Tick::Running(self.remaining)
        }
    }

    /// Ticket for the current arming, if the countdown is running.
    pub fn ticket(&self, session_id: Uuid) -> Option<TimerTicket> {
        self.is_running().then_some(TimerTicket {
            session_id,
            epoch: self.epoch,
        })
    }

    /// Whether `ticket` was issued for the current arming.
    pub fn accepts(&self, ticket: &TimerTicket) -> bool {
        self.running && ticket.epoch == self.epoch
    }

    /// Configured timing mode.
    pub fn mode(&self) -> TimingMode {
        self.mode
    }

    /// Seconds left on the clock.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Whether ticks currently have an effect.
    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Render seconds as `m:ss`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Whether the clock should be shown as running low.
pub fn is_running_low(remaining: u32) -> bool {
    remaining < LOW_TIME_THRESHOLD_SECS
}
