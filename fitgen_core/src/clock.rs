//! Countdown clock for a single exercise or rest phase.
//!
//! The clock is a pure state machine: callers feed it wall-clock instants
//! and one `tick` per elapsed second, so it never touches a timer itself.
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |-> Completed (tick reaches zero)
//! any -> Finished (finish) | Skipped (skip);  reset: any -> Idle
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`SessionClock`]
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    Idle,
    Running,
    Paused,
    Completed,
    Finished,
    Skipped,
}

impl ClockState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ClockState::Completed | ClockState::Finished | ClockState::Skipped
        )
    }
}

/// Notification produced by a clock operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockEvent {
    /// One second counted down
    Tick { remaining_seconds: u32 },
    /// Countdown reached zero
    Completed { elapsed_seconds: u32 },
    /// User finished early (or late)
    Finished { elapsed_seconds: u32 },
    /// User moved on without reporting time
    Skipped,
}

impl ClockEvent {
    /// Whether this event means the phase is over
    pub fn is_done(&self) -> bool {
        !matches!(self, ClockEvent::Tick { .. })
    }

    /// Elapsed seconds to attribute, if the event reports any
    pub fn elapsed_seconds(&self) -> Option<u32> {
        match self {
            ClockEvent::Completed { elapsed_seconds } | ClockEvent::Finished { elapsed_seconds } => {
                Some(*elapsed_seconds)
            }
            _ => None,
        }
    }
}

/// Resettable countdown over a fixed duration with elapsed-time accounting
#[derive(Clone, Debug)]
pub struct SessionClock {
    duration_seconds: u32,
    remaining_seconds: u32,
    /// Seconds from closed running segments
    accumulated_seconds: u32,
    segment_started_at: Option<DateTime<Utc>>,
    state: ClockState,
}

impl SessionClock {
    pub fn new(duration_seconds: u32) -> Self {
        Self {
            duration_seconds,
            remaining_seconds: duration_seconds,
            accumulated_seconds: 0,
            segment_started_at: None,
            state: ClockState::Idle,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_done(&self) -> bool {
        self.state.is_terminal()
    }

    /// Elapsed seconds so far, including the in-flight running segment
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u32 {
        self.accumulated_seconds
            .saturating_add(self.segment_started_at.map_or(0, |s| whole_seconds(s, now)))
    }

    /// Remaining time as `MM:SS`
    pub fn display(&self) -> String {
        format_clock(self.remaining_seconds)
    }

    /// Idle -> Running. Returns false if the clock was not idle.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != ClockState::Idle {
            tracing::debug!("Ignoring start in state {:?}", self.state);
            return false;
        }
        self.state = ClockState::Running;
        self.segment_started_at = Some(now);
        true
    }

    /// Running -> Paused, banking the running segment
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != ClockState::Running {
            tracing::debug!("Ignoring pause in state {:?}", self.state);
            return false;
        }
        self.close_segment(now);
        self.state = ClockState::Paused;
        true
    }

    /// Paused -> Running, opening a new segment at `now`
    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != ClockState::Paused {
            tracing::debug!("Ignoring resume in state {:?}", self.state);
            return false;
        }
        self.segment_started_at = Some(now);
        self.state = ClockState::Running;
        true
    }

    /// Back to Idle with the full duration and no elapsed time
    pub fn reset(&mut self) {
        self.remaining_seconds = self.duration_seconds;
        self.accumulated_seconds = 0;
        self.segment_started_at = None;
        self.state = ClockState::Idle;
    }

    /// One second has passed. Only counts while running.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<ClockEvent> {
        if self.state != ClockState::Running {
            return None;
        }

        if self.remaining_seconds <= 1 {
            self.remaining_seconds = 0;
            self.close_segment(now);
            self.state = ClockState::Completed;
            return Some(ClockEvent::Completed {
                elapsed_seconds: self.accumulated_seconds,
            });
        }

        self.remaining_seconds -= 1;
        Some(ClockEvent::Tick {
            remaining_seconds: self.remaining_seconds,
        })
    }

    /// Finalize and report elapsed time regardless of remaining time
    ///
    /// Returns None once the clock has already completed, finished or been
    /// skipped, so a phase is never reported twice.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Option<ClockEvent> {
        if self.state.is_terminal() {
            tracing::debug!("Ignoring finish in state {:?}", self.state);
            return None;
        }
        self.close_segment(now);
        self.state = ClockState::Finished;
        Some(ClockEvent::Finished {
            elapsed_seconds: self.accumulated_seconds,
        })
    }

    /// Move on without reporting time. Valid even if never started.
    pub fn skip(&mut self) -> Option<ClockEvent> {
        if self.state.is_terminal() {
            tracing::debug!("Ignoring skip in state {:?}", self.state);
            return None;
        }
        self.segment_started_at = None;
        self.state = ClockState::Skipped;
        Some(ClockEvent::Skipped)
    }

    fn close_segment(&mut self, now: DateTime<Utc>) {
        if let Some(started) = self.segment_started_at.take() {
            self.accumulated_seconds = self
                .accumulated_seconds
                .saturating_add(whole_seconds(started, now));
        }
    }
}

/// Floor of the millisecond delta in seconds, never negative
fn whole_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> u32 {
    let millis = (to - from).num_milliseconds().max(0);
    u32::try_from(millis / 1000).unwrap_or(u32::MAX)
}

/// Format seconds as zero-padded `MM:SS`
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
