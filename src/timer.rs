//! Sleep timer.
//!
//! After N minutes, fade out and stop playback exactly once. The timer owns
//! two deadlines: the completion and the next display refresh. Both live in
//! one `Schedule`, so replacing or cancelling it always drops them together
//! and a stale completion can never fire. Time is passed in by the caller
//! (the event loop polls `tick` every iteration), which keeps this module
//! free of threads and easy to drive from tests.

use std::time::{Duration, Instant};

const MINUTE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct Schedule {
    minutes: u32,
    duration: Duration,
    started_at: Instant,
    completes_at: Instant,
    next_refresh: Instant,
}

/// What changed after `set_timer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerChange {
    Started { minutes: u32 },
    /// `minutes == 0`; `was_active` tells whether anything was running.
    Cancelled { was_active: bool },
}

/// Output of `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// The refresh cadence elapsed; redraw the countdown.
    Refresh { remaining: Duration },
    /// The countdown reached zero. Reported once per schedule.
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerStatus {
    pub is_active: bool,
    pub remaining: Duration,
    pub duration: Duration,
}

#[derive(Debug)]
pub struct SleepTimer {
    schedule: Option<Schedule>,
    refresh_interval: Duration,
}

impl SleepTimer {
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            schedule: None,
            refresh_interval: refresh_interval.max(Duration::from_millis(1)),
        }
    }

    /// Start a countdown of `minutes`, replacing any running one.
    /// `0` cancels.
    pub fn set_timer(&mut self, minutes: u32, now: Instant) -> TimerChange {
        let was_active = self.cancel();
        if minutes == 0 {
            return TimerChange::Cancelled { was_active };
        }

        let duration = MINUTE * minutes;
        self.schedule = Some(Schedule {
            minutes,
            duration,
            started_at: now,
            completes_at: now + duration,
            next_refresh: now + self.refresh_interval,
        });
        TimerChange::Started { minutes }
    }

    /// Drop both deadlines. Returns whether a countdown was running.
    pub fn cancel(&mut self) -> bool {
        self.schedule.take().is_some()
    }

    pub fn is_active(&self) -> bool {
        self.schedule.is_some()
    }

    /// Minutes of the running countdown.
    pub fn minutes(&self) -> Option<u32> {
        self.schedule.map(|s| s.minutes)
    }

    /// Number of pending deadlines (completion + refresh): 2 while active, 0 otherwise.
    pub fn pending_deadlines(&self) -> usize {
        if self.schedule.is_some() { 2 } else { 0 }
    }

    /// Advance the timer to `now`.
    ///
    /// Completion takes priority over a refresh due at the same instant and
    /// clears the schedule, so later ticks return `None`.
    pub fn tick(&mut self, now: Instant) -> Option<TimerTick> {
        let schedule = self.schedule.as_mut()?;

        if now >= schedule.completes_at {
            self.schedule = None;
            return Some(TimerTick::Completed);
        }

        if now >= schedule.next_refresh {
            while schedule.next_refresh <= now {
                schedule.next_refresh += self.refresh_interval;
            }
            return Some(TimerTick::Refresh {
                remaining: schedule.completes_at - now,
            });
        }

        None
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.schedule
            .map(|s| s.completes_at.saturating_duration_since(now))
    }

    pub fn status(&self, now: Instant) -> TimerStatus {
        match self.schedule {
            Some(s) => TimerStatus {
                is_active: true,
                remaining: s.completes_at.saturating_duration_since(now),
                duration: s.duration,
            },
            None => TimerStatus {
                is_active: false,
                remaining: Duration::ZERO,
                duration: Duration::ZERO,
            },
        }
    }

    /// Fraction of the countdown already elapsed, 0.0-1.0.
    pub fn progress(&self, now: Instant) -> Option<f64> {
        self.schedule.map(|s| {
            let elapsed = now.saturating_duration_since(s.started_at);
            (elapsed.as_secs_f64() / s.duration.as_secs_f64()).min(1.0)
        })
    }

    /// Countdown text (`m:ss`) while active.
    pub fn display(&self, now: Instant) -> Option<String> {
        self.remaining(now).map(format_remaining)
    }

    /// The preset after the running one (or after "off"), wrapping around.
    pub fn next_preset(&self, presets: &[u32]) -> u32 {
        if presets.is_empty() {
            return 0;
        }
        let current = self.minutes().unwrap_or(0);
        match presets.iter().position(|&p| p == current) {
            Some(pos) => presets[(pos + 1) % presets.len()],
            None => presets
                .iter()
                .copied()
                .find(|&p| p > current)
                .unwrap_or(presets[0]),
        }
    }
}

/// Format a remaining duration as `m:ss`, rounding down.
pub fn format_remaining(d: Duration) -> String {
    let ms = d.as_millis();
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    format!("{minutes}:{seconds:02}")
}
