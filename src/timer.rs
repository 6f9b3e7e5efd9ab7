use std::time::Duration;

pub const DEFAULT_SECONDS_PER_QUESTION: u64 = 60;

/// Remaining time at or below which the clock is shown as a warning
pub const LOW_TIME_THRESHOLD_SECS: u64 = 300;

pub const TIME_EXPIRED: &str = "time expired";

/// Whole-second exam countdown.
///
/// The event loop ticks faster than once per second, so elapsed time is
/// accumulated in `carry` and only whole seconds are taken off the clock.
#[derive(Debug, Clone, PartialEq)]
pub struct Countdown {
    total_secs: u64,
    remaining_secs: u64,
    carry: Duration,
    running: bool,
}

impl Countdown {
    pub fn new(total_secs: u64) -> Self {
        Self {
            total_secs,
            remaining_secs: total_secs,
            carry: Duration::ZERO,
            running: false,
        }
    }

    pub fn for_questions(question_count: usize, seconds_per_question: u64) -> Self {
        Self::new((question_count as u64).saturating_mul(seconds_per_question))
    }

    pub fn start(&mut self) {
        self.carry = Duration::ZERO;
        self.running = true;
    }

    /// Stops the clock. Returns false if it was not running.
    pub fn stop(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.total_secs - self.remaining_secs
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_secs == 0
    }

    pub fn is_running_low(&self) -> bool {
        self.remaining_secs <= LOW_TIME_THRESHOLD_SECS
    }

    /// Takes one second off the clock. Returns true when this tick hit zero.
    pub fn tick_second(&mut self) -> bool {
        if !self.running || self.remaining_secs == 0 {
            return false;
        }
        self.remaining_secs -= 1;
        self.remaining_secs == 0
    }

    /// Adds wall-clock time and returns how many whole seconds are now due.
    pub fn accumulate(&mut self, elapsed: Duration) -> u64 {
        if !self.running {
            return 0;
        }
        self.carry += elapsed;
        let due = self.carry.as_secs();
        self.carry -= Duration::from_secs(due);
        due
    }
}

/// Formats seconds as `m:ss`
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
