//! Interval timers over a caller-supplied clock
//!
//! The session countdown and the balloon spawner are periodic drivers. Instead
//! of owning real timers they are registered here and polled from the frame
//! loop with the current timestamp, so tests can jump time forward.

/// The periodic drivers a session owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Decrements the remaining session time once per second
    Countdown,
    /// Attempts to spawn a balloon
    Spawner,
}

#[derive(Debug, Clone, Copy)]
struct Interval {
    kind: TimerKind,
    period_ms: f64,
    next_due: f64,
}

/// Registry of running intervals
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    intervals: Vec<Interval>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an interval. Any running interval of the same kind is cancelled
    /// first, so a kind never has two live timers.
    pub fn start(&mut self, kind: TimerKind, period_ms: f64, now: f64) {
        self.cancel(kind);
        // A zero period would fire forever within a single poll
        let period_ms = period_ms.max(1.0);
        self.intervals.push(Interval {
            kind,
            period_ms,
            next_due: now + period_ms,
        });
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.intervals.retain(|i| i.kind != kind);
    }

    pub fn cancel_all(&mut self) {
        self.intervals.clear();
    }

    pub fn is_idle(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Pop the earliest fire due at or before `now`, rescheduling its interval.
    ///
    /// Call in a loop: handlers may cancel timers between fires, and those
    /// cancellations take effect for the remaining backlog.
    pub fn pop_due(&mut self, now: f64) -> Option<(TimerKind, f64)> {
        let interval = self
            .intervals
            .iter_mut()
            .filter(|i| i.next_due <= now)
            .min_by(|a, b| a.next_due.total_cmp(&b.next_due))?;

        let fired_at = interval.next_due;
        interval.next_due += interval.period_ms;
        Some((interval.kind, fired_at))
    }
}

/// Whether enough time has passed since the last motion sample
///
/// The first sample is always allowed; afterwards strictly more than
/// `interval_ms` must have elapsed.
pub fn should_sample_now(last_sample: Option<f64>, now: f64, interval_ms: f64) -> bool {
    match last_sample {
        None => true,
        Some(last) => now - last > interval_ms,
    }
}
