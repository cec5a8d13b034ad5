use std::time::Duration;

/// Shortest step-play interval.
pub const MIN_STEP_INTERVAL: Duration = Duration::from_millis(10);
/// Rates below this are treated as this when deriving the interval.
pub const MIN_STEP_RATE: f64 = 0.05;

/// Step-play tick interval for a given video step and playback rate.
///
/// `max(10ms, round(step_seconds * 1000 / max(0.05, rate)) ms)`.
pub fn interval_for(step_seconds: f64, rate: f64) -> Duration {
    let rate = if rate.is_nan() {
        1.0
    } else {
        rate.max(MIN_STEP_RATE)
    };
    let ms = (step_seconds.max(0.0) * 1000.0 / rate).round();
    if !ms.is_finite() {
        return MIN_STEP_INTERVAL;
    }
    Duration::from_millis(ms as u64).max(MIN_STEP_INTERVAL)
}

/// Handle identifying one scheduler run. Stale after `stop` or `restart`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepTicket(u64);

#[derive(Clone, Copy, Debug)]
struct Run {
    interval: Duration,
    next_due: Duration,
}

/// Cooperative fixed-interval timer driving step playback.
///
/// The host supplies monotonic timestamps through [`StepScheduler::poll`]; nothing runs in the
/// background. Every `start` bumps a generation counter, so tickets from earlier runs never match
/// again.
#[derive(Debug, Default)]
pub struct StepScheduler {
    generation: u64,
    run: Option<Run>,
}

impl StepScheduler {
    /// Idle scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a run; the first tick is due one interval after `now`.
    pub fn start(&mut self, now: Duration, interval: Duration) -> StepTicket {
        self.generation = self.generation.wrapping_add(1);
        let interval = interval.max(MIN_STEP_INTERVAL);
        self.run = Some(Run {
            interval,
            next_due: now + interval,
        });
        StepTicket(self.generation)
    }

    /// Cancel the current run. Pending ticks are dropped and outstanding tickets go stale.
    pub fn stop(&mut self) {
        if self.run.take().is_some() {
            self.generation = self.generation.wrapping_add(1);
        }
    }

    /// Stop and start again with a new interval.
    pub fn restart(&mut self, now: Duration, interval: Duration) -> StepTicket {
        self.stop();
        self.start(now, interval)
    }

    /// `true` while a run is active.
    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// `true` when `ticket` belongs to the active run.
    pub fn is_current(&self, ticket: StepTicket) -> bool {
        self.run.is_some() && ticket.0 == self.generation
    }

    /// Interval of the active run.
    pub fn interval(&self) -> Option<Duration> {
        self.run.map(|r| r.interval)
    }

    /// Report whether a tick is due at `now`. At most one tick is reported per call.
    ///
    /// A host that fell behind by more than one interval does not get a burst of catch-up ticks;
    /// the schedule restarts from `now` instead.
    pub fn poll(&mut self, now: Duration) -> bool {
        let Some(run) = self.run.as_mut() else {
            return false;
        };
        if now < run.next_due {
            return false;
        }
        let next = run.next_due + run.interval;
        run.next_due = if now >= next { now + run.interval } else { next };
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/step.rs"]
mod tests;
