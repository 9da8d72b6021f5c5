//! Simulation progress timer
//!
//! Progress is recomputed from a captured start instant plus time banked by
//! earlier runs, never accumulated tick by tick, so pause/resume cannot drift.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Monotonic time source
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.lock().map(|n| *n).unwrap_or_else(|_| Instant::now())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    Idle,
    Running,
    Paused,
    Complete,
}

pub struct SimulationProgress<C: Clock = SystemClock> {
    clock: C,
    duration: Duration,
    /// Set while running
    started_at: Option<Instant>,
    /// Elapsed time from runs before the current one
    banked: Duration,
}

impl SimulationProgress<SystemClock> {
    pub fn new(duration: Duration) -> Self {
        Self::with_clock(duration, SystemClock)
    }
}

impl<C: Clock> SimulationProgress<C> {
    pub fn with_clock(duration: Duration, clock: C) -> Self {
        Self {
            clock,
            duration: duration.max(Duration::from_millis(1)),
            started_at: None,
            banked: Duration::ZERO,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn elapsed(&self) -> Duration {
        let running = self
            .started_at
            .map(|start| self.clock.now().saturating_duration_since(start))
            .unwrap_or(Duration::ZERO);
        (self.banked + running).min(self.duration)
    }

    /// 0.0 - 100.0
    pub fn percent(&self) -> f64 {
        self.elapsed().as_secs_f64() / self.duration.as_secs_f64() * 100.0
    }

    pub fn state(&self) -> ProgressState {
        if self.elapsed() >= self.duration {
            ProgressState::Complete
        } else if self.started_at.is_some() {
            ProgressState::Running
        } else if self.banked > Duration::ZERO {
            ProgressState::Paused
        } else {
            ProgressState::Idle
        }
    }

    /// Start or resume; no-op while running or complete
    pub fn start(&mut self) {
        if self.started_at.is_none() && self.state() != ProgressState::Complete {
            self.started_at = Some(self.clock.now());
        }
    }

    pub fn pause(&mut self) {
        if let Some(start) = self.started_at.take() {
            self.banked += self.clock.now().saturating_duration_since(start);
            self.banked = self.banked.min(self.duration);
        }
    }

    pub fn reset(&mut self) {
        self.started_at = None;
        self.banked = Duration::ZERO;
    }

    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed())
    }
}
