//! Progress state with pluggable rate and ETA estimation.
//!
//! [`ProgressData`] stores a value within a `[min, max]` range together with
//! the derived percentage and the timestamps needed to estimate throughput.
//! Numeric state lives in atomics so render code can read it lock-free while a
//! producer thread calls [`ProgressData::update`].
//!
//! Rate and remaining-time estimation is delegated to a [`RateStrategy`] and
//! an [`EtaStrategy`]. The defaults are [`EwmaRate`] and [`SmoothedEta`].
//!
//! # Example
//!
//! ```
//! use termdash_core::progress::ProgressData;
//!
//! let progress = ProgressData::new();
//! progress.set_range(0.0, 200.0);
//! progress.update(50.0);
//! progress.update(300.0);
//! assert_eq!(progress.value(), 200.0);
//! assert_eq!(progress.percentage(), 100.0);
//! ```

mod ewma_rate;
mod smoothed_eta;

pub use ewma_rate::EwmaRate;
pub use smoothed_eta::SmoothedEta;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Everything a strategy needs to know about one progress update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    /// Lower bound of the range.
    pub min: f64,
    /// Upper bound of the range.
    pub max: f64,
    /// Value after this update.
    pub value: f64,
    /// Value before this update.
    pub previous_value: f64,
    /// When progress started.
    pub started: Instant,
    /// When this update happened.
    pub now: Instant,
    /// When the previous update happened.
    pub previous: Instant,
    /// Rate reported by the rate strategy after it processed this sample.
    /// Always `0.0` when the rate strategy sees the sample.
    pub rate: f64,
}

impl ProgressSample {
    /// Time since progress started.
    pub fn elapsed(&self) -> Duration {
        self.now.saturating_duration_since(self.started)
    }

    /// Time since the previous update.
    pub fn delta(&self) -> Duration {
        self.now.saturating_duration_since(self.previous)
    }

    /// Amount of work left.
    pub fn remaining(&self) -> f64 {
        (self.max - self.value).max(0.0)
    }
}

/// Estimates throughput from successive progress samples.
pub trait RateStrategy: Send {
    /// Fold a new sample into the estimate.
    fn update(&mut self, sample: &ProgressSample);

    /// Current rate in units per second.
    fn rate(&self) -> f64;
}

/// Estimates remaining time from successive progress samples.
pub trait EtaStrategy: Send {
    /// Fold a new sample into the estimate. `sample.rate` is already updated.
    fn update(&mut self, sample: &ProgressSample);

    /// Current estimate, or `None` while undetermined.
    fn eta(&self) -> Option<Duration>;
}

/// A consistent copy of a [`ProgressData`]'s observable state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// Lower bound of the range.
    pub min: f64,
    /// Upper bound of the range.
    pub max: f64,
    /// Current value.
    pub value: f64,
    /// Completion in percent, `0.0..=100.0`.
    pub percentage: f64,
    /// Units per second.
    pub rate: f64,
    /// Estimated time remaining.
    pub eta: Option<Duration>,
    /// Time since the first update, frozen once the maximum was reached.
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Returns `true` once the value reached the maximum.
    pub fn is_complete(&self) -> bool {
        self.value >= self.max
    }
}

struct Timing {
    started: Option<Instant>,
    current: Option<Instant>,
    stopped: Option<Instant>,
}

struct Strategies {
    rate: Option<Box<dyn RateStrategy>>,
    eta: Option<Box<dyn EtaStrategy>>,
}

#[derive(Debug)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Release);
    }
}

/// Numeric progress state shared between a producer and the renderer.
///
/// # Related
///
/// - [`RateStrategy`] / [`EtaStrategy`] - Pluggable estimators
/// - [`ProgressSnapshot`] - Copy of the state handed to observers
pub struct ProgressData {
    min: AtomicF64,
    max: AtomicF64,
    value: AtomicF64,
    percentage: AtomicF64,
    timing: Mutex<Timing>,
    strategies: Mutex<Strategies>,
}

impl Default for ProgressData {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressData {
    /// Create progress over `0..=100` with the default strategies.
    pub fn new() -> Self {
        Self {
            min: AtomicF64::new(0.0),
            max: AtomicF64::new(100.0),
            value: AtomicF64::new(0.0),
            percentage: AtomicF64::new(0.0),
            timing: Mutex::new(Timing {
                started: None,
                current: None,
                stopped: None,
            }),
            strategies: Mutex::new(Strategies {
                rate: Some(Box::new(EwmaRate::default())),
                eta: Some(Box::new(SmoothedEta::default())),
            }),
        }
    }

    /// Set the range. Bounds are swapped if given in reverse and the current
    /// value is clamped into the new range. A NaN bound leaves the range
    /// unchanged.
    pub fn set_range(&self, min: f64, max: f64) {
        if min.is_nan() || max.is_nan() {
            tracing::debug!(
                target: "termdash_core::progress",
                min,
                max,
                "NaN range bound ignored"
            );
            return;
        }
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        // Serialize against update() so the value and percentage stay coherent.
        let _timing = self.timing.lock();
        self.min.store(min);
        self.max.store(max);
        let value = self.value.load().clamp(min, max);
        self.value.store(value);
        self.percentage.store(percentage_of(min, max, value));
    }

    /// Replace the rate estimator. `None` disables rate estimation.
    pub fn set_rate_strategy(&self, strategy: Option<Box<dyn RateStrategy>>) {
        self.strategies.lock().rate = strategy;
    }

    /// Replace the ETA estimator. `None` disables ETA estimation.
    pub fn set_eta_strategy(&self, strategy: Option<Box<dyn EtaStrategy>>) {
        self.strategies.lock().eta = strategy;
    }

    /// Record a new value observed now.
    pub fn update(&self, value: f64) {
        self.update_at(value, Instant::now());
    }

    /// Record a new value observed at `now`.
    ///
    /// The first call only establishes the time baseline; strategies start
    /// receiving samples from the second call on. Values outside the range
    /// are clamped; NaN is ignored.
    pub fn update_at(&self, value: f64, now: Instant) {
        if value.is_nan() {
            tracing::debug!(target: "termdash_core::progress", "NaN progress value ignored");
            return;
        }
        let mut timing = self.timing.lock();
        let min = self.min.load();
        let max = self.max.load();

        if value > max {
            tracing::debug!(
                target: "termdash_core::progress",
                value,
                max,
                "progress value exceeds maximum, clamping"
            );
        }
        let clamped = value.clamp(min, max);
        let previous_value = self.value.load();
        self.value.store(clamped);
        self.percentage.store(percentage_of(min, max, clamped));

        let Some(started) = timing.started else {
            timing.started = Some(now);
            timing.current = Some(now);
            if clamped >= max {
                timing.stopped = Some(now);
            }
            return;
        };

        let previous = timing.current.unwrap_or(started);
        timing.current = Some(now);
        if clamped >= max {
            timing.stopped.get_or_insert(now);
        } else {
            timing.stopped = None;
        }
        drop(timing);

        let mut sample = ProgressSample {
            min,
            max,
            value: clamped,
            previous_value,
            started,
            now,
            previous,
            rate: 0.0,
        };

        let mut strategies = self.strategies.lock();
        if let Some(rate) = strategies.rate.as_mut() {
            rate.update(&sample);
            sample.rate = rate.rate();
        }
        if let Some(eta) = strategies.eta.as_mut() {
            eta.update(&sample);
        }
    }

    /// Current value.
    pub fn value(&self) -> f64 {
        self.value.load()
    }

    /// Lower bound of the range.
    pub fn min_value(&self) -> f64 {
        self.min.load()
    }

    /// Upper bound of the range.
    pub fn max_value(&self) -> f64 {
        self.max.load()
    }

    /// Completion in percent.
    pub fn percentage(&self) -> f64 {
        self.percentage.load()
    }

    /// When the first update happened.
    pub fn time_started(&self) -> Option<Instant> {
        self.timing.lock().started
    }

    /// When the latest update happened.
    pub fn time_current(&self) -> Option<Instant> {
        self.timing.lock().current
    }

    /// When the value reached the maximum, if it has.
    pub fn time_stopped(&self) -> Option<Instant> {
        self.timing.lock().stopped
    }

    /// Time from the first update until now, or until completion.
    pub fn time_elapsed(&self) -> Duration {
        let timing = self.timing.lock();
        match (timing.started, timing.stopped) {
            (Some(started), Some(stopped)) => stopped.saturating_duration_since(started),
            (Some(started), None) => started.elapsed(),
            _ => Duration::ZERO,
        }
    }

    /// Current rate from the rate strategy, `0.0` without one.
    pub fn rate(&self) -> f64 {
        self.strategies
            .lock()
            .rate
            .as_ref()
            .map_or(0.0, |rate| rate.rate())
    }

    /// Current ETA from the ETA strategy, `None` without one.
    pub fn eta(&self) -> Option<Duration> {
        self.strategies.lock().eta.as_ref().and_then(|eta| eta.eta())
    }

    /// Copy of the observable state.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let (rate, eta) = {
            let strategies = self.strategies.lock();
            (
                strategies.rate.as_ref().map_or(0.0, |rate| rate.rate()),
                strategies.eta.as_ref().and_then(|eta| eta.eta()),
            )
        };
        ProgressSnapshot {
            min: self.min_value(),
            max: self.max_value(),
            value: self.value(),
            percentage: self.percentage(),
            rate,
            eta,
            elapsed: self.time_elapsed(),
        }
    }
}

impl std::fmt::Debug for ProgressData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressData")
            .field("min", &self.min_value())
            .field("max", &self.max_value())
            .field("value", &self.value())
            .field("percentage", &self.percentage())
            .finish_non_exhaustive()
    }
}

fn percentage_of(min: f64, max: f64, value: f64) -> f64 {
    if max <= min {
        return 100.0;
    }
    ((value - min) / (max - min) * 100.0).clamp(0.0, 100.0)
}

static_assertions::assert_impl_all!(ProgressData: Send, Sync);
