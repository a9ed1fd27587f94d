//! Remaining-time estimation with asymmetric hysteresis.

use std::time::Duration;

use super::{EtaStrategy, ProgressSample};

/// Share of a downward revision adopted per update.
const DOWNWARD_GAIN: f64 = 0.3;
/// Share of an upward revision adopted per update.
const UPWARD_GAIN: f64 = 0.1;

/// ETA estimator projecting the remaining work over the current rate.
///
/// Once an estimate exists, a new projection is only partially adopted: 30% of
/// a downward revision and 10% of an upward one. A projection below a third of
/// the previous estimate is adopted outright so slow starts recover quickly.
/// The estimate reads as `None` until the burn-in period has passed.
#[derive(Debug, Clone)]
pub struct SmoothedEta {
    burn_in: Duration,
    eta: Option<f64>,
    burned_in: bool,
}

impl Default for SmoothedEta {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl SmoothedEta {
    /// Create an estimator with the given burn-in period.
    pub fn new(burn_in: Duration) -> Self {
        Self {
            burn_in,
            eta: None,
            burned_in: false,
        }
    }

    /// Returns `true` once the burn-in period is over.
    pub fn is_burned_in(&self) -> bool {
        self.burned_in
    }
}

impl EtaStrategy for SmoothedEta {
    fn update(&mut self, sample: &ProgressSample) {
        if !sample.rate.is_finite() {
            return;
        }
        if !self.burned_in && sample.elapsed() > self.burn_in {
            self.burned_in = true;
        }
        if sample.rate <= 0.0 {
            self.eta = None;
            return;
        }

        let mut guess = sample.remaining() / sample.rate;
        if let Some(previous) = self.eta.filter(|previous| *previous > 0.0) {
            if guess > previous / 3.0 {
                let diff = guess - previous;
                let gain = if diff < 0.0 { DOWNWARD_GAIN } else { UPWARD_GAIN };
                guess = previous + gain * diff;
            }
        }
        self.eta = Some(guess.max(0.0));
    }

    fn eta(&self) -> Option<Duration> {
        if !self.burned_in {
            return None;
        }
        self.eta.and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}
