//! Exponentially weighted moving average rate estimation.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::{ProgressSample, RateStrategy};

/// Samples closer together than this are folded into the next one.
const MIN_SAMPLE_SPACING: f64 = 0.005;

/// Rate estimator blending the instantaneous rate with a short history.
///
/// Each accepted sample computes `alpha * instant + (1 - alpha) * mean(history)`,
/// where `history` holds the last `n` blended rates. The result is clamped at
/// zero, so a value moving backwards never yields a negative rate. The rate
/// reads as `0.0` until the burn-in period has passed.
#[derive(Debug, Clone)]
pub struct EwmaRate {
    alpha: f64,
    window: usize,
    burn_in: Duration,
    history: VecDeque<f64>,
    rate: f64,
    previous: Option<(Instant, f64)>,
    burned_in: bool,
}

impl Default for EwmaRate {
    fn default() -> Self {
        Self::new(0.70, 10, Duration::from_millis(100))
    }
}

impl EwmaRate {
    /// Create an estimator with smoothing factor `alpha`, a history of `n`
    /// rates, and the given burn-in period.
    ///
    /// `alpha` is clamped to `0.0..=1.0` and `n` is raised to at least one.
    pub fn new(alpha: f64, n: usize, burn_in: Duration) -> Self {
        let window = n.max(1);
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            window,
            burn_in,
            history: VecDeque::with_capacity(window),
            rate: 0.0,
            previous: None,
            burned_in: false,
        }
    }

    /// The smoothing factor.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Returns `true` once the burn-in period is over.
    pub fn is_burned_in(&self) -> bool {
        self.burned_in
    }
}

impl RateStrategy for EwmaRate {
    fn update(&mut self, sample: &ProgressSample) {
        let (previous_time, previous_value) = self
            .previous
            .unwrap_or((sample.previous, sample.previous_value));
        let dt = sample
            .now
            .saturating_duration_since(previous_time)
            .as_secs_f64();
        if dt < MIN_SAMPLE_SPACING {
            return;
        }

        let instant = (sample.value - previous_value) / dt;
        let history_average = if self.history.is_empty() {
            0.0
        } else {
            self.history.iter().sum::<f64>() / self.history.len() as f64
        };
        self.rate = (self.alpha * instant + (1.0 - self.alpha) * history_average).max(0.0);

        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(self.rate);
        self.previous = Some((sample.now, sample.value));

        if !self.burned_in && sample.elapsed() > self.burn_in {
            self.burned_in = true;
        }
    }

    fn rate(&self) -> f64 {
        if self.burned_in { self.rate } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(started: Instant, prev_ms: u64, now_ms: u64, prev: f64, value: f64) -> ProgressSample {
        ProgressSample {
            min: 0.0,
            max: 1000.0,
            value,
            previous_value: prev,
            started,
            now: started + Duration::from_millis(now_ms),
            previous: started + Duration::from_millis(prev_ms),
            rate: 0.0,
        }
    }

    #[test]
    fn test_zero_during_burn_in() {
        let t0 = Instant::now();
        let mut ewma = EwmaRate::default();
        let mut value = 0.0;
        for step in 1..=9 {
            let prev = value;
            value += 10.0;
            ewma.update(&sample(t0, (step - 1) * 10, step * 10, prev, value));
            assert_eq!(ewma.rate(), 0.0);
        }
        assert!(!ewma.is_burned_in());
    }

    #[test]
    fn test_non_negative_after_burn_in() {
        let t0 = Instant::now();
        let mut ewma = EwmaRate::default();
        ewma.update(&sample(t0, 0, 200, 0.0, 100.0));
        assert!(ewma.is_burned_in());
        assert!(ewma.rate() > 0.0);

        // Progress moving backwards never produces a negative rate.
        ewma.update(&sample(t0, 200, 400, 100.0, 0.0));
        assert!(ewma.rate() >= 0.0);
    }

    #[test]
    fn test_steady_rate_converges() {
        let t0 = Instant::now();
        let mut ewma = EwmaRate::default();
        let mut value = 0.0;
        for step in 1..=40u64 {
            let prev = value;
            value += 10.0;
            ewma.update(&sample(t0, (step - 1) * 100, step * 100, prev, value));
        }
        // 10 units every 100 ms.
        assert!((ewma.rate() - 100.0).abs() < 1.0, "rate = {}", ewma.rate());
    }

    #[test]
    fn test_close_samples_are_skipped() {
        let t0 = Instant::now();
        let mut ewma = EwmaRate::new(1.0, 4, Duration::ZERO);
        ewma.update(&sample(t0, 0, 100, 0.0, 10.0));
        assert!((ewma.rate() - 100.0).abs() < 1e-9);

        // 2 ms later: ignored, baseline stays at t = 100 ms.
        ewma.update(&sample(t0, 100, 102, 10.0, 20.0));
        assert!((ewma.rate() - 100.0).abs() < 1e-9);

        // Measured against the last accepted sample.
        ewma.update(&sample(t0, 102, 200, 20.0, 30.0));
        assert!((ewma.rate() - 200.0).abs() < 1e-9);
    }
}
