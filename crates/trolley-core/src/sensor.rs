// ─────────────────────────────────────────────────────────────────────
// Smart Trolley — Weight Sampler
// ─────────────────────────────────────────────────────────────────────
//! Weight transport trait and the sampler built on top of it.
//!
//! The physical link (serial line to a microcontroller, HTTP polling of
//! a WiFi scale node) sits behind [`WeightSource`]. The sampler never
//! lets a transport failure escape: single samples degrade to `None`,
//! stabilisation degrades to the last known stable weight.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use trolley_types::{clamp_mass, Grams, SensorError, TrolleyConfig};

/// Trait for weight transports.
pub trait WeightSource: Send + Sync {
    /// One instantaneous reading in grams.
    fn read(&self) -> Result<Grams, SensorError>;

    /// Whether a transport is attached at all. When `false` the sampler
    /// skips sampling entirely and trusts the cart's own arithmetic.
    fn is_available(&self) -> bool {
        true
    }
}

/// Weight source that calls a function pointer.
///
/// Lets an embedding process (or a test) supply readings without
/// writing a transport type.
type ReadFn = Box<dyn Fn() -> Result<Grams, SensorError> + Send + Sync>;

pub struct ExternalSource {
    read_fn: ReadFn,
}

impl ExternalSource {
    pub fn new(read_fn: impl Fn() -> Result<Grams, SensorError> + Send + Sync + 'static) -> Self {
        Self {
            read_fn: Box::new(read_fn),
        }
    }
}

impl WeightSource for ExternalSource {
    fn read(&self) -> Result<Grams, SensorError> {
        (self.read_fn)()
    }
}

/// Replays a queue of readings, then keeps returning the last one.
///
/// Used for testing and for replaying captured scale traces.
pub struct ScriptedSource {
    queue: Mutex<VecDeque<Result<Grams, SensorError>>>,
    last: Mutex<Result<Grams, SensorError>>,
}

impl ScriptedSource {
    pub fn new(readings: impl IntoIterator<Item = Grams>) -> Self {
        Self::from_results(readings.into_iter().map(Ok))
    }

    pub fn from_results(readings: impl IntoIterator<Item = Result<Grams, SensorError>>) -> Self {
        Self {
            queue: Mutex::new(readings.into_iter().collect()),
            last: Mutex::new(Ok(0.0)),
        }
    }

    /// Append readings behind whatever is still queued.
    pub fn push(&self, readings: impl IntoIterator<Item = Grams>) {
        self.queue.lock().extend(readings.into_iter().map(Ok));
    }

    /// Drop anything queued and hold `weight` from now on.
    pub fn hold(&self, weight: Grams) {
        self.queue.lock().clear();
        *self.last.lock() = Ok(weight);
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().len()
    }
}

impl WeightSource for ScriptedSource {
    fn read(&self) -> Result<Grams, SensorError> {
        let next = self.queue.lock().pop_front();
        let mut last = self.last.lock();
        if let Some(reading) = next {
            *last = reading;
        }
        last.clone()
    }
}

/// No transport attached.
pub struct DetachedSource;

impl WeightSource for DetachedSource {
    fn read(&self) -> Result<Grams, SensorError> {
        Err(SensorError::Unavailable)
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Samples and stabilises readings from a [`WeightSource`].
///
/// Holds the process-wide fallback `last_stable` weight. It moves only
/// on successful stabilisation or on ledger commits.
pub struct WeightSampler {
    source: Arc<dyn WeightSource>,
    config: TrolleyConfig,
    last_stable: Mutex<Grams>,
}

impl WeightSampler {
    pub fn new(source: Arc<dyn WeightSource>, config: TrolleyConfig) -> Self {
        Self {
            source,
            config,
            last_stable: Mutex::new(0.0),
        }
    }

    /// One instantaneous reading. `None` on any transport failure.
    pub fn sample(&self) -> Option<Grams> {
        match self.source.read() {
            Ok(w) if w.is_finite() => Some(w),
            Ok(w) => {
                log::debug!("discarding non-finite sample {w}");
                None
            }
            Err(e) => {
                log::debug!("sample failed: {e}");
                None
            }
        }
    }

    /// Sample until the sliding window settles inside the jitter band.
    ///
    /// Returns the window average (snapped to 0 near zero) and records
    /// it as the new fallback. On timeout, or when no transport is
    /// attached, returns the current fallback unchanged.
    pub fn stabilize(&self) -> Grams {
        if !self.source.is_available() {
            let fallback = self.last_stable();
            log::warn!("weight sensor detached, using last stable {fallback:.2} g");
            return fallback;
        }

        let timeout = self.config.stabilize_timeout();
        let start = Instant::now();
        let mut window: VecDeque<Grams> = VecDeque::with_capacity(self.config.stable_window + 1);

        while start.elapsed() < timeout {
            if let Some(w) = self.sample() {
                window.push_back(w);
                if window.len() > self.config.stable_window {
                    window.pop_front();
                }
                if let Some(stable) = self.settled(&window) {
                    log::debug!("stable weight: {stable:.2} g");
                    *self.last_stable.lock() = stable;
                    return stable;
                }
            }
            pause(self.config.stabilize_interval());
        }

        let fallback = self.last_stable();
        log::warn!("no stable weight within {timeout:?}, using last stable {fallback:.2} g");
        fallback
    }

    fn settled(&self, window: &VecDeque<Grams>) -> Option<Grams> {
        if window.len() < self.config.stable_min_readings {
            return None;
        }
        let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = window.iter().copied().fold(f64::INFINITY, f64::min);
        if max - min > self.config.jitter_band_g {
            return None;
        }
        let avg = window.iter().sum::<Grams>() / window.len() as f64;
        if avg.abs() < self.config.zero_snap_g {
            Some(0.0)
        } else {
            Some(avg)
        }
    }

    /// Highest reading strictly above `threshold` seen during `window`.
    ///
    /// A placed item overshoots and then settles; the peak is the
    /// closest sample to the true added mass.
    pub fn peak_above(&self, threshold: Grams, window: Duration) -> Option<Grams> {
        self.extreme_within(window, |w| w > threshold, f64::max)
    }

    /// Lowest reading strictly below `threshold` seen during `window`.
    pub fn trough_below(&self, threshold: Grams, window: Duration) -> Option<Grams> {
        self.extreme_within(window, |w| w < threshold, f64::min)
    }

    fn extreme_within(
        &self,
        window: Duration,
        qualifies: impl Fn(Grams) -> bool,
        pick: impl Fn(Grams, Grams) -> Grams,
    ) -> Option<Grams> {
        let deadline = Instant::now() + window;
        let mut best: Option<Grams> = None;
        loop {
            if let Some(w) = self.sample().filter(|&w| qualifies(w)) {
                best = Some(best.map_or(w, |b| pick(b, w)));
            }
            if Instant::now() >= deadline {
                break;
            }
            pause(self.config.sample_interval());
        }
        best
    }

    pub fn last_stable(&self) -> Grams {
        *self.last_stable.lock()
    }

    /// Shift the fallback by a committed expected mass, floored at 0.
    pub fn adjust_last_stable(&self, delta: Grams) -> Grams {
        let mut last = self.last_stable.lock();
        *last = clamp_mass(*last + delta);
        *last
    }

    /// Forget the fallback (cart cleared).
    pub fn reset_fallback(&self) {
        *self.last_stable.lock() = 0.0;
    }

    pub fn config(&self) -> &TrolleyConfig {
        &self.config
    }
}

fn pause(interval: Duration) {
    if !interval.is_zero() {
        std::thread::sleep(interval);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Millisecond-scale timings so tests never wait on real windows.
    pub(crate) fn fast_config() -> TrolleyConfig {
        TrolleyConfig {
            stabilize_timeout_ms: 60,
            stabilize_interval_ms: 0,
            placement_window_ms: 30,
            removal_window_ms: 30,
            sample_interval_ms: 1,
            monitor_interval_ms: 5,
            ..Default::default()
        }
    }

    fn sampler(source: impl WeightSource + 'static) -> WeightSampler {
        WeightSampler::new(Arc::new(source), fast_config())
    }

    #[test]
    fn test_sample_maps_errors_to_none() {
        let s = sampler(ExternalSource::new(|| {
            Err(SensorError::Transport("timeout".into()))
        }));
        assert_eq!(s.sample(), None);
    }

    #[test]
    fn test_sample_rejects_nan() {
        let s = sampler(ExternalSource::new(|| Ok(f64::NAN)));
        assert_eq!(s.sample(), None);
    }

    #[test]
    fn test_stabilize_two_close_readings() {
        let s = sampler(ScriptedSource::new([100.0, 101.0]));
        let w = s.stabilize();
        assert!((w - 100.5).abs() < 1e-9);
        assert!((s.last_stable() - 100.5).abs() < 1e-9);
    }

    #[test]
    fn test_stabilize_waits_out_jitter() {
        // Spread stays too wide until 100 slides out: [140, 141, 141].
        let s = sampler(ScriptedSource::new([100.0, 140.0, 141.0]));
        let w = s.stabilize();
        assert!((w - 422.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_stabilize_snaps_near_zero() {
        let s = sampler(ScriptedSource::new([2.0, 2.5]));
        assert_eq!(s.stabilize(), 0.0);
    }

    #[test]
    fn test_stabilize_timeout_uses_fallback() {
        let flip = Mutex::new(false);
        let s = sampler(ExternalSource::new(move || {
            let mut f = flip.lock();
            *f = !*f;
            Ok(if *f { 0.0 } else { 50.0 })
        }));
        s.adjust_last_stable(42.0);
        assert_eq!(s.stabilize(), 42.0);
        assert_eq!(s.last_stable(), 42.0);
    }

    #[test]
    fn test_stabilize_detached_returns_fallback() {
        let s = sampler(DetachedSource);
        s.adjust_last_stable(60.0);
        assert_eq!(s.stabilize(), 60.0);
    }

    #[test]
    fn test_stabilize_skips_transport_errors() {
        let s = sampler(ScriptedSource::from_results([
            Ok(80.0),
            Err(SensorError::Transport("reset".into())),
            Ok(80.5),
        ]));
        assert!((s.stabilize() - 80.25).abs() < 1e-9);
    }

    #[test]
    fn test_peak_above_takes_maximum() {
        let s = sampler(ScriptedSource::new([3.0, 70.0, 64.0, 61.0]));
        assert_eq!(s.peak_above(5.0, Duration::from_millis(10)), Some(70.0));
    }

    #[test]
    fn test_peak_above_none_when_flat() {
        let s = sampler(ScriptedSource::new([1.0, 2.0, 4.0]));
        assert_eq!(s.peak_above(5.0, Duration::from_millis(5)), None);
    }

    #[test]
    fn test_trough_below_takes_minimum() {
        let s = sampler(ScriptedSource::new([120.0, 70.0, 55.0, 60.0]));
        assert_eq!(s.trough_below(115.0, Duration::from_millis(10)), Some(55.0));
    }

    #[test]
    fn test_adjust_last_stable_floors_at_zero() {
        let s = sampler(DetachedSource);
        s.adjust_last_stable(10.0);
        assert_eq!(s.adjust_last_stable(-25.0), 0.0);
    }

    #[test]
    fn test_scripted_hold_overrides_queue() {
        let src = ScriptedSource::new([1.0, 2.0]);
        src.hold(9.0);
        assert_eq!(src.remaining(), 0);
        assert_eq!(src.read(), Ok(9.0));
    }
}
