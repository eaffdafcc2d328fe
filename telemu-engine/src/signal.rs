//! Bounded-rate random walk used to make instrument readings look noisy.
use rand::Rng;
use rand_distr::StandardNormal;
use std::fmt;
use std::path::{Path, PathBuf};

/// Source of externally forced shift values for a signal.
///
/// Implementations must be cheap and best-effort: anything unreadable is
/// reported as `None` so that a tick never stalls on it.
pub trait OverrideSource: Send {
    fn poll(&mut self) -> Option<f64>;
}

/// Reads an integer shift from a small text file on every poll.
#[derive(Debug, Clone)]
pub struct FileOverride {
    path: PathBuf,
}

impl FileOverride {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Override file for the instrument `name` inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path, name: &str) -> Self {
        Self::new(dir.join(name))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OverrideSource for FileOverride {
    fn poll(&mut self) -> Option<f64> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match raw.trim().parse::<i64>() {
            Ok(value) => Some(value as f64),
            Err(_) => {
                log::warn!("ignoring malformed override in {}", self.path.display());
                None
            }
        }
    }
}

/// Jittered value around a base quantity.
pub struct SmoothedSignal {
    min_shift: f64,
    max_shift: f64,
    speed: f64,
    gauss_factor: f64,
    shift: f64,
    desired_shift: f64,
    source: Option<Box<dyn OverrideSource>>,
    last_override: Option<f64>,
}

impl fmt::Debug for SmoothedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmoothedSignal")
            .field("min_shift", &self.min_shift)
            .field("max_shift", &self.max_shift)
            .field("speed", &self.speed)
            .field("shift", &self.shift)
            .field("desired_shift", &self.desired_shift)
            .field("has_override", &self.source.is_some())
            .finish()
    }
}

impl SmoothedSignal {
    /// Signal drifting within `[min_shift, max_shift]`, moving at most 1% of
    /// the half range per read.
    pub fn new<R: Rng + ?Sized>(min_shift: f64, max_shift: f64, rng: &mut R) -> Self {
        let half_range = (max_shift - min_shift) / 2.0;
        Self::with_speed(min_shift, max_shift, half_range * 0.01, rng)
    }

    /// Signal with an explicit per-read rate limit.
    pub fn with_speed<R: Rng + ?Sized>(
        min_shift: f64,
        max_shift: f64,
        speed: f64,
        rng: &mut R,
    ) -> Self {
        let half_range = (max_shift - min_shift) / 2.0;
        let mut signal = Self {
            min_shift,
            max_shift,
            speed: speed.abs(),
            // half range covers three standard deviations
            gauss_factor: half_range / 3.0,
            shift: 0.0,
            desired_shift: 0.0,
            source: None,
            last_override: None,
        };
        signal.resample(rng);
        signal
    }

    /// Attach an override source polled on every read.
    #[must_use]
    pub fn with_override(mut self, source: Box<dyn OverrideSource>) -> Self {
        self.set_override(source);
        self
    }

    /// Replace the override source; the last seen override is forgotten.
    pub fn set_override(&mut self, source: Box<dyn OverrideSource>) {
        self.source = Some(source);
        self.last_override = None;
    }

    #[must_use]
    pub const fn shift(&self) -> f64 {
        self.shift
    }

    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    #[must_use]
    pub const fn range(&self) -> (f64, f64) {
        (self.min_shift, self.max_shift)
    }

    /// Advance the walk one step and return `base` plus the current shift.
    pub fn read<R: Rng + ?Sized>(&mut self, base: f64, rng: &mut R) -> f64 {
        self.step(rng);
        if let Some(value) = self.poll_override() {
            self.shift = value;
        }
        base + self.shift
    }

    fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if is_close(self.shift, self.desired_shift) {
            self.resample(rng);
        }
        let gap = self.desired_shift - self.shift;
        self.shift += gap.signum() * gap.abs().min(self.speed);
    }

    fn resample<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let unit: f64 = rng.sample(StandardNormal);
        self.desired_shift = unit * self.gauss_factor;
    }

    fn poll_override(&mut self) -> Option<f64> {
        let value = self.source.as_mut()?.poll()?;
        if self.last_override == Some(value) {
            return None;
        }
        self.last_override = Some(value);
        Some(value)
    }
}

fn is_close(a: f64, b: f64) -> bool {
    const REL_TOLERANCE: f64 = 1e-9;
    a == b || (a - b).abs() <= REL_TOLERANCE * a.abs().max(b.abs())
}
