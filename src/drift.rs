use core::f64::consts::PI;
use rand::Rng;

/// Control rate of the output track in Hz, one sample per time quantum.
pub const CONTROL_RATE: f64 = 1000.0 / crate::event::TIME_QUANTUM as f64;

/// First order low-pass filter.
///
/// ```text
///    y[n] = a0 * x[n] + b1 * y[n-1]
///    a0 = 2 * PI * cutoff / sample_rate
///    b1 = 1 - a0
/// ```
#[derive(Debug, Clone)]
struct LpFilter1 {
    a0: f64,
    b1: f64,
    /// y[n-1], last output value
    y1: f64,
}
impl LpFilter1 {
    fn new(cutoff: f64, sample_rate: f64) -> Self {
        let nyquist = sample_rate / 2.0;
        let cutoff = if cutoff < 0.0 {
            0.0
        } else if cutoff > nyquist {
            nyquist
        } else {
            cutoff
        };
        let a0 = (2.0 * PI * cutoff) / sample_rate;
        LpFilter1 {
            a0,
            b1: 1.0 - a0,
            y1: 0.0,
        }
    }

    fn step(&mut self, x: f64) -> f64 {
        let y = self.a0 * x + self.b1 * self.y1;
        self.y1 = y;
        y
    }
}

/// Slow random wander added to the pitch channel: low-pass filtered uniform noise.
#[derive(Debug, Clone)]
pub struct DriftGenerator<R> {
    /// full width of the noise, twice the deviation
    width: f64,
    offset: f64,
    lp_filter: LpFilter1,
    rng: R,
}
impl<R: Rng> DriftGenerator<R> {
    /// `deviation` is the noise peak in semitones, `cutoff` the filter corner in Hz. The cutoff is
    /// clamped to `[0, sample_rate / 2]`.
    pub fn new(deviation: f64, sample_rate: f64, cutoff: f64, rng: R) -> Self {
        DriftGenerator {
            width: deviation * 2.0,
            offset: deviation,
            lp_filter: LpFilter1::new(cutoff, sample_rate),
            rng,
        }
    }

    /// Returns the next drift sample.
    pub fn next_sample(&mut self) -> f64 {
        let x = self.rng.random::<f64>() * self.width - self.offset;
        self.lp_filter.step(x)
    }
}
