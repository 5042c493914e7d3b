use num_complex::Complex64;

/// Trapezoidal gradient: linear ramp up, flat top, linear ramp down.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trapezoid {
    /// Flat top amplitude. Unit: `Hz / m`
    pub amplitude: f64,
    /// Unit: `s`
    pub rise: f64,
    /// Unit: `s`
    pub flat: f64,
    /// Unit: `s`
    pub fall: f64,
    /// Start of the ramp up, relative to the block start. Unit: `s`
    pub delay: f64,
}

impl Trapezoid {
    pub fn new(amplitude: f64, rise: f64, flat: f64, fall: f64) -> Self {
        Self {
            amplitude,
            rise,
            flat,
            fall,
            delay: 0.0,
        }
    }

    pub fn with_delay(self, delay: f64) -> Self {
        Self { delay, ..self }
    }

    /// Time from block start until the end of the ramp down.
    pub fn duration(&self) -> f64 {
        self.delay + self.rise + self.flat + self.fall
    }

    /// Analytic gradient area, `½·(flat + rise + flat + fall)·amplitude`.
    /// Unit: `Hz s / m`
    pub fn area(&self) -> f64 {
        0.5 * (self.flat + (self.rise + self.flat + self.fall)) * self.amplitude
    }

    /// The four vertices of the trapezoid as (time, amplitude) pairs.
    pub fn vertices(&self) -> ([f64; 4], [f64; 4]) {
        let t0 = self.delay;
        let t1 = t0 + self.rise;
        let t2 = t1 + self.flat;
        let t3 = t2 + self.fall;
        (
            [t0, t1, t2, t3],
            [0.0, self.amplitude, self.amplitude, 0.0],
        )
    }
}

/// Gradient given by explicit samples. Between samples the waveform is linearly
/// interpolated. The first and last sample are held until the edges of the
/// raster steps the gradient occupies, outside of those it is zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Arbitrary {
    /// Sample times relative to `delay`, must be non-decreasing. Unit: `s`
    pub times: Vec<f64>,
    /// Unit: `Hz / m`
    pub amplitudes: Vec<f64>,
    /// Unit: `s`
    pub delay: f64,
}

impl Arbitrary {
    pub fn new(times: Vec<f64>, amplitudes: Vec<f64>) -> Self {
        Self {
            times,
            amplitudes,
            delay: 0.0,
        }
    }

    /// Samples placed on the centers of the gradient raster, like pulseq does
    /// for free gradient shapes.
    pub fn on_raster(amplitudes: Vec<f64>, raster: f64) -> Self {
        let times = (0..amplitudes.len())
            .map(|i| (i as f64 + 0.5) * raster)
            .collect();
        Self::new(times, amplitudes)
    }

    pub fn with_delay(self, delay: f64) -> Self {
        Self { delay, ..self }
    }

    /// Each sample occupies one raster step.
    pub fn duration(&self, grad_raster: f64) -> f64 {
        self.delay + self.amplitudes.len() as f64 * grad_raster
    }

    /// Trapezoidal-rule integral over the samples. Unit: `Hz s / m`
    pub fn area(&self) -> f64 {
        self.times
            .windows(2)
            .zip(self.amplitudes.windows(2))
            .map(|(t, a)| 0.5 * (a[0] + a[1]) * (t[1] - t[0]))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gradient {
    Trapezoid(Trapezoid),
    Arbitrary(Arbitrary),
}

impl Gradient {
    pub fn duration(&self, grad_raster: f64) -> f64 {
        match self {
            Gradient::Trapezoid(trap) => trap.duration(),
            Gradient::Arbitrary(arb) => arb.duration(grad_raster),
        }
    }

    /// Unit: `Hz s / m`
    pub fn area(&self) -> f64 {
        match self {
            Gradient::Trapezoid(trap) => trap.area(),
            Gradient::Arbitrary(arb) => arb.area(),
        }
    }
}

impl From<Trapezoid> for Gradient {
    fn from(value: Trapezoid) -> Self {
        Gradient::Trapezoid(value)
    }
}

impl From<Arbitrary> for Gradient {
    fn from(value: Arbitrary) -> Self {
        Gradient::Arbitrary(value)
    }
}

/// RF pulse, sampled on the RF raster.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RfPulse {
    /// Complex B1 amplitude, one value per raster step. Unit: `Hz`
    pub signal: Vec<Complex64>,
    /// Start of the raster step in which the corresponding `signal` sample is
    /// played out, relative to the block start. Unit: `s`
    pub times: Vec<f64>,
}

impl RfPulse {
    /// Pulse starting at `delay` with one sample per `rf_raster`.
    pub fn on_raster(signal: Vec<Complex64>, rf_raster: f64, delay: f64) -> Self {
        let times = (0..signal.len())
            .map(|i| delay + i as f64 * rf_raster)
            .collect();
        Self { signal, times }
    }

    /// Rectangular pulse with constant amplitude and phase.
    pub fn block(flip_angle: f64, phase: f64, duration: f64, rf_raster: f64) -> Self {
        let num = (duration / rf_raster).round().max(1.0) as usize;
        let amplitude = flip_angle / (std::f64::consts::TAU * num as f64 * rf_raster);
        let sample = Complex64::from_polar(amplitude, phase);
        Self::on_raster(vec![sample; num], rf_raster, 0.0)
    }

    pub fn duration(&self, rf_raster: f64) -> f64 {
        self.times.first().map_or(0.0, |t0| t0 + self.signal.len() as f64 * rf_raster)
    }
}

/// ADC readout.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Adc {
    pub num_samples: usize,
    /// Unit: `s`
    pub dwell: f64,
    /// Unit: `s`
    pub delay: f64,
}

impl Adc {
    pub fn new(num_samples: usize, dwell: f64, delay: f64) -> Self {
        Self {
            num_samples,
            dwell,
            delay,
        }
    }

    pub fn duration(&self) -> f64 {
        self.delay + self.num_samples as f64 * self.dwell
    }
}
