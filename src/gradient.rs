use crate::{Adc, Block, Error, Gradient, Result, GAMMA_BAR};

/// Where to sample the gradients of a block.
#[derive(Debug, Clone, Copy)]
pub enum Timing<'a> {
    /// Fixed raster starting at the block start. If `delay` is not zero, the
    /// raster instead starts at `delay` and is preceded by a single sample at 0.
    Raster { step: f64, delay: f64 },
    /// Explicit, block-relative time points
    Points(&'a [f64]),
}

/// Gradients of one block, sampled on all three axes at the same time points.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientWaveform {
    /// `[x, y, z]`, unit: `T / m`
    pub amplitudes: [Vec<f64>; 3],
    /// Unit: `s`
    pub times: Vec<f64>,
    /// Unit: `s`
    pub duration: f64,
}

impl GradientWaveform {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Gradient vector at sample `index`. Unit: `T / m`
    pub fn at(&self, index: usize) -> [f64; 3] {
        [0, 1, 2].map(|axis| self.amplitudes[axis][index])
    }

    /// Trapezoidal-rule integral of the sampled waveform. Unit: `T s / m`
    pub fn integrate(&self) -> [f64; 3] {
        [0, 1, 2].map(|axis| {
            self.times
                .windows(2)
                .zip(self.amplitudes[axis].windows(2))
                .map(|(t, a)| 0.5 * (a[0] + a[1]) * (t[1] - t[0]))
                .sum()
        })
    }
}

/// Samples the gradients of `block` and converts them from `Hz / m` to `T / m`.
/// Missing axes are zero. `grad_raster` is needed to know how long arbitrary
/// gradients last.
pub fn reconstruct(block: &Block, timing: Timing, grad_raster: f64) -> Result<GradientWaveform> {
    check_block(block)?;
    check_step(grad_raster)?;
    let (times, duration) = match timing {
        Timing::Raster { step, delay } => {
            check_step(step)?;
            if !(delay.is_finite() && delay >= 0.0) {
                return Err(Error::InvalidInput(format!("raster delay must be non-negative, got {delay}")));
            }
            let duration = precessing_time(block, grad_raster);
            let times = if delay == 0.0 {
                raster_points(0.0, duration, step)
            } else {
                let mut times = vec![0.0];
                times.extend(raster_points(delay, duration, step));
                times
            };
            (times, duration)
        }
        Timing::Points(points) => {
            if points.iter().any(|t| !t.is_finite()) {
                return Err(Error::InvalidInput("gradient sample times must be finite".into()));
            }
            let duration = match (points.first(), points.last()) {
                (Some(first), Some(last)) => last - first,
                _ => 0.0,
            };
            (points.to_vec(), duration)
        }
    };

    Ok(sample_block(block, times, duration, grad_raster))
}

/// Gradients sampled on the ADC dwell raster: one point at the block start,
/// then one point per dwell step starting at the ADC delay. The raster covers
/// at least all ADC samples, and continues if the gradients last longer.
pub fn reconstruct_for_adc(block: &Block, adc: &Adc, grad_raster: f64) -> Result<GradientWaveform> {
    check_block(block)?;
    check_step(grad_raster)?;
    check_step(adc.dwell)?;
    if !(adc.delay.is_finite() && adc.delay >= 0.0) {
        return Err(Error::InvalidInput(format!("adc delay must be non-negative, got {}", adc.delay)));
    }
    let duration = precessing_time(block, grad_raster).max(adc.duration());

    let mut times = vec![0.0];
    times.extend(raster_points(adc.delay, duration, adc.dwell));

    Ok(sample_block(block, times, duration, grad_raster))
}

/// Net gradient moment of the block per axis. Unit: `T s / m`
pub fn gradient_areas(block: &Block) -> [f64; 3] {
    block
        .gradients()
        .map(|grad| grad.map_or(0.0, |g| g.area() / GAMMA_BAR))
}

/// Duration of the longest gradient in the block, zero if there is none.
pub fn precessing_time(block: &Block, grad_raster: f64) -> f64 {
    block
        .gradients()
        .iter()
        .flatten()
        .map(|g| g.duration(grad_raster))
        .fold(0.0, f64::max)
}

fn sample_block(block: &Block, times: Vec<f64>, duration: f64, grad_raster: f64) -> GradientWaveform {
    let amplitudes = block.gradients().map(|grad| match grad {
        Some(grad) => times
            .iter()
            .map(|&t| sample_gradient(grad, t, grad_raster) / GAMMA_BAR)
            .collect(),
        None => vec![0.0; times.len()],
    });

    GradientWaveform {
        amplitudes,
        times,
        duration,
    }
}

/// Gradient amplitude at block-relative time `t`. Unit: `Hz / m`
///
/// Arbitrary gradients play their first and last sample until the edges of
/// the raster steps they occupy, and are zero outside of them.
fn sample_gradient(grad: &Gradient, t: f64, grad_raster: f64) -> f64 {
    match grad {
        Gradient::Trapezoid(trap) => {
            let (times, amps) = trap.vertices();
            interpolate(t, &times, &amps)
        }
        Gradient::Arbitrary(arb) => {
            let t = t - arb.delay;
            let last = arb.times.last().copied().unwrap_or(0.0);
            let end = arb.amplitudes.len() as f64 * grad_raster;
            if t < 0.0 || (t >= end && t > last) {
                0.0
            } else {
                interpolate(t, &arb.times, &arb.amplitudes)
            }
        }
    }
}

/// Linear interpolation that holds `ys[0]` before and `ys[n - 1]` after the
/// samples. `xs` must be sorted and as long as `ys`; repeated values produce
/// a step.
fn interpolate(t: f64, xs: &[f64], ys: &[f64]) -> f64 {
    let (Some(&first), Some(&first_y), Some(&last_y)) = (xs.first(), ys.first(), ys.last()) else {
        return 0.0;
    };
    if t < first {
        return first_y;
    }

    // First index with xs[i] > t, so xs[i - 1] <= t < xs[i]
    let i = xs.partition_point(|&x| x <= t);
    if i == xs.len() {
        return last_y;
    }
    let (x0, x1) = (xs[i - 1], xs[i]);
    let (y0, y1) = (ys[i - 1], ys[i]);
    y0 + (y1 - y0) * (t - x0) / (x1 - x0)
}

/// `start, start + step, ...` for all points `< end`. Points that only miss
/// `end` by floating point noise are not included.
fn raster_points(start: f64, end: f64, step: f64) -> Vec<f64> {
    let count = ((end - start) / step - 1e-9).ceil().max(0.0) as usize;
    (0..count).map(|i| start + i as f64 * step).collect()
}

/// Same checks as `Block::validate`, reported as input errors since there is
/// no block key here.
fn check_block(block: &Block) -> Result<()> {
    block.validate(0).map_err(|err| match err {
        Error::MalformedBlock { reason, .. } => Error::InvalidInput(reason),
        other => other,
    })
}

fn check_step(step: f64) -> Result<()> {
    if step.is_finite() && step > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("raster step must be positive, got {step}")))
    }
}
