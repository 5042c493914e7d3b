use num_complex::Complex64;

use crate::gradient::{gradient_areas, precessing_time, reconstruct, reconstruct_for_adc, Timing};
use crate::{Adc, Block, Isochromat, Result, RfPulse, Sequence, Signal, TimeRaster, GAMMA_BAR};

/// What a block does to an isochromat. Decided once per block, see `Block::event`.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    /// Free precession without gradients. Unit: `s`
    Delay(f64),
    /// RF pulse, possibly with concurrent gradients
    Rf(&'a RfPulse),
    /// ADC readout, possibly with concurrent gradients
    Adc(&'a Adc),
    /// Only gradients: applied as their net moment
    Gradients,
}

impl Block {
    /// Classifies the block. If more than one event is present, the priority is
    /// delay > rf > adc > gradients. Returns `None` for empty blocks.
    pub fn event(&self) -> Option<Event<'_>> {
        if let Some(delay) = self.delay {
            Some(Event::Delay(delay))
        } else if let Some(rf) = &self.rf {
            Some(Event::Rf(rf))
        } else if let Some(adc) = &self.adc {
            Some(Event::Adc(adc))
        } else if self.has_gradients() {
            Some(Event::Gradients)
        } else {
            None
        }
    }
}

/// Simulates a single block. Returns the recorded samples if the block is an
/// ADC block. The block is validated first, malformed data aborts with an error
/// before the isochromat is touched.
pub fn apply_block(
    iso: &mut Isochromat,
    key: u32,
    block: &Block,
    raster: TimeRaster,
) -> Result<Option<Vec<Complex64>>> {
    block.validate(key)?;

    let Some(event) = block.event() else {
        log::trace!("block {key} is empty, skipping");
        return Ok(None);
    };

    match event {
        Event::Delay(delay) => {
            iso.free_precess([0.0; 3], delay)?;
            Ok(None)
        }
        Event::Rf(rf) => {
            let grad = reconstruct(block, Timing::Points(&rf.times), raster.grad)?;
            let b1: Vec<Complex64> = rf.signal.iter().map(|s| *s / GAMMA_BAR).collect();
            iso.apply_rf(&b1, &grad.amplitudes, raster.rf)?;
            Ok(None)
        }
        Event::Adc(adc) => apply_adc(iso, block, adc, raster).map(Some),
        Event::Gradients => {
            let area = gradient_areas(block);
            let duration = precessing_time(block, raster.grad);
            iso.free_precess(area, duration)?;
            Ok(None)
        }
    }
}

/// Precess through the ADC delay, then alternate between sampling and
/// precessing for one dwell time. Sample `k` is taken after `k` dwell times,
/// the first one directly after the delay. Gradients are approximated as
/// constant over every dwell interval, using their value at its start.
fn apply_adc(iso: &mut Isochromat, block: &Block, adc: &Adc, raster: TimeRaster) -> Result<Vec<Complex64>> {
    let grad = reconstruct_for_adc(block, adc, raster.grad)?;
    let scale = |g: [f64; 3], dt: f64| g.map(|x| x * dt);

    iso.free_precess(scale(grad.at(0), adc.delay), adc.delay)?;

    let mut samples = Vec::with_capacity(adc.num_samples);
    for i in 1..grad.len() {
        if i <= adc.num_samples {
            samples.push(iso.signal());
        }
        iso.free_precess(scale(grad.at(i), adc.dwell), adc.dwell)?;
    }

    Ok(samples)
}

/// Runs the whole sequence on one isochromat, block by block in key order.
pub fn apply_sequence(iso: &mut Isochromat, sequence: &Sequence) -> Result<Signal> {
    let raster = sequence.time_raster();
    let mut signal = Signal::new();

    for (key, block) in sequence.blocks() {
        if let Some(samples) = apply_block(iso, key, block, raster)? {
            signal.push_adc_block(samples);
        }
    }

    Ok(signal)
}
