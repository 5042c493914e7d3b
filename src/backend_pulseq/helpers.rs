use std::f64::consts::TAU;

use num_complex::Complex64;

use crate::{precessing_time, Adc, Arbitrary, Block, Gradient, RfPulse, TimeRaster, Trapezoid};

/// pulseq has no dedicated delay event: a block without any events only
/// contributes its duration. Blocks with events last as long as their longest
/// event, padding beyond that is dropped.
pub fn convert_block(key: u32, block: &pulseq_rs::Block, raster: TimeRaster) -> Block {
    let converted = Block {
        delay: None,
        rf: block.rf.as_deref().map(|rf| convert_rf(rf, raster.rf)),
        gx: block.gx.as_deref().map(|g| convert_grad(g, raster.grad)),
        gy: block.gy.as_deref().map(|g| convert_grad(g, raster.grad)),
        gz: block.gz.as_deref().map(|g| convert_grad(g, raster.grad)),
        adc: block.adc.as_deref().map(convert_adc),
    };

    if converted.event().is_none() {
        if block.duration > 0.0 {
            return Block::delay(block.duration as f64);
        }
        return converted;
    }

    let padding = unplayed_padding(&converted, block.duration as f64, raster);
    if padding > 0.0 {
        log::debug!("block {key}: {padding} s of padding after the last event is not simulated");
    }
    converted
}

/// Time between the end of the last event and the end of the block, ignoring
/// anything below the gradient raster.
pub fn unplayed_padding(block: &Block, duration: f64, raster: TimeRaster) -> f64 {
    let events = [
        block.rf.as_ref().map_or(0.0, |rf| rf.duration(raster.rf)),
        precessing_time(block, raster.grad),
        block.adc.map_or(0.0, |adc| adc.duration()),
    ]
    .into_iter()
    .fold(0.0, f64::max);

    let padding = duration - events;
    if padding > 0.5 * raster.grad {
        padding
    } else {
        0.0
    }
}

pub fn convert_rf(rf: &pulseq_rs::Rf, rf_raster: f64) -> RfPulse {
    if rf.freq != 0.0 {
        log::debug!("rf frequency offset of {} Hz is not simulated", rf.freq);
    }

    let amp = rf.amp as f64;
    let phase = rf.phase as f64;
    let signal = rf
        .amp_shape
        .0
        .iter()
        .zip(rf.phase_shape.0.iter())
        .map(|(&a, &p)| Complex64::from_polar(amp * a as f64, phase + p as f64 * TAU))
        .collect();

    RfPulse::on_raster(signal, rf_raster, rf.delay as f64)
}

pub fn convert_grad(grad: &pulseq_rs::Gradient, grad_raster: f64) -> Gradient {
    match grad {
        pulseq_rs::Gradient::Free {
            amp, delay, shape, ..
        } => {
            let amplitudes = shape.0.iter().map(|&x| *amp as f64 * x as f64).collect();
            Arbitrary::on_raster(amplitudes, grad_raster)
                .with_delay(*delay as f64)
                .into()
        }
        pulseq_rs::Gradient::Trap {
            amp,
            rise,
            flat,
            fall,
            delay,
            ..
        } => Trapezoid::new(*amp as f64, *rise as f64, *flat as f64, *fall as f64)
            .with_delay(*delay as f64)
            .into(),
    }
}

pub fn convert_adc(adc: &pulseq_rs::Adc) -> Adc {
    Adc::new(adc.num as usize, adc.dwell as f64, adc.delay as f64)
}
