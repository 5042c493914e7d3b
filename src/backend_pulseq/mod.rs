//! Importer for pulseq .seq files. Parsing is done by `pulseq-rs`, this module
//! only converts its blocks into the simulation's own `Block` type, so nothing
//! else in the crate depends on pulseq.

use std::path::Path;

use crate::{Error, Result, Sequence, TimeRaster};

mod helpers;

impl Sequence {
    /// Load a pulseq .seq file. Blocks are keyed by their position in the file,
    /// starting at 1.
    pub fn from_pulseq_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let seq = pulseq_rs::Sequence::from_file(path).map_err(pulseq_error)?;
        Self::from_pulseq(&seq)
    }

    /// Same as `from_pulseq_file`, but parses the file contents directly.
    pub fn from_pulseq_source(source: &str) -> Result<Self> {
        let seq = pulseq_rs::Sequence::from_source(source).map_err(pulseq_error)?;
        Self::from_pulseq(&seq)
    }

    fn from_pulseq(seq: &pulseq_rs::Sequence) -> Result<Self> {
        let raster = TimeRaster {
            grad: seq.time_raster.grad as f64,
            rf: seq.time_raster.rf as f64,
        };
        let mut sequence = Sequence::new(raster)?;

        for (i, block) in seq.blocks.iter().enumerate() {
            let key = i as u32 + 1;
            sequence.insert(key, helpers::convert_block(key, block, raster))?;
        }

        log::debug!(
            "imported pulseq sequence: {} blocks, {} ADC blocks",
            sequence.len(),
            sequence.adc_count()
        );
        Ok(sequence)
    }
}

fn pulseq_error(err: pulseq_rs::Error) -> Error {
    Error::Pulseq(format!("{err:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Gradient, GradientChannel};
    use assert2::{check, let_assert};

    const SEQ: &str = r#"
[VERSION]
major 1
minor 4
revision 1

[DEFINITIONS]
AdcRasterTime 1e-07
BlockDurationRaster 1e-05
GradientRasterTime 1e-05
RadiofrequencyRasterTime 1e-06

# NUM DUR RF  GX  GY  GZ  ADC  EXT
[BLOCKS]
1  10   1   0   0   0   0   0
2  50   0   0   0   0   0   0
3  150  0   1   2   0   1   0

# id amplitude mag_id phase_id time_shape_id delay freq phase
[RF]
1 250 1 2 0 0 0 0.5

# id amplitude amp_shape_id time_shape_id delay
[GRADIENTS]
2 1000 3 0 20

# id amplitude rise flat fall delay
[TRAP]
1 100000 10 1000 10 0

# id num dwell delay freq phase
[ADC]
1 10 100000 10 0 0

[SHAPES]

shape_id 1
num_samples 4
1
1
0.5
0.5

shape_id 2
num_samples 4
0
0.25
0.25
0

shape_id 3
num_samples 3
0.5
1
0.5
"#;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1e-9)
    }

    #[test]
    fn import_inline_sequence() {
        let_assert!(Ok(seq) = Sequence::from_pulseq_source(SEQ));
        check!(seq.len() == 3);
        check!(seq.adc_count() == 1);
        check!(close(seq.time_raster().grad, 1e-5));
        check!(close(seq.time_raster().rf, 1e-6));

        // Magnitude and phase shapes become complex samples on the rf raster
        let_assert!(Some(rf) = seq.get(1).and_then(|b| b.rf.as_ref()));
        check!(rf.signal.len() == 4);
        check!(close(rf.times[3], 3e-6));
        let expected = [(250.0, 0.5), (250.0, 0.5 + 0.25 * std::f64::consts::TAU)];
        for (sample, (norm, arg)) in rf.signal.iter().zip(expected) {
            check!(close(sample.norm(), norm));
            check!((sample.arg() - arg).abs() < 1e-5);
        }
        check!(close(rf.signal[3].norm(), 125.0));

        // Empty block turns into a delay
        let_assert!(Some(delay) = seq.get(2).and_then(|b| b.delay));
        check!(close(delay, 5e-4));

        let_assert!(Some(readout) = seq.get(3));
        let_assert!(Some(adc) = readout.adc);
        check!(adc.num_samples == 10);
        check!(close(adc.dwell, 1e-4));
        check!(close(adc.delay, 1e-5));
        let_assert!(Some(Gradient::Trapezoid(trap)) = readout.gradient(GradientChannel::X));
        check!(close(trap.amplitude, 1e5));
        check!(close(trap.flat, 1e-3));

        // Free gradient samples sit on the raster centers
        let_assert!(Some(Gradient::Arbitrary(arb)) = readout.gradient(GradientChannel::Y));
        check!(close(arb.delay, 2e-5));
        check!(arb.times.len() == 3);
        for (t, expected) in arb.times.iter().zip([0.5e-5, 1.5e-5, 2.5e-5]) {
            check!(close(*t, expected));
        }
        for (a, expected) in arb.amplitudes.iter().zip([500.0, 1000.0, 500.0]) {
            check!(close(*a, expected));
        }

        // 1.5 ms block, the x trapezoid ends last after 1.02 ms
        let padding = helpers::unplayed_padding(readout, 1.5e-3, seq.time_raster());
        check!(close(padding, 0.48e-3));
        check!(helpers::unplayed_padding(readout, 1.02e-3, seq.time_raster()) == 0.0);
    }

    #[test]
    fn invalid_source_is_an_error() {
        let_assert!(Err(Error::Pulseq(_)) = Sequence::from_pulseq_source("not a sequence"));
    }
}
