mod event_types;
mod signal;

pub use event_types::*;
pub use signal::*;

use crate::{Error, Result};

/// Used to address one of the three gradient channels of a `Block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientChannel {
    X,
    Y,
    Z,
}

impl GradientChannel {
    pub const ALL: [GradientChannel; 3] = [GradientChannel::X, GradientChannel::Y, GradientChannel::Z];
}

/// One block of a sequence. All slots are optional; which ones are populated
/// decides how the block is simulated (see `Block::event`).
#[derive(Default, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    /// Unit: `s`
    pub delay: Option<f64>,
    pub rf: Option<RfPulse>,
    pub gx: Option<Gradient>,
    pub gy: Option<Gradient>,
    pub gz: Option<Gradient>,
    pub adc: Option<Adc>,
}

impl Block {
    pub fn delay(duration: f64) -> Self {
        Self {
            delay: Some(duration),
            ..Default::default()
        }
    }

    pub fn rf(rf: RfPulse) -> Self {
        Self {
            rf: Some(rf),
            ..Default::default()
        }
    }

    pub fn adc(adc: Adc) -> Self {
        Self {
            adc: Some(adc),
            ..Default::default()
        }
    }

    pub fn with_gradient(mut self, channel: GradientChannel, grad: impl Into<Gradient>) -> Self {
        *self.gradient_mut(channel) = Some(grad.into());
        self
    }

    pub fn gradient(&self, channel: GradientChannel) -> Option<&Gradient> {
        match channel {
            GradientChannel::X => self.gx.as_ref(),
            GradientChannel::Y => self.gy.as_ref(),
            GradientChannel::Z => self.gz.as_ref(),
        }
    }

    fn gradient_mut(&mut self, channel: GradientChannel) -> &mut Option<Gradient> {
        match channel {
            GradientChannel::X => &mut self.gx,
            GradientChannel::Y => &mut self.gy,
            GradientChannel::Z => &mut self.gz,
        }
    }

    /// `[gx, gy, gz]`
    pub fn gradients(&self) -> [Option<&Gradient>; 3] {
        GradientChannel::ALL.map(|channel| self.gradient(channel))
    }

    pub fn has_gradients(&self) -> bool {
        self.gradients().iter().any(Option::is_some)
    }

    /// Checks everything the simulation relies on. A block that passes can be
    /// dispatched without producing NaNs.
    pub fn validate(&self, key: u32) -> Result<()> {
        let malformed = |reason: String| Error::MalformedBlock { key, reason };

        if let Some(delay) = self.delay {
            check_duration("delay", delay).map_err(malformed)?;
        }

        if let Some(rf) = &self.rf {
            if rf.signal.len() != rf.times.len() {
                return Err(malformed(format!(
                    "rf has {} samples but {} sample times",
                    rf.signal.len(),
                    rf.times.len()
                )));
            }
            if rf.signal.iter().any(|s| !s.re.is_finite() || !s.im.is_finite()) {
                return Err(malformed("rf signal contains non-finite samples".into()));
            }
            if rf.times.iter().any(|t| !t.is_finite()) {
                return Err(malformed("rf sample times must be finite".into()));
            }
        }

        for (channel, grad) in GradientChannel::ALL.iter().zip(self.gradients()) {
            match grad {
                Some(Gradient::Trapezoid(trap)) => {
                    if !trap.amplitude.is_finite() {
                        return Err(malformed(format!("{channel:?} trapezoid amplitude is not finite")));
                    }
                    for (name, value) in [
                        ("rise", trap.rise),
                        ("flat", trap.flat),
                        ("fall", trap.fall),
                        ("delay", trap.delay),
                    ] {
                        check_duration(name, value)
                            .map_err(|reason| malformed(format!("{channel:?} trapezoid {reason}")))?;
                    }
                }
                Some(Gradient::Arbitrary(arb)) => {
                    if arb.times.len() != arb.amplitudes.len() {
                        return Err(malformed(format!(
                            "{channel:?} gradient has {} samples but {} sample times",
                            arb.amplitudes.len(),
                            arb.times.len()
                        )));
                    }
                    if arb.amplitudes.iter().chain(&arb.times).any(|x| !x.is_finite()) {
                        return Err(malformed(format!("{channel:?} gradient contains non-finite values")));
                    }
                    if arb.times.windows(2).any(|t| t[1] < t[0]) {
                        return Err(malformed(format!("{channel:?} gradient sample times are not sorted")));
                    }
                    check_duration("delay", arb.delay)
                        .map_err(|reason| malformed(format!("{channel:?} gradient {reason}")))?;
                }
                None => (),
            }
        }

        if let Some(adc) = &self.adc {
            if !(adc.dwell.is_finite() && adc.dwell > 0.0) {
                return Err(malformed(format!("adc dwell time must be positive, got {}", adc.dwell)));
            }
            check_duration("adc delay", adc.delay).map_err(malformed)?;
        }

        Ok(())
    }
}

fn check_duration(name: &str, value: f64) -> std::result::Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("{name} must be a non-negative duration, got {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};

    #[test]
    fn negative_delay_is_rejected() {
        let_assert!(Err(Error::MalformedBlock { key, .. }) = Block::delay(-1e-3).validate(7));
        check!(key == 7);
        check!(Block::delay(f64::NAN).validate(0).is_err());
        check!(Block::delay(0.0).validate(0).is_ok());
    }

    #[test]
    fn gradient_checks() {
        let nan_trap = Block::default().with_gradient(
            GradientChannel::Y,
            Trapezoid::new(f64::NAN, 1e-4, 1e-3, 1e-4),
        );
        check!(nan_trap.validate(1).is_err());

        // Negative amplitudes are fine, negative ramps are not
        let negative = Block::default().with_gradient(
            GradientChannel::X,
            Trapezoid::new(-1000.0, 1e-4, 1e-3, 1e-4),
        );
        check!(negative.validate(1).is_ok());
        let bad_ramp = Block::default().with_gradient(
            GradientChannel::X,
            Trapezoid::new(1000.0, -1e-4, 1e-3, 1e-4),
        );
        check!(bad_ramp.validate(1).is_err());

        let ragged = Block::default().with_gradient(
            GradientChannel::Z,
            Arbitrary::new(vec![0.0, 1e-5], vec![1.0]),
        );
        check!(ragged.validate(1).is_err());

        let unsorted = Block::default().with_gradient(
            GradientChannel::Z,
            Arbitrary::new(vec![1e-5, 0.0], vec![1.0, 2.0]),
        );
        check!(unsorted.validate(1).is_err());
    }

    #[test]
    fn adc_and_rf_checks() {
        check!(Block::adc(Adc::new(4, 0.0, 0.0)).validate(0).is_err());
        check!(Block::adc(Adc::new(4, 1e-5, -1.0)).validate(0).is_err());
        check!(Block::adc(Adc::new(4, 1e-5, 0.0)).validate(0).is_ok());

        let mut rf = RfPulse::block(1.0, 0.0, 1e-3, 1e-6);
        check!(Block::rf(rf.clone()).validate(0).is_ok());
        rf.times.pop();
        check!(Block::rf(rf).validate(0).is_err());
    }

    #[test]
    fn gradient_slots() {
        let block = Block::default()
            .with_gradient(GradientChannel::Z, Trapezoid::new(1.0, 1.0, 1.0, 1.0));
        check!(block.has_gradients());
        check!(block.gradients()[0].is_none());
        check!(block.gradients()[2].is_some());
        check!(!Block::delay(1.0).has_gradients());
    }
}
