//! Bloch equation integration for a single isochromat. All operators mutate the
//! magnetization in place and follow `dM/dt = γ M × B` (left-handed precession)
//! followed by relaxation towards `[0, 0, PD]`.

use num_complex::Complex64;

use crate::util::{Magnetization, Rotation};
use crate::{Error, Location, Result, GAMMA, GAMMA_BAR};

/// A single magnetic moment at a fixed position. Owned by the worker that
/// simulates its location, never shared.
#[derive(Debug, Clone)]
pub struct Isochromat {
    m: Magnetization,
    /// Unit: `m`
    position: [f64; 3],
    pd: f64,
    /// Unit: `s`
    t1: f64,
    /// Unit: `s`
    t2: f64,
    /// Off-resonance. Unit: `Hz`
    df: f64,
}

impl Isochromat {
    /// Fully relaxed isochromat at the given location.
    pub fn new(location: &Location, df: f64) -> Result<Self> {
        location.validate()?;
        if !df.is_finite() {
            return Err(Error::InvalidInput(format!("off-resonance {df} is not finite")));
        }
        Ok(Self {
            m: Magnetization::relaxed(location.params.pd),
            position: location.position,
            pd: location.params.pd,
            t1: location.params.t1,
            t2: location.params.t2,
            df,
        })
    }

    /// Replace the magnetization, e.g. to start from a prepared state.
    pub fn with_magnetization(mut self, m: [f64; 3]) -> Self {
        self.m = Magnetization(m);
        self
    }

    pub fn magnetization(&self) -> [f64; 3] {
        self.m.0
    }

    pub fn position(&self) -> [f64; 3] {
        self.position
    }

    /// Angle between magnetization and the z-axis. Unit: `rad`
    pub fn flip_angle(&self) -> f64 {
        self.m.angle()
    }

    /// Transverse magnetization `Mx + i My`.
    pub fn signal(&self) -> Complex64 {
        Complex64::new(self.m.0[0], self.m.0[1])
    }

    /// Free precession under a gradient moment `area` (`T s / m`) followed by
    /// relaxation, both over `dt` seconds.
    pub fn free_precess(&mut self, area: [f64; 3], dt: f64) -> Result<()> {
        check_dt(dt)?;
        if !area.iter().all(|a| a.is_finite()) {
            return Err(Error::InvalidInput(format!("gradient area {area:?} is not finite")));
        }

        let phi = GAMMA * dot(area, self.position) + std::f64::consts::TAU * self.df * dt;
        if phi != 0.0 {
            self.m *= &Rotation::about_z(-phi);
        }
        self.relax_unchecked(dt);
        Ok(())
    }

    /// Only relaxation, no precession.
    pub fn relax(&mut self, dt: f64) -> Result<()> {
        check_dt(dt)?;
        self.relax_unchecked(dt);
        Ok(())
    }

    fn relax_unchecked(&mut self, dt: f64) {
        let e1 = (-dt / self.t1).exp();
        let e2 = (-dt / self.t2).exp();
        self.m.0[0] *= e2;
        self.m.0[1] *= e2;
        self.m.0[2] = self.pd - (self.pd - self.m.0[2]) * e1;
    }

    /// Applies an RF pulse sample by sample. `b1` is the complex RF field in
    /// `T`, `gradients` the concurrent gradient on every axis in `T / m`, both
    /// sampled once per RF raster step `dt`. Every step is a rotation around the
    /// effective field followed by relaxation over `dt`.
    pub fn apply_rf(&mut self, b1: &[Complex64], gradients: &[Vec<f64>; 3], dt: f64) -> Result<()> {
        check_dt(dt)?;
        if gradients.iter().any(|g| g.len() != b1.len()) {
            return Err(Error::InvalidInput(format!(
                "rf has {} samples but gradients have {:?}",
                b1.len(),
                gradients.iter().map(Vec::len).collect::<Vec<_>>()
            )));
        }
        if b1.iter().any(|b| !b.re.is_finite() || !b.im.is_finite())
            || gradients.iter().flatten().any(|g| !g.is_finite())
        {
            return Err(Error::InvalidInput("rf or gradient field is not finite".into()));
        }

        let b_off = self.df / GAMMA_BAR;
        for (i, b) in b1.iter().enumerate() {
            let g = [gradients[0][i], gradients[1][i], gradients[2][i]];
            let field = [b.re, b.im, dot(g, self.position) + b_off];
            let norm = dot(field, field).sqrt();

            if norm > 0.0 {
                let axis = field.map(|f| f / norm);
                self.m *= &Rotation::new(axis, -GAMMA * norm * dt);
            }
            self.relax_unchecked(dt);
        }
        Ok(())
    }
}

fn check_dt(dt: f64) -> Result<()> {
    if dt.is_finite() && dt >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("duration must be non-negative, got {dt}")))
    }
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TissueParams;
    use assert2::{check, let_assert};
    use std::f64::consts::{FRAC_PI_2, PI};

    fn isochromat(position: [f64; 3], pd: f64, t1: f64, t2: f64, df: f64) -> Isochromat {
        let location = Location {
            index: 0,
            position,
            params: TissueParams::new(pd, t1, t2),
        };
        Isochromat::new(&location, df).unwrap()
    }

    fn no_relaxation(position: [f64; 3], df: f64) -> Isochromat {
        isochromat(position, 1.0, f64::INFINITY, f64::INFINITY, df)
    }

    #[test]
    fn starts_relaxed() {
        let iso = isochromat([0.01, 0.0, 0.0], 0.7, 1.0, 0.1, 0.0);
        check!(iso.magnetization() == [0.0, 0.0, 0.7]);
        check!(iso.signal() == Complex64::new(0.0, 0.0));
    }

    #[test]
    fn free_precession_only_relaxes() {
        let (pd, t1, t2, dt) = (1.0, 1.0, 0.1, 0.05);
        let mut iso = isochromat([0.02, -0.01, 0.03], pd, t1, t2, 0.0)
            .with_magnetization([0.6, 0.8, 0.2]);
        let phase_before = iso.signal().arg();

        iso.free_precess([0.0; 3], dt).unwrap();

        let [mx, my, mz] = iso.magnetization();
        check!((iso.signal().arg() - phase_before).abs() < 1e-12);
        check!((mx.hypot(my) - (-dt / t2).exp()).abs() < 1e-12);
        check!((mz - (pd - (pd - 0.2) * (-dt / t1).exp())).abs() < 1e-12);
    }

    #[test]
    fn relaxation_reaches_equilibrium() {
        let mut iso = isochromat([0.0; 3], 0.8, 0.5, 0.05, 0.0).with_magnetization([0.3, 0.3, -0.8]);
        iso.relax(100.0).unwrap();
        let [mx, my, mz] = iso.magnetization();
        check!(mx.abs() < 1e-12);
        check!(my.abs() < 1e-12);
        check!((mz - 0.8).abs() < 1e-12);
    }

    #[test]
    fn gradient_precession_is_left_handed() {
        let x = 0.01;
        let area = FRAC_PI_2 / (GAMMA * x);
        let mut iso = no_relaxation([x, 0.0, 0.0], 0.0).with_magnetization([1.0, 0.0, 0.0]);
        iso.free_precess([area, 0.0, 0.0], 1e-3).unwrap();

        let [mx, my, mz] = iso.magnetization();
        check!(mx.abs() < 1e-9);
        check!((my + 1.0).abs() < 1e-9);
        check!(mz == 0.0);

        // The y-gradient doesn't see a spin at y = 0
        let mut iso = no_relaxation([x, 0.0, 0.0], 0.0).with_magnetization([1.0, 0.0, 0.0]);
        iso.free_precess([0.0, area, 0.0], 1e-3).unwrap();
        check!(iso.magnetization() == [1.0, 0.0, 0.0]);
    }

    #[test]
    fn off_resonance_matches_gradient() {
        // 250 Hz for 1 ms is a quarter turn
        let mut by_df = no_relaxation([0.0; 3], 250.0).with_magnetization([1.0, 0.0, 0.0]);
        by_df.free_precess([0.0; 3], 1e-3).unwrap();

        let x = 0.05;
        let mut by_grad = no_relaxation([x, 0.0, 0.0], 0.0).with_magnetization([1.0, 0.0, 0.0]);
        by_grad.free_precess([FRAC_PI_2 / (GAMMA * x), 0.0, 0.0], 1e-3).unwrap();

        check!((by_df.signal() - by_grad.signal()).norm() < 1e-9);
        check!((by_df.signal().arg() + FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn hard_pulse_90() {
        let num = 1000;
        let dt = 1e-6;
        let b1 = FRAC_PI_2 / (GAMMA * num as f64 * dt);
        let mut iso = no_relaxation([0.0; 3], 0.0);
        let zeros = vec![0.0; num];

        iso.apply_rf(
            &vec![Complex64::new(b1, 0.0); num],
            &[zeros.clone(), zeros.clone(), zeros],
            dt,
        )
        .unwrap();

        // B1 along x tips the magnetization onto +y
        check!((iso.flip_angle() - FRAC_PI_2).abs() < 1e-9);
        let [mx, my, mz] = iso.magnetization();
        check!(mx.abs() < 1e-9);
        check!((my - 1.0).abs() < 1e-9);
        check!(mz.abs() < 1e-9);
    }

    #[test]
    fn pulse_phase_rotates_axis() {
        let num = 200;
        let dt = 1e-6;
        let b1 = PI / (GAMMA * num as f64 * dt);
        let zeros = vec![0.0; num];
        let grads = [zeros.clone(), zeros.clone(), zeros];

        // 180° around y inverts z without creating transverse magnetization
        let mut iso = no_relaxation([0.0; 3], 0.0);
        iso.apply_rf(&vec![Complex64::new(0.0, b1); num], &grads, dt).unwrap();
        let [mx, my, mz] = iso.magnetization();
        check!(mx.abs() < 1e-9);
        check!(my.abs() < 1e-9);
        check!((mz + 1.0).abs() < 1e-9);
    }

    #[test]
    fn rf_with_zero_field_only_relaxes() {
        let num = 10;
        let dt = 1e-4;
        let mut pulsed = isochromat([0.0; 3], 1.0, 1.0, 0.1, 0.0).with_magnetization([0.5, 0.0, 0.5]);
        let mut relaxed = pulsed.clone();
        let zeros = vec![0.0; num];

        pulsed
            .apply_rf(
                &vec![Complex64::new(0.0, 0.0); num],
                &[zeros.clone(), zeros.clone(), zeros],
                dt,
            )
            .unwrap();
        relaxed.relax(num as f64 * dt).unwrap();

        for (a, b) in pulsed.magnetization().iter().zip(relaxed.magnetization()) {
            check!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn rejects_invalid_input() {
        let mut iso = no_relaxation([0.0; 3], 0.0);
        let_assert!(Err(Error::InvalidInput(_)) = iso.free_precess([0.0; 3], -1.0));
        check!(iso.free_precess([f64::NAN, 0.0, 0.0], 1.0).is_err());
        check!(iso.relax(f64::INFINITY).is_err());
        check!(iso
            .apply_rf(&[Complex64::new(1e-6, 0.0)], &[vec![], vec![], vec![]], 1e-6)
            .is_err());
        check!(iso
            .apply_rf(&[Complex64::new(f64::NAN, 0.0)], &[vec![0.0], vec![0.0], vec![0.0]], 1e-6)
            .is_err());

        let location = Location {
            index: 0,
            position: [0.0; 3],
            params: TissueParams::new(1.0, -1.0, 0.1),
        };
        check!(Isochromat::new(&location, 0.0).is_err());
    }
}
