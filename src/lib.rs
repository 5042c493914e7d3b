//! Bloch simulation of MRI pulse sequences. A `Sequence` of blocks (delays, RF
//! pulses, gradients and ADC readouts) is applied to every location of a
//! `Phantom`. Each location is simulated by an independent isochromat and the
//! sampled signals are summed into the ensemble signal, which is what a real
//! scanner would acquire.
//!
//! The sequence file format and the phantom construction are not part of the
//! simulation itself: the core consumes a parsed `Sequence` and anything that
//! implements the `Phantom` trait. A pulseq importer and a simple voxel phantom
//! are provided for convenience.

mod backend_pulseq;
mod dispatch;
mod error;
mod gradient;
mod isochromat;
mod phantom;
mod runner;
mod sequence;
mod types;
mod util;

pub use dispatch::{apply_block, apply_sequence, Event};
pub use error::{Error, Result};
pub use gradient::{
    gradient_areas, precessing_time, reconstruct, reconstruct_for_adc, GradientWaveform, Timing,
};
pub use isochromat::Isochromat;
pub use num_complex::Complex64;
pub use phantom::{Location, Phantom, Sphere, TissueParams, VoxelPhantom};
pub use runner::{simulate, simulate_location, SimulationOptions};
pub use sequence::{Sequence, TimeRaster};
pub use types::*;

/// Gyromagnetic ratio of hydrogen. Unit: `Hz / T`
pub const GAMMA_BAR: f64 = 42.58e6;
/// Gyromagnetic ratio of hydrogen. Unit: `rad / (s T)`
pub const GAMMA: f64 = std::f64::consts::TAU * GAMMA_BAR;
