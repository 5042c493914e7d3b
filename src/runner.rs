use std::time::Instant;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::{apply_sequence, Error, Isochromat, Location, Phantom, Result, Sequence, Signal};

/// Settings of an ensemble simulation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationOptions {
    /// Off-resonance applied to every isochromat. Unit: `Hz`
    pub off_resonance: f64,
    /// Number of worker threads. `None` uses the global rayon pool, which has
    /// one thread per available core.
    pub threads: Option<usize>,
    /// Number of locations simulated and summed by one task. The result does
    /// not depend on the thread count, but it does depend on this value
    /// (floating point summation order).
    pub chunk_size: usize,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            off_resonance: 0.0,
            threads: None,
            chunk_size: 64,
        }
    }
}

impl SimulationOptions {
    pub fn with_off_resonance(self, off_resonance: f64) -> Self {
        Self {
            off_resonance,
            ..self
        }
    }

    pub fn with_threads(self, threads: usize) -> Self {
        Self {
            threads: Some(threads),
            ..self
        }
    }

    pub fn with_chunk_size(self, chunk_size: usize) -> Self {
        Self { chunk_size, ..self }
    }
}

/// Simulates a single location: a fresh isochromat runs through the whole
/// sequence.
pub fn simulate_location(sequence: &Sequence, location: &Location, off_resonance: f64) -> Result<Signal> {
    let mut iso = Isochromat::new(location, off_resonance)?;
    apply_sequence(&mut iso, sequence)
}

/// Simulates every location of the phantom in parallel and returns the summed
/// signal. Fails if any location fails; there is no partial result.
pub fn simulate<P>(sequence: &Sequence, phantom: &P, options: &SimulationOptions) -> Result<Signal>
where
    P: Phantom + ?Sized,
{
    let indices = phantom.location_indices();
    if indices.is_empty() {
        return Err(Error::EmptyPhantom);
    }
    let chunk_size = options.chunk_size.max(1);

    log::info!(
        "simulating {} locations over {} blocks ({} ADC blocks)",
        indices.len(),
        sequence.len(),
        sequence.adc_count()
    );
    let start = Instant::now();

    // Chunks are summed in order, independently of which worker finishes first
    let run = || -> Result<Vec<Signal>> {
        indices
            .par_chunks(chunk_size)
            .map(|chunk| simulate_chunk(sequence, phantom, chunk, options.off_resonance))
            .collect()
    };
    let partials = match options.threads {
        Some(n) => ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .map_err(|e| Error::ThreadPool(e.to_string()))?
            .install(run)?,
        None => run()?,
    };

    let mut total = None;
    for partial in partials {
        accumulate(&mut total, partial)?;
    }

    log::info!("simulation took {:.3} s", start.elapsed().as_secs_f64());
    total.ok_or(Error::EmptyPhantom)
}

fn simulate_chunk<P>(sequence: &Sequence, phantom: &P, chunk: &[usize], off_resonance: f64) -> Result<Signal>
where
    P: Phantom + ?Sized,
{
    let mut total = None;
    for &index in chunk {
        let location = phantom.location(index).ok_or(Error::UnknownLocation(index))?;
        let signal = simulate_location(sequence, &location, off_resonance).map_err(|err| {
            log::debug!("location {index} failed: {err}");
            err
        })?;
        accumulate(&mut total, signal)?;
    }
    log::trace!("finished chunk of {} locations", chunk.len());
    total.ok_or(Error::EmptyPhantom)
}

fn accumulate(total: &mut Option<Signal>, signal: Signal) -> Result<()> {
    match total {
        Some(total) => total.accumulate(&signal),
        None => {
            *total = Some(signal);
            Ok(())
        }
    }
}
