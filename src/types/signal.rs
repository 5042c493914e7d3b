use ndarray::Array2;
use num_complex::Complex64;

use crate::{Error, Result};

/// Sampled signal: one list of complex samples (`Mx + i My`) per ADC block,
/// in the order the ADC blocks appear in the sequence.
#[derive(Default, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signal {
    adc_blocks: Vec<Vec<Complex64>>,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_adc_block(&mut self, samples: Vec<Complex64>) {
        self.adc_blocks.push(samples);
    }

    pub fn adc_blocks(&self) -> &[Vec<Complex64>] {
        &self.adc_blocks
    }

    pub fn into_adc_blocks(self) -> Vec<Vec<Complex64>> {
        self.adc_blocks
    }

    pub fn is_empty(&self) -> bool {
        self.adc_blocks.is_empty()
    }

    /// Number of samples of every ADC block
    pub fn shape(&self) -> Vec<usize> {
        self.adc_blocks.iter().map(Vec::len).collect()
    }

    /// Elementwise sum. Both signals must come from the same sequence, so any
    /// difference in shape is an error and leaves `self` untouched.
    pub fn accumulate(&mut self, other: &Signal) -> Result<()> {
        let expected = self.shape();
        let found = other.shape();
        if expected != found {
            return Err(Error::ShapeMismatch { expected, found });
        }

        for (acc, samples) in self.adc_blocks.iter_mut().zip(&other.adc_blocks) {
            for (a, s) in acc.iter_mut().zip(samples) {
                *a += *s;
            }
        }
        Ok(())
    }

    /// Rows are ADC blocks, columns are samples (e.g. the k-space of a
    /// cartesian 2D sequence). Fails if the ADC blocks differ in length.
    pub fn to_array(&self) -> Result<Array2<Complex64>> {
        let rows = self.adc_blocks.len();
        let cols = self.adc_blocks.first().map_or(0, Vec::len);
        if self.adc_blocks.iter().any(|b| b.len() != cols) {
            return Err(Error::RaggedSignal);
        }

        let flat = self.adc_blocks.iter().flatten().cloned().collect();
        Array2::from_shape_vec((rows, cols), flat).map_err(|_| Error::RaggedSignal)
    }
}

impl From<Vec<Vec<Complex64>>> for Signal {
    fn from(adc_blocks: Vec<Vec<Complex64>>) -> Self {
        Self { adc_blocks }
    }
}
