use std::collections::BTreeMap;

use crate::{Block, Error, Result};

/// Raster times of the scanner the sequence was written for.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeRaster {
    /// Unit: `s`
    pub grad: f64,
    /// Unit: `s`
    pub rf: f64,
}

impl Default for TimeRaster {
    /// Siemens defaults, also used by pulseq
    fn default() -> Self {
        Self {
            grad: 10e-6,
            rf: 1e-6,
        }
    }
}

/// An MRI sequence: blocks ordered by a strictly increasing key, plus the
/// raster times needed to interpret them. The simulation only reads from it,
/// so a single `Sequence` can be shared by all workers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sequence {
    time_raster: TimeRaster,
    blocks: BTreeMap<u32, Block>,
}

impl Sequence {
    pub fn new(time_raster: TimeRaster) -> Result<Self> {
        let TimeRaster { grad, rf } = time_raster;
        if !(grad.is_finite() && grad > 0.0 && rf.is_finite() && rf > 0.0) {
            return Err(Error::InvalidRaster { grad, rf });
        }
        Ok(Self {
            time_raster,
            blocks: BTreeMap::new(),
        })
    }

    pub fn time_raster(&self) -> TimeRaster {
        self.time_raster
    }

    /// Insert a block with an explicit key. Keys don't need to be contiguous,
    /// but every key can only be used once.
    pub fn insert(&mut self, key: u32, block: Block) -> Result<()> {
        if self.blocks.contains_key(&key) {
            return Err(Error::DuplicateBlock(key));
        }
        self.blocks.insert(key, block);
        Ok(())
    }

    /// Append a block after the last one, returning its key.
    pub fn push(&mut self, block: Block) -> Result<u32> {
        let key = match self.blocks.keys().next_back() {
            Some(&last) => last.checked_add(1).ok_or(Error::KeyOverflow(last))?,
            None => 1,
        };
        self.blocks.insert(key, block);
        Ok(key)
    }

    pub fn get(&self, key: u32) -> Option<&Block> {
        self.blocks.get(&key)
    }

    /// Blocks in ascending key order.
    pub fn blocks(&self) -> impl Iterator<Item = (u32, &Block)> {
        self.blocks.iter().map(|(key, block)| (*key, block))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of ADC blocks, which is the number of rows of the simulated signal.
    pub fn adc_count(&self) -> usize {
        self.blocks().filter(|(_, b)| b.adc.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Adc;
    use assert2::check;

    #[test]
    fn keys_are_ordered() {
        let mut seq = Sequence::new(TimeRaster::default()).unwrap();
        check!(seq.insert(10, Block::delay(1.0)).is_ok());
        check!(seq.insert(3, Block::delay(2.0)).is_ok());
        check!(seq.push(Block::adc(Adc::new(1, 1e-3, 0.0))) == Ok(11));

        let keys: Vec<u32> = seq.blocks().map(|(key, _)| key).collect();
        check!(keys == vec![3, 10, 11]);
        check!(seq.adc_count() == 1);
    }

    #[test]
    fn duplicate_keys() {
        let mut seq = Sequence::new(TimeRaster::default()).unwrap();
        check!(seq.push(Block::delay(1.0)) == Ok(1));
        check!(seq.insert(1, Block::delay(1.0)) == Err(Error::DuplicateBlock(1)));
    }

    #[test]
    fn push_after_last_key() {
        let mut seq = Sequence::new(TimeRaster::default()).unwrap();
        check!(seq.insert(u32::MAX, Block::delay(1.0)).is_ok());
        check!(seq.push(Block::delay(2.0)) == Err(Error::KeyOverflow(u32::MAX)));
        check!(seq.len() == 1);
    }

    #[test]
    fn invalid_raster() {
        check!(Sequence::new(TimeRaster { grad: 0.0, rf: 1e-6 }).is_err());
        check!(Sequence::new(TimeRaster { grad: 1e-5, rf: f64::NAN }).is_err());
    }
}
