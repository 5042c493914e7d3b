use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A block contains data that can't be simulated (negative durations, NaN
    /// amplitudes, waveforms with mismatching lengths, ...).
    #[error("block {key} is malformed: {reason}")]
    MalformedBlock { key: u32, reason: String },
    /// An isochromat operator was called with input it can't integrate.
    #[error("invalid isochromat input: {0}")]
    InvalidInput(String),
    #[error("sequence already contains a block with key {0}")]
    DuplicateBlock(u32),
    #[error("can't append after block {0}, no larger key is left")]
    KeyOverflow(u32),
    #[error("raster times must be finite and positive (grad: {grad}, rf: {rf})")]
    InvalidRaster { grad: f64, rf: f64 },
    /// Two signals that should be summed have a different number of ADC blocks
    /// or a different number of samples in one of them.
    #[error("signal shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("signal ADC blocks have different sample counts, can't convert to a 2D array")]
    RaggedSignal,
    #[error("phantom contains no locations")]
    EmptyPhantom,
    #[error("phantom has no location with index {0}")]
    UnknownLocation(usize),
    #[error("location {index} has invalid tissue parameters: {reason}")]
    InvalidTissue { index: usize, reason: String },
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
    #[error("failed to load pulseq sequence: {0}")]
    Pulseq(String),
}
