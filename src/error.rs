use thiserror::Error;

/// Failures while turning a WAV file into a normalized waveform.
///
/// Every variant is fatal for the file being loaded; no partial waveform is
/// ever produced.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Buffer length does not split evenly into frames.
    #[error("malformed input: {len} samples is not a multiple of {channels} channels")]
    MalformedInput { len: usize, channels: u16 },

    /// Channel count or sample encoding we do not handle.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Could not find the input file at: {0}")]
    NotFound(String),
}
