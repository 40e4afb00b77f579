use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use tracing::debug;

use crate::error::DecodeError;
use crate::normalize::AudioFormat;

/// Read every interleaved sample of a 16-bit integer PCM WAV file.
pub fn read_wav_file(file_path: &Path) -> Result<(Vec<i16>, AudioFormat), DecodeError> {
    if !file_path.exists() {
        return Err(DecodeError::NotFound(file_path.display().to_string()));
    }

    debug!("Reading WAV file from {}", file_path.display());
    let mut reader = WavReader::open(file_path)?;
    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(DecodeError::UnsupportedFormat(format!(
            "{}-bit {} samples (expected 16-bit integer PCM)",
            spec.bits_per_sample,
            match spec.sample_format {
                SampleFormat::Int => "integer",
                SampleFormat::Float => "float",
            }
        )));
    }

    let samples = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
    debug!("Read {} samples", samples.len());

    let format = AudioFormat {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    };
    Ok((samples, format))
}

/// 16-bit integer PCM, the only encoding wavscope reads or writes.
impl From<AudioFormat> for WavSpec {
    fn from(format: AudioFormat) -> Self {
        WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }
}

pub fn write_wav_file(
    output_path: &Path,
    samples: &[i16],
    format: AudioFormat,
) -> Result<(), DecodeError> {
    let mut writer = WavWriter::create(output_path, format.into())?;
    samples
        .iter()
        .try_for_each(|&sample| writer.write_sample(sample))?;
    writer.finalize()?;
    debug!("Wrote {} samples to {}", samples.len(), output_path.display());
    Ok(())
}
