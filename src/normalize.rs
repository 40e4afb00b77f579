use crate::error::DecodeError;

/// Full scale of signed 16-bit PCM. Dividing by 2^15 keeps `i16::MIN` at
/// exactly -1.0 and leaves `i16::MAX` just short of 1.0.
const PCM16_SCALE: f32 = 32768.0;

/// Sample rate and channel layout of an interleaved PCM buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Mono voltage samples in `[-1.0, 1.0)` ready for plotting.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
    source_channels: u16,
}

impl Waveform {
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count of the buffer this waveform was mixed down from.
    pub fn source_channels(&self) -> u16 {
        self.source_channels
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Downmix interleaved 16-bit frames to mono and scale them to voltages.
///
/// Stereo frames are averaged pair by pair before scaling, so stereo phase is
/// lost. Only mono and stereo input is accepted.
pub fn normalize(frames: &[i16], format: AudioFormat) -> Result<Waveform, DecodeError> {
    let channels = format.channels;
    if channels == 0 || channels > 2 {
        return Err(DecodeError::UnsupportedFormat(format!(
            "{} channels (expected 1 or 2)",
            channels
        )));
    }
    if format.sample_rate == 0 {
        return Err(DecodeError::InvalidFormat(
            "sample rate must be positive".to_string(),
        ));
    }
    if frames.len() % channels as usize != 0 {
        return Err(DecodeError::MalformedInput {
            len: frames.len(),
            channels,
        });
    }

    let samples = if channels == 2 {
        frames
            .chunks_exact(2)
            .map(|pair| (pair[0] as f32 + pair[1] as f32) / 2.0 / PCM16_SCALE)
            .collect()
    } else {
        frames.iter().map(|&s| s as f32 / PCM16_SCALE).collect()
    };

    Ok(Waveform {
        samples,
        sample_rate: format.sample_rate,
        source_channels: channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono(sample_rate: u32) -> AudioFormat {
        AudioFormat {
            sample_rate,
            channels: 1,
        }
    }

    fn stereo(sample_rate: u32) -> AudioFormat {
        AudioFormat {
            sample_rate,
            channels: 2,
        }
    }

    #[test]
    fn mono_scales_each_sample() {
        let wave = normalize(&[0, 16384, -16384, 32767], mono(8000)).unwrap();
        let expected = [0.0, 0.5, -0.5, 0.999969];
        assert_eq!(wave.sample_count(), 4);
        for (got, want) in wave.samples().iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{} != {}", got, want);
        }
        assert!((wave.duration_seconds() - 0.0005).abs() < 1e-9);
        assert_eq!(wave.source_channels(), 1);
    }

    #[test]
    fn stereo_averages_pairs() {
        let wave = normalize(&[0, 0, 32767, -32768], stereo(44100)).unwrap();
        assert_eq!(wave.sample_count(), 2);
        assert_eq!(wave.samples()[0], 0.0);
        assert!((wave.samples()[1] - (-0.5 / 32768.0)).abs() < 1e-9);
        assert!((wave.samples()[1] + 0.0000153).abs() < 1e-7);
    }

    #[test]
    fn stereo_output_is_exact_pair_mean() {
        let frames = [100, 300, -7, 8, 32767, 32767, -32768, -32768];
        let wave = normalize(&frames, stereo(48000)).unwrap();
        for (pair, &got) in frames.chunks(2).zip(wave.samples()) {
            let mean = (pair[0] as f32 + pair[1] as f32) / 2.0;
            assert_eq!(got, mean / 32768.0);
        }
    }

    #[test]
    fn extremes_stay_in_range() {
        let wave = normalize(&[i16::MIN, i16::MAX, -1, 1], mono(44100)).unwrap();
        assert_eq!(wave.samples()[0], -1.0);
        assert!(wave.samples().iter().all(|&v| (-1.0..1.0).contains(&v)));
        assert!(wave.samples()[1] < 1.0);
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let frames: Vec<i16> = (-300..300).map(|i| (i * 97) as i16).collect();
        let a = normalize(&frames, stereo(22050)).unwrap();
        let b = normalize(&frames, stereo(22050)).unwrap();
        let bits = |w: &Waveform| w.samples().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn duration_matches_count_over_rate() {
        let frames = vec![0i16; 44100 * 3 + 17];
        let wave = normalize(&frames, mono(44100)).unwrap();
        let expected = wave.sample_count() as f64 / 44100.0;
        assert!((wave.duration_seconds() - expected).abs() < 1e-9);
    }

    #[test]
    fn empty_buffer_gives_empty_waveform() {
        let wave = normalize(&[], stereo(8000)).unwrap();
        assert_eq!(wave.sample_count(), 0);
        assert_eq!(wave.duration_seconds(), 0.0);
    }

    #[test]
    fn odd_stereo_buffer_is_malformed() {
        let err = normalize(&[1, 2, 3, 4, 5], stereo(8000)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedInput {
                len: 5,
                channels: 2
            }
        ));
    }

    #[test]
    fn three_channels_are_unsupported() {
        let format = AudioFormat {
            sample_rate: 8000,
            channels: 3,
        };
        let err = normalize(&[0; 6], format).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat(_)));
    }

    #[test]
    fn zero_channels_are_unsupported() {
        let format = AudioFormat {
            sample_rate: 8000,
            channels: 0,
        };
        assert!(matches!(
            normalize(&[], format),
            Err(DecodeError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn zero_sample_rate_is_invalid() {
        let err = normalize(&[0, 1], mono(0)).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidFormat(_)));
    }
}
