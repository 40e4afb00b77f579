//! Audio device check: list what the host sees and play a short sine tone
//! through the default output device.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, StreamConfig};
use std::f64::consts::PI;
use std::fmt;
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::error::DecodeError;
use crate::normalize::AudioFormat;
use crate::wav::write_wav_file;

const SAVE_SAMPLE_RATE: u32 = 44100;

/// Longest tone the diagnostic will synthesize.
pub const MAX_TONE_SECONDS: f64 = 60.0;

#[derive(Debug, Error)]
pub enum DiagnosticError {
    #[error("No output device available")]
    NoOutputDevice,

    #[error("failed to enumerate devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to read device name: {0}")]
    DeviceName(#[from] cpal::DeviceNameError),

    #[error("no default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("Unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),

    #[error("tone did not finish within {0:?}")]
    Timeout(Duration),

    #[error("failed to save tone: {0}")]
    Save(#[from] DecodeError),

    #[error("invalid tone: {0}")]
    InvalidTone(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub index: usize,
    pub name: String,
    pub input_channels: u16,
    pub output_channels: u16,
    pub default_sample_rate: Option<u32>,
    pub is_default_input: bool,
    pub is_default_output: bool,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match (self.is_default_input, self.is_default_output) {
            (true, true) => '*',
            (true, false) => '>',
            (false, true) => '<',
            (false, false) => ' ',
        };
        write!(
            f,
            "{} {:>2} {} ({} in, {} out)",
            marker, self.index, self.name, self.input_channels, self.output_channels
        )?;
        if let Some(rate) = self.default_sample_rate {
            write!(f, " @ {} Hz", rate)?;
        }
        Ok(())
    }
}

pub fn list_devices() -> Result<Vec<DeviceInfo>, DiagnosticError> {
    let host = cpal::default_host();
    debug!("Using audio host {:?}", host.id());

    let default_input = host.default_input_device().and_then(|d| d.name().ok());
    let default_output = host.default_output_device().and_then(|d| d.name().ok());

    let mut devices = Vec::new();
    for (index, device) in host.devices()?.enumerate() {
        let name = display_name(index, device.name());
        let input = device.default_input_config().ok();
        let output = device.default_output_config().ok();
        let default_sample_rate = output
            .as_ref()
            .or(input.as_ref())
            .map(|config| config.sample_rate().0);

        devices.push(DeviceInfo {
            index,
            input_channels: input.map_or(0, |c| c.channels()),
            output_channels: output.map_or(0, |c| c.channels()),
            default_sample_rate,
            is_default_input: default_input.as_deref() == Some(name.as_str()),
            is_default_output: default_output.as_deref() == Some(name.as_str()),
            name,
        });
    }
    Ok(devices)
}

/// Name for the listing; one unreadable device must not hide the others.
fn display_name(index: usize, name: Result<String, cpal::DeviceNameError>) -> String {
    name.unwrap_or_else(|e| {
        warn!("Could not read name of device {}: {}", index, e);
        format!("<unnamed device {}>", index)
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency: f64,
    pub duration: f64,
    pub amplitude: f64,
}

impl Default for ToneSpec {
    fn default() -> Self {
        ToneSpec {
            frequency: 440.0,
            duration: 1.0,
            amplitude: 0.5,
        }
    }
}

impl ToneSpec {
    pub fn validate(&self) -> Result<(), DiagnosticError> {
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(DiagnosticError::InvalidTone(format!(
                "frequency {} Hz must be finite and positive",
                self.frequency
            )));
        }
        if !(self.duration > 0.0 && self.duration <= MAX_TONE_SECONDS) {
            return Err(DiagnosticError::InvalidTone(format!(
                "duration {} s must be in (0, {}]",
                self.duration, MAX_TONE_SECONDS
            )));
        }
        if !(0.0..=1.0).contains(&self.amplitude) {
            return Err(DiagnosticError::InvalidTone(format!(
                "amplitude {} must be in [0, 1]",
                self.amplitude
            )));
        }
        Ok(())
    }

    pub fn synthesize(&self, sample_rate: u32) -> Result<Vec<f32>, DiagnosticError> {
        self.validate()?;
        if sample_rate == 0 {
            return Err(DiagnosticError::InvalidTone(
                "sample rate must be positive".to_string(),
            ));
        }
        let count = (sample_rate as f64 * self.duration) as usize;
        Ok((0..count)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (self.amplitude * (2.0 * PI * self.frequency * t).sin()) as f32
            })
            .collect())
    }
}

/// Write the tone as a 16-bit mono WAV file.
pub fn save_test_tone(tone: &ToneSpec, path: &Path) -> Result<(), DiagnosticError> {
    let samples: Vec<i16> = tone
        .synthesize(SAVE_SAMPLE_RATE)?
        .iter()
        .map(|&s| (s * i16::MAX as f32) as i16)
        .collect();
    let format = AudioFormat {
        sample_rate: SAVE_SAMPLE_RATE,
        channels: 1,
    };
    write_wav_file(path, &samples, format)?;
    Ok(())
}

pub fn play_test_tone(tone: &ToneSpec) -> Result<(), DiagnosticError> {
    tone.validate()?;
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(DiagnosticError::NoOutputDevice)?;
    let supported = device.default_output_config()?;
    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.into();
    debug!(
        "Playing {} Hz tone on {} ({:?}, {} channels, {} Hz)",
        tone.frequency,
        device.name()?,
        sample_format,
        config.channels,
        config.sample_rate.0
    );

    let samples = tone.synthesize(config.sample_rate.0)?;
    match sample_format {
        SampleFormat::F32 => play_samples::<f32>(&device, &config, samples),
        SampleFormat::I16 => play_samples::<i16>(&device, &config, samples),
        SampleFormat::U16 => play_samples::<u16>(&device, &config, samples),
        other => Err(DiagnosticError::UnsupportedSampleFormat(format!("{:?}", other))),
    }
}

fn play_samples<T>(
    device: &Device,
    config: &StreamConfig,
    samples: Vec<f32>,
) -> Result<(), DiagnosticError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let total = samples.len();
    let mut position = 0;
    let (done_tx, done_rx) = mpsc::channel();

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            for frame in data.chunks_mut(channels) {
                let value = T::from_sample(samples.get(position).copied().unwrap_or(0.0));
                frame.fill(value);
                position += 1;
            }
            if position >= total {
                let _ = done_tx.send(());
            }
        },
        |err| error!("Output stream error: {}", err),
        None,
    )?;
    stream.play()?;

    let timeout =
        Duration::from_secs_f64(total as f64 / config.sample_rate.0 as f64) + Duration::from_secs(2);
    done_rx
        .recv_timeout(timeout)
        .map_err(|_| DiagnosticError::Timeout(timeout))?;
    // drain the final callback buffer
    thread::sleep(Duration::from_millis(100));
    Ok(())
}
