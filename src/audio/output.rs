//! Audio device output.
//!
//! The device callback runs on the audio driver's thread at hardware rate and
//! reads the stream cursor under the same lock the transport seeks under.

use super::{AudioError, SharedStream};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, StreamConfig};

/// The default output device's preferred (channels, sample rate).
///
/// Extracting audio in this format lets the output stream open without
/// resampling.
pub fn device_format() -> Result<(u16, u32), AudioError> {
    let device = cpal::default_host()
        .default_output_device()
        .ok_or(AudioError::NoDevice)?;
    let config = device.default_output_config()?;
    Ok((config.channels(), config.sample_rate().0))
}

/// A running output stream. Playback stops when this is dropped.
pub struct AudioOutput {
    _stream: cpal::Stream,
}

impl AudioOutput {
    /// Open the default output device and start playing `stream`.
    pub fn start(stream: &SharedStream) -> Result<Self, AudioError> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or(AudioError::NoDevice)?;
        let format = device.default_output_config()?.sample_format();

        let config = StreamConfig {
            channels: stream.channels(),
            sample_rate: cpal::SampleRate(stream.sample_rate()),
            buffer_size: cpal::BufferSize::Default,
        };

        let output = match format {
            SampleFormat::F32 => build::<f32>(&device, &config, stream.clone())?,
            SampleFormat::I16 => build::<i16>(&device, &config, stream.clone())?,
            SampleFormat::U16 => build::<u16>(&device, &config, stream.clone())?,
            SampleFormat::I32 => build::<i32>(&device, &config, stream.clone())?,
            other => return Err(AudioError::UnsupportedSampleFormat(other)),
        };
        output.play()?;

        tracing::info!(
            channels = config.channels,
            sample_rate = config.sample_rate.0,
            ?format,
            "audio output started"
        );
        Ok(Self { _stream: output })
    }
}

fn build<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    stream: SharedStream,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample + FromSample<f32>,
{
    // grows to the driver's buffer size once, then reused
    let mut scratch: Vec<f32> = Vec::new();

    let output = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            scratch.resize(data.len(), 0.0);
            match stream.lock() {
                Ok(mut pcm) => pcm.fill(&mut scratch),
                Err(_) => scratch.fill(0.0),
            }
            for (out, sample) in data.iter_mut().zip(&scratch) {
                *out = T::from_sample(*sample);
            }
        },
        |err| tracing::warn!(error = %err, "audio output stream error"),
        None,
    )?;
    Ok(output)
}
