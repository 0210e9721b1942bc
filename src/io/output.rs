//! Speaker playback using cpal.
//!
//! [`DeviceOutput`] is the host side of the render contract: each device
//! callback is served from fixed-size planar blocks produced by a
//! [`BlockRenderer`], interleaved and converted to the device sample format.

use anyhow::{Context, Result, bail};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleFormat, Stream, StreamConfig};
use dasp_sample::FromSample;
use tracing::{debug, error, info, warn};

use crate::engine::{BlockRenderer, RenderStatus};

fn get_output_device(device_name: Option<&str>) -> Result<Device> {
    let host = cpal::default_host();
    match device_name {
        Some(name) => host
            .output_devices()
            .context("Failed to enumerate output devices")?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .with_context(|| format!("Output device {name:?} not found")),
        None => host
            .default_output_device()
            .context("No default output device available"),
    }
}

/// Plays a stream on an output device.
pub struct DeviceOutput {
    device_name: Option<String>,
}

impl DeviceOutput {
    /// `None` selects the host's default output device.
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }

    /// Build and start the output stream. Playback stops when the returned
    /// stream is dropped.
    pub fn start(self, renderer: BlockRenderer) -> Result<Stream> {
        let device = get_output_device(self.device_name.as_deref())?;
        info!(
            "Using output device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported = device
            .default_output_config()
            .context("Failed to get default output config")?;
        debug!("Output config: {supported:#?}");

        let block_length = renderer.block_length() as u32;
        let config = StreamConfig {
            channels: renderer.channel_count() as u16,
            sample_rate: supported.sample_rate(),
            buffer_size: match supported.buffer_size() {
                cpal::SupportedBufferSize::Range { min, max } => {
                    let size = block_length.clamp(*min, *max);
                    debug!(
                        "Using output buffer size: {} (min={}, max={})",
                        size, min, max
                    );
                    BufferSize::Fixed(size)
                }
                cpal::SupportedBufferSize::Unknown => {
                    warn!("Supported buffer size range unknown, using default");
                    BufferSize::Default
                }
            },
        };

        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_output_stream::<f32>(&device, &config, renderer)?,
            SampleFormat::I16 => build_output_stream::<i16>(&device, &config, renderer)?,
            SampleFormat::U16 => build_output_stream::<u16>(&device, &config, renderer)?,
            format => bail!("Unsupported sample format: {:?}", format),
        };

        stream.play().context("Failed to play stream")?;
        info!("Audio playback started");
        Ok(stream)
    }
}

fn build_output_stream<T>(
    device: &Device,
    config: &StreamConfig,
    mut renderer: BlockRenderer,
) -> Result<Stream>
where
    T: cpal::SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut block = renderer.block();
    // Start exhausted so the first callback renders a fresh block.
    let mut position = block.frames();

    debug!("Building output stream");
    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let total = data.len() / channels;
                let mut written = 0;
                while written < total {
                    if position >= block.frames() {
                        if renderer.render(&mut block) == RenderStatus::Closed {
                            block.silence_from(0, 0);
                        }
                        position = 0;
                    }
                    let n = block.write_interleaved(
                        position,
                        &mut data[written * channels..],
                        channels,
                        T::EQUILIBRIUM,
                        T::from_sample,
                    );
                    position += n;
                    written += n;
                }
            },
            |err| error!("An error occurred on the output audio stream: {}", err),
            None,
        )
        .context("Failed to build output stream")?;

    Ok(stream)
}
