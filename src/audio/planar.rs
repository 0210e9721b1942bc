//! Structured multi-channel buffers.
//!
//! A [`PlanarBuffer`] holds one float array per channel, the shape decoders
//! such as symphonia hand back. It is queued as-is and copied channel by
//! channel with no scaling.

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, SampleBuffer, Signal};

use crate::error::{Result, StreamError};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlanarBuffer {
    channels: Vec<Vec<f32>>,
}

impl PlanarBuffer {
    /// Create a buffer from per-channel sample arrays.
    ///
    /// Returns an error if the channels differ in length.
    pub fn new(channels: Vec<Vec<f32>>) -> Result<Self> {
        if let Some(first) = channels.first() {
            let frames = first.len();
            if let Some((idx, ch)) = channels
                .iter()
                .enumerate()
                .find(|(_, ch)| ch.len() != frames)
            {
                return Err(StreamError::UnsupportedFormat(format!(
                    "planar channel {} has {} frames, channel 0 has {}",
                    idx,
                    ch.len(),
                    frames
                )));
            }
        }
        Ok(Self { channels })
    }

    /// Split a flat planar array (channel 0 first, then channel 1, ...).
    pub fn from_flat(samples: &[f32], channel_count: usize) -> Result<Self> {
        if channel_count == 0 || samples.len() % channel_count != 0 {
            return Err(StreamError::UnsupportedFormat(format!(
                "{} samples cannot be split into {} channels",
                samples.len(),
                channel_count
            )));
        }
        let frames = samples.len() / channel_count;
        if frames == 0 {
            return Ok(Self {
                channels: vec![Vec::new(); channel_count],
            });
        }
        Ok(Self {
            channels: samples.chunks(frames).map(<[f32]>::to_vec).collect(),
        })
    }

    /// Convert any decoded symphonia buffer to planar f32 with `channel_count`
    /// channels.
    ///
    /// Missing channels wrap around the source's channels, so a mono clip fills
    /// every output channel and extra source channels are dropped.
    pub fn from_decoded(decoded: AudioBufferRef<'_>, channel_count: usize) -> Self {
        let frames = decoded.frames();
        let source_channels = decoded.spec().channels.count();
        if frames == 0 || source_channels == 0 {
            return Self {
                channels: vec![Vec::new(); channel_count],
            };
        }

        let mut converted = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        converted.copy_planar_ref(decoded);
        let samples = converted.samples();

        let channels = (0..channel_count)
            .map(|ch| {
                let start = (ch % source_channels) * frames;
                samples[start..start + frames].to_vec()
            })
            .collect();
        Self { channels }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Frames per channel.
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn channel(&self, idx: usize) -> &[f32] {
        &self.channels[idx]
    }
}

impl From<&AudioBuffer<f32>> for PlanarBuffer {
    fn from(buffer: &AudioBuffer<f32>) -> Self {
        let channels = (0..buffer.spec().channels.count())
            .map(|ch| buffer.chan(ch).to_vec())
            .collect();
        Self { channels }
    }
}
