//! Queued sample sources.
//!
//! Every write is normalized into a [`SampleSource`], which knows its frame
//! count and how to copy any frame range into an [`AudioBlock`]. The render
//! loop only ever talks to this interface.

use super::block::AudioBlock;
use super::data::{Encoding, SampleData};
use super::planar::PlanarBuffer;
use super::sample::{PcmSample, decode_ne_bytes};
use crate::error::{Result, StreamError};

/// A flat array of typed samples in the engine's channel layout.
#[derive(Clone, Debug)]
pub struct PcmSamples<S> {
    samples: Vec<S>,
    channels: usize,
    interleaved: bool,
}

impl<S: PcmSample> PcmSamples<S> {
    /// Wrap flat samples.
    ///
    /// Returns an error if the length is not a multiple of the channel count.
    pub fn new(samples: Vec<S>, channels: usize, interleaved: bool) -> Result<Self> {
        if channels == 0 || samples.len() % channels != 0 {
            return Err(StreamError::UnsupportedFormat(format!(
                "{} samples is not a whole number of {}-channel frames",
                samples.len(),
                channels
            )));
        }
        Ok(Self {
            samples,
            channels,
            interleaved,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels
    }

    fn copy_into(
        &self,
        dest: &mut AudioBlock,
        dest_offset: usize,
        source_offset: usize,
        frames: usize,
    ) {
        let channels = self.channels.min(dest.channels());

        if self.interleaved && self.channels > 1 {
            for ch in 0..channels {
                let out = &mut dest.channel_mut(ch)[dest_offset..dest_offset + frames];
                for (i, slot) in out.iter_mut().enumerate() {
                    let idx = (source_offset + i) * self.channels + ch;
                    *slot = self.samples[idx].to_f32_normalized();
                }
            }
        } else {
            let total = self.frame_count();
            for ch in 0..channels {
                let start = ch * total + source_offset;
                S::write_normalized(
                    &self.samples[start..start + frames],
                    &mut dest.channel_mut(ch)[dest_offset..dest_offset + frames],
                );
            }
        }

        dest.silence_range(channels, dest_offset, frames);
    }
}

/// One unit of queued audio.
#[derive(Clone, Debug)]
pub enum SampleSource {
    Float(PcmSamples<f32>),
    Int16(PcmSamples<i16>),
    Planar(PlanarBuffer),
}

impl SampleSource {
    /// Pick the adapter for `data` and validate it against the engine layout.
    pub fn from_data(data: SampleData, channels: usize, interleaved: bool) -> Result<Self> {
        match data {
            SampleData::F32(samples) => {
                Ok(Self::Float(PcmSamples::new(samples, channels, interleaved)?))
            }
            SampleData::I16(samples) => {
                Ok(Self::Int16(PcmSamples::new(samples, channels, interleaved)?))
            }
            SampleData::Bytes { data, encoding } => {
                Self::from_bytes(&data, encoding, channels, interleaved)
            }
            SampleData::Planar(buffer) => {
                if buffer.channel_count() != channels {
                    return Err(StreamError::UnsupportedFormat(format!(
                        "planar buffer has {} channels, stream has {}",
                        buffer.channel_count(),
                        channels
                    )));
                }
                Ok(Self::Planar(buffer))
            }
        }
    }

    fn from_bytes(
        bytes: &[u8],
        encoding: Encoding,
        channels: usize,
        interleaved: bool,
    ) -> Result<Self> {
        let misaligned = |width: usize| {
            StreamError::UnsupportedFormat(format!(
                "{} bytes is not a whole number of {}-byte {:?} samples",
                bytes.len(),
                width,
                encoding
            ))
        };
        match encoding {
            Encoding::Float32 => {
                let samples = decode_ne_bytes::<f32>(bytes).ok_or_else(|| misaligned(f32::BYTES))?;
                Ok(Self::Float(PcmSamples::new(samples, channels, interleaved)?))
            }
            Encoding::Int16 => {
                let samples = decode_ne_bytes::<i16>(bytes).ok_or_else(|| misaligned(i16::BYTES))?;
                Ok(Self::Int16(PcmSamples::new(samples, channels, interleaved)?))
            }
        }
    }

    /// Frames available in this source.
    pub fn frame_count(&self) -> usize {
        match self {
            Self::Float(s) => s.frame_count(),
            Self::Int16(s) => s.frame_count(),
            Self::Planar(p) => p.frame_count(),
        }
    }

    /// Copy `frames` frames starting `source_offset` frames into this source to
    /// `dest` starting at `dest_offset`.
    ///
    /// Destination channels this source does not carry are silenced over the
    /// same range. Callers keep both ranges in bounds.
    pub fn copy_into(
        &self,
        dest: &mut AudioBlock,
        dest_offset: usize,
        source_offset: usize,
        frames: usize,
    ) {
        match self {
            Self::Float(s) => s.copy_into(dest, dest_offset, source_offset, frames),
            Self::Int16(s) => s.copy_into(dest, dest_offset, source_offset, frames),
            Self::Planar(p) => {
                let channels = p.channel_count().min(dest.channels());
                for ch in 0..channels {
                    dest.channel_mut(ch)[dest_offset..dest_offset + frames]
                        .copy_from_slice(&p.channel(ch)[source_offset..source_offset + frames]);
                }
                dest.silence_range(channels, dest_offset, frames);
            }
        }
    }
}
