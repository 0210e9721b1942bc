//! Caller-facing sample data and encodings.

use serde::{Deserialize, Serialize};

use super::planar::PlanarBuffer;

/// Encoding of a flat sample array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// IEEE-754 32-bit float, passed through unscaled.
    Float32,
    /// Signed 16-bit PCM.
    Int16,
}

/// One write worth of audio, tagged with its representation.
#[derive(Clone, Debug)]
pub enum SampleData {
    F32(Vec<f32>),
    I16(Vec<i16>),
    /// Native-endian raw bytes to be reinterpreted as `encoding`.
    Bytes { data: Vec<u8>, encoding: Encoding },
    /// Already-planar float channels, e.g. a decoded clip.
    Planar(PlanarBuffer),
}

impl From<Vec<f32>> for SampleData {
    fn from(samples: Vec<f32>) -> Self {
        SampleData::F32(samples)
    }
}

impl From<Vec<i16>> for SampleData {
    fn from(samples: Vec<i16>) -> Self {
        SampleData::I16(samples)
    }
}

impl From<PlanarBuffer> for SampleData {
    fn from(buffer: PlanarBuffer) -> Self {
        SampleData::Planar(buffer)
    }
}
