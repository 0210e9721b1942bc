use std::fmt::Debug;

use num_traits::{Bounded, ToPrimitive};

/// A PCM sample type that can be queued and normalized to `f32`.
pub trait PcmSample: Copy + Send + Sync + ToPrimitive + Bounded + Debug + 'static {
    /// Width of one sample in bytes.
    const BYTES: usize;

    /// Normalize to the `[-1.0, 1.0]` range.
    fn to_f32_normalized(self) -> f32;

    /// Decode one native-endian sample. `bytes.len()` is exactly `Self::BYTES`.
    fn from_ne_bytes(bytes: &[u8]) -> Self;

    /// Normalize a contiguous run. `src` and `dst` have equal length.
    fn write_normalized(src: &[Self], dst: &mut [f32]) {
        for (out, sample) in dst.iter_mut().zip(src) {
            *out = sample.to_f32_normalized();
        }
    }
}

impl PcmSample for f32 {
    const BYTES: usize = 4;

    fn to_f32_normalized(self) -> f32 {
        self
    }

    fn from_ne_bytes(bytes: &[u8]) -> Self {
        f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn write_normalized(src: &[Self], dst: &mut [f32]) {
        dst.copy_from_slice(src);
    }
}

impl PcmSample for i16 {
    const BYTES: usize = 2;

    fn to_f32_normalized(self) -> f32 {
        normalize_signed(self)
    }

    fn from_ne_bytes(bytes: &[u8]) -> Self {
        i16::from_ne_bytes([bytes[0], bytes[1]])
    }
}

/// Scale a signed integer sample into `[-1.0, 1.0]`.
///
/// Positive values divide by the type's max and the rest by the magnitude of
/// its min, so both extremes land exactly on the unit range.
fn normalize_signed<S: PcmSample>(sample: S) -> f32 {
    let value = sample.to_f32().unwrap_or_default();
    let bound = if value > 0.0 {
        S::max_value()
    } else {
        S::min_value()
    };
    match bound.to_f32() {
        Some(bound) if bound != 0.0 => value / bound.abs(),
        _ => 0.0,
    }
}

/// Reinterpret a native-endian byte buffer as samples.
///
/// Returns `None` if the length is not a whole number of samples.
pub fn decode_ne_bytes<S: PcmSample>(bytes: &[u8]) -> Option<Vec<S>> {
    if bytes.len() % S::BYTES != 0 {
        return None;
    }
    Some(bytes.chunks_exact(S::BYTES).map(S::from_ne_bytes).collect())
}
