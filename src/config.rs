//! Configuration for a PCM stream engine.

use serde::{Deserialize, Serialize};

use crate::audio::Encoding;
use crate::error::{Result, StreamError};

pub const MAX_CHANNELS: usize = 32;
pub const MAX_BLOCK_LENGTH: usize = 16384;
/// Block length used when the host leaves `block_length` unset.
pub const DEFAULT_BLOCK_LENGTH: usize = 256;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub channel_count: usize,
    /// Layout of flat typed writes. Planar buffers ignore this.
    pub interleaved: bool,
    /// Frames per render block. `None` lets the host pick.
    pub block_length: Option<usize>,
    /// Encoding assumed for untagged byte writes.
    pub default_encoding: Encoding,
    /// Reject writes once this many frames are queued. `None` is unbounded.
    pub max_queued_frames: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            channel_count: 1,
            interleaved: true,
            block_length: None,
            default_encoding: Encoding::Float32,
            max_queued_frames: None,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.channel_count == 0 || self.channel_count > MAX_CHANNELS {
            return Err(StreamError::Configuration(format!(
                "channel_count must be between 1 and {}, got {}",
                MAX_CHANNELS, self.channel_count
            )));
        }

        if let Some(len) = self.block_length {
            if !len.is_power_of_two() || len > MAX_BLOCK_LENGTH {
                return Err(StreamError::Configuration(format!(
                    "block_length must be a power of two no larger than {}, got {}",
                    MAX_BLOCK_LENGTH, len
                )));
            }
        }

        if self.max_queued_frames == Some(0) {
            return Err(StreamError::Configuration(
                "max_queued_frames must be positive when set".to_string(),
            ));
        }

        Ok(())
    }

    /// The block length a host should render with.
    pub fn effective_block_length(&self) -> usize {
        self.block_length.unwrap_or(DEFAULT_BLOCK_LENGTH)
    }
}
