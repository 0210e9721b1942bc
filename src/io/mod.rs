//! Host-side plumbing around the engine.
//!
//! - [`AudioFileReader`] - Decodes media files with symphonia and feeds a [`PcmWriter`](crate::PcmWriter)
//! - [`DeviceOutput`] - Speaker playback via cpal, driving a [`BlockRenderer`](crate::BlockRenderer)
//!   (feature `device`)

pub mod file;
#[cfg(feature = "device")]
pub mod output;

pub use file::{AudioFileInfo, AudioFileReader};
#[cfg(feature = "device")]
pub use output::DeviceOutput;
