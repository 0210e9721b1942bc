//! Audio data types and format adapters.
//!
//! # Data Types
//! - [`PcmSample`] - Trait for queueable sample types (i16, f32)
//! - [`SampleData`] - One caller write, tagged with its representation
//! - [`PlanarBuffer`] - Structured multi-channel float buffer
//! - [`AudioBlock`] - Planar render destination
//!
//! # Sources
//! - [`SampleSource`] - A queued write, normalized to a common copy contract

pub mod block;
pub mod data;
pub mod planar;
pub mod sample;
pub mod source;

pub use block::AudioBlock;
pub use data::{Encoding, SampleData};
pub use planar::PlanarBuffer;
pub use sample::PcmSample;
pub use source::{PcmSamples, SampleSource};
