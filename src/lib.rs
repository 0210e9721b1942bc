//! Streams heterogeneously encoded PCM buffers into a gap-free, fixed-block
//! real-time render callback.
//!
//! - [`audio`] - Sample types, format adapters and the render block
//! - [`engine`] - The source queue, render loop and drain signaling
//! - [`io`] - File decoding and device playback around the engine
//! - [`config`] / [`error`] - Construction options and error types

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;

pub use audio::{AudioBlock, Encoding, PlanarBuffer, SampleData};
pub use config::EngineConfig;
pub use engine::{BlockRenderer, DrainWatcher, PcmWriter, RenderStatus, StreamStats, pcm_stream};
pub use error::StreamError;
