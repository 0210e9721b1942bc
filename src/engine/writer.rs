//! Producer side of a stream.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::queue::QueueTx;
use super::stats::{StreamState, StreamStats};
use crate::audio::{Encoding, SampleData, SampleSource};
use crate::config::EngineConfig;
use crate::error::{Result, StreamError};

/// Accepts writes from a single producer and queues them for the renderer.
///
/// Dropping the writer counts as a drain request.
pub struct PcmWriter {
    queue: QueueTx,
    state: Arc<StreamState>,
    channels: usize,
    interleaved: bool,
    default_encoding: Encoding,
    max_queued_frames: Option<usize>,
}

impl PcmWriter {
    pub(crate) fn new(queue: QueueTx, state: Arc<StreamState>, config: &EngineConfig) -> Self {
        Self {
            queue,
            state,
            channels: config.channel_count,
            interleaved: config.interleaved,
            default_encoding: config.default_encoding,
            max_queued_frames: config.max_queued_frames,
        }
    }

    /// Queue one buffer of audio.
    ///
    /// On error nothing is queued. Empty writes succeed and queue nothing.
    pub fn write(&mut self, data: impl Into<SampleData>) -> Result<()> {
        if self.state.drain_requested() {
            return Err(StreamError::Ended);
        }

        let source = SampleSource::from_data(data.into(), self.channels, self.interleaved)?;
        let frames = source.frame_count();
        if frames == 0 {
            debug!("Ignoring empty write");
            return Ok(());
        }

        if let Some(limit) = self.max_queued_frames {
            if !self.has_room_for(frames) {
                return Err(StreamError::QueueFull {
                    queued: self.state.queued_frames(),
                    limit,
                });
            }
        }

        self.state.record_enqueued(frames);
        if self.queue.push(source).is_err() {
            self.state.forget_enqueued(frames);
            warn!("Renderer dropped, discarding write of {} frames", frames);
            return Err(StreamError::Disconnected);
        }
        Ok(())
    }

    /// Queue native-endian bytes in the configured default encoding.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_bytes_as(bytes, self.default_encoding)
    }

    /// Queue native-endian bytes in an explicit encoding.
    pub fn write_bytes_as(&mut self, bytes: &[u8], encoding: Encoding) -> Result<()> {
        self.write(SampleData::Bytes {
            data: bytes.to_vec(),
            encoding,
        })
    }

    /// Signal that no more data will be written. Idempotent.
    ///
    /// Already queued audio still plays out before the stream drains.
    pub fn request_drain(&self) {
        if self.state.request_drain() {
            info!(
                "Drain requested with {} frames queued",
                self.state.queued_frames()
            );
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels
    }

    pub fn is_draining(&self) -> bool {
        self.state.drain_requested()
    }

    /// Frames written but not yet rendered.
    pub fn queued_frames(&self) -> usize {
        self.state.queued_frames()
    }

    /// Whether a write of `frames` would pass the queue limit right now.
    ///
    /// A lone oversized write is still accepted into an empty queue.
    pub fn has_room_for(&self, frames: usize) -> bool {
        match self.max_queued_frames {
            Some(limit) => {
                let queued = self.state.queued_frames();
                queued == 0 || queued + frames <= limit
            }
            None => true,
        }
    }

    /// True once the renderer has been dropped.
    pub fn is_disconnected(&self) -> bool {
        self.state.renderer_dropped()
    }

    pub fn stats(&self) -> StreamStats {
        self.state.snapshot()
    }
}

impl Drop for PcmWriter {
    fn drop(&mut self) {
        self.request_drain();
    }
}
