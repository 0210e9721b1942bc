//! The render loop.
//!
//! [`BlockRenderer::render`] is called once per audio callback. It never
//! blocks, never logs and never fails: whatever the queue cannot supply is
//! filled with silence.

use std::sync::Arc;

use super::drain::DrainSignal;
use super::queue::{Popped, QueueRx};
use super::stats::{StreamState, StreamStats};
use crate::audio::{AudioBlock, SampleSource};
use crate::config::EngineConfig;

/// Outcome of one render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// The whole block is real audio.
    Playing,
    /// The queue ran dry; the block ends in silence.
    Underrun,
    /// The queue emptied after a drain request. The block ends in silence
    /// and the drained notification has been sent.
    Drained,
    /// The stream drained on an earlier call. The block was not touched.
    Closed,
}

/// The source currently being played and how far into it we are.
struct Cursor {
    source: SampleSource,
    offset: usize,
}

/// Consumer side of a stream, owned by the audio callback.
pub struct BlockRenderer {
    queue: QueueRx,
    state: Arc<StreamState>,
    signal: DrainSignal,
    channels: usize,
    block_length: usize,
    cursor: Option<Cursor>,
    closed: bool,
}

impl BlockRenderer {
    pub(crate) fn new(
        queue: QueueRx,
        state: Arc<StreamState>,
        signal: DrainSignal,
        config: &EngineConfig,
    ) -> Self {
        Self {
            queue,
            state,
            signal,
            channels: config.channel_count,
            block_length: config.effective_block_length(),
            cursor: None,
            closed: false,
        }
    }

    /// Allocate a silent block sized for this stream.
    pub fn block(&self) -> AudioBlock {
        AudioBlock::new(self.channels, self.block_length)
    }

    pub fn channel_count(&self) -> usize {
        self.channels
    }

    pub fn block_length(&self) -> usize {
        self.block_length
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn stats(&self) -> StreamStats {
        self.state.snapshot()
    }

    /// Fill `block` from the queue.
    pub fn render(&mut self, block: &mut AudioBlock) -> RenderStatus {
        if self.closed {
            return RenderStatus::Closed;
        }

        let block_length = block.frames();
        let mut output_offset = 0;
        let mut rendered = 0;
        let mut status = RenderStatus::Playing;

        while output_offset < block_length {
            let mut cursor = match self.cursor.take() {
                Some(cursor) => cursor,
                None => {
                    // Read the flag before polling: every write the writer made
                    // before requesting the drain is then visible to the poll.
                    let drain_requested = self.state.drain_requested();
                    match self.queue.pop() {
                        Popped::Source(source) => Cursor { source, offset: 0 },
                        popped => {
                            block.silence_from(0, output_offset);
                            if drain_requested || matches!(popped, Popped::Closed) {
                                self.closed = true;
                                self.state.mark_renderer_closed();
                                self.signal.notify();
                                status = RenderStatus::Drained;
                            } else {
                                self.state.record_underrun();
                                status = RenderStatus::Underrun;
                            }
                            break;
                        }
                    }
                }
            };

            let frame_count = cursor.source.frame_count();
            let n = (block_length - output_offset).min(frame_count - cursor.offset);
            cursor
                .source
                .copy_into(block, output_offset, cursor.offset, n);
            cursor.offset += n;
            output_offset += n;
            rendered += n;

            if cursor.offset >= frame_count {
                self.queue.retire(cursor.source);
            } else {
                self.cursor = Some(cursor);
            }
        }

        block.silence_from(self.channels, 0);
        self.state.record_rendered(rendered);
        status
    }
}

impl Drop for BlockRenderer {
    fn drop(&mut self) {
        self.state.mark_renderer_dropped();
    }
}
