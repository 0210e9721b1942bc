//! State shared between the writer and the renderer.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Point-in-time counters for a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Frames written but not yet rendered.
    pub queued_frames: usize,
    /// Frames of real audio emitted by the renderer.
    pub frames_rendered: u64,
    /// Blocks padded with silence because the queue ran dry before a drain.
    pub underrun_blocks: u64,
    /// Consumed sources freed by the reclaimer thread.
    pub reclaimed_sources: u64,
    /// Consumed sources the renderer had to free itself because the
    /// reclaimer fell behind.
    pub inline_drops: u64,
}

#[derive(Default)]
pub(crate) struct StreamState {
    drain_requested: AtomicBool,
    renderer_dropped: AtomicBool,
    renderer_closed: AtomicBool,
    queued_frames: AtomicUsize,
    frames_rendered: AtomicU64,
    underrun_blocks: AtomicU64,
    reclaimed_sources: AtomicU64,
    inline_drops: AtomicU64,
}

impl StreamState {
    /// Returns true if this call made the request.
    pub fn request_drain(&self) -> bool {
        !self.drain_requested.swap(true, Ordering::AcqRel)
    }

    pub fn drain_requested(&self) -> bool {
        self.drain_requested.load(Ordering::Acquire)
    }

    pub fn mark_renderer_dropped(&self) {
        self.renderer_dropped.store(true, Ordering::Release);
    }

    pub fn renderer_dropped(&self) -> bool {
        self.renderer_dropped.load(Ordering::Acquire)
    }

    /// Set once the renderer has drained; nothing is retired after this.
    pub fn mark_renderer_closed(&self) {
        self.renderer_closed.store(true, Ordering::Release);
    }

    pub fn renderer_closed(&self) -> bool {
        self.renderer_closed.load(Ordering::Acquire)
    }

    pub fn queued_frames(&self) -> usize {
        self.queued_frames.load(Ordering::Relaxed)
    }

    pub fn record_enqueued(&self, frames: usize) {
        self.queued_frames.fetch_add(frames, Ordering::Relaxed);
    }

    /// Undo `record_enqueued` for a write that never reached the queue.
    pub fn forget_enqueued(&self, frames: usize) {
        self.queued_frames.fetch_sub(frames, Ordering::Relaxed);
    }

    pub fn record_rendered(&self, frames: usize) {
        if frames == 0 {
            return;
        }
        self.queued_frames.fetch_sub(frames, Ordering::Relaxed);
        self.frames_rendered
            .fetch_add(frames as u64, Ordering::Relaxed);
    }

    pub fn record_underrun(&self) {
        self.underrun_blocks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reclaimed(&self, sources: usize) {
        if sources > 0 {
            self.reclaimed_sources
                .fetch_add(sources as u64, Ordering::Relaxed);
        }
    }

    pub fn record_inline_drop(&self) {
        self.inline_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StreamStats {
        StreamStats {
            queued_frames: self.queued_frames(),
            frames_rendered: self.frames_rendered.load(Ordering::Relaxed),
            underrun_blocks: self.underrun_blocks.load(Ordering::Relaxed),
            reclaimed_sources: self.reclaimed_sources.load(Ordering::Relaxed),
            inline_drops: self.inline_drops.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_request_reports_first_caller() {
        let state = StreamState::default();
        assert!(!state.drain_requested());
        assert!(state.request_drain());
        assert!(!state.request_drain());
        assert!(state.drain_requested());
    }

    #[test]
    fn test_counters() {
        let state = StreamState::default();
        state.record_enqueued(100);
        state.record_rendered(40);
        state.record_rendered(0);
        state.record_underrun();
        state.record_reclaimed(3);
        state.record_inline_drop();

        assert_eq!(
            state.snapshot(),
            StreamStats {
                queued_frames: 60,
                frames_rendered: 40,
                underrun_blocks: 1,
                reclaimed_sources: 3,
                inline_drops: 1,
            }
        );
    }
}
