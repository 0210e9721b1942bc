//! The source queue between one writer and one renderer.
//!
//! Sources travel forward over an unbounded crossbeam channel. Once the
//! renderer has consumed a source it pushes it into an rtrb ring going the
//! other way, where a [`Reclaimer`] thread drops it, so sample buffers are
//! freed off the audio thread whether or not the writer is still writing.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use rtrb::{Consumer, Producer, PushError, RingBuffer};
use tracing::debug;

use super::stats::StreamState;
use crate::audio::SampleSource;

pub(crate) const RETIRE_CAPACITY: usize = 1024;
const RECLAIM_INTERVAL: Duration = Duration::from_millis(5);

pub(crate) fn source_queue(state: Arc<StreamState>) -> (QueueTx, QueueRx, Reclaimer) {
    let (sources_tx, sources_rx) = channel::unbounded();
    let (retired_tx, retired_rx) = RingBuffer::new(RETIRE_CAPACITY);
    (
        QueueTx {
            sources: sources_tx,
        },
        QueueRx {
            sources: sources_rx,
            retired: retired_tx,
            state: state.clone(),
        },
        Reclaimer {
            retired: retired_rx,
            state,
        },
    )
}

pub(crate) struct QueueTx {
    sources: Sender<SampleSource>,
}

impl QueueTx {
    /// Append a source. Hands it back if the renderer is gone.
    pub fn push(&self, source: SampleSource) -> Result<(), SampleSource> {
        self.sources.send(source).map_err(|e| e.into_inner())
    }
}

pub(crate) enum Popped {
    Source(SampleSource),
    Empty,
    /// The writer is gone and everything it sent has been popped.
    Closed,
}

pub(crate) struct QueueRx {
    sources: Receiver<SampleSource>,
    retired: Producer<SampleSource>,
    state: Arc<StreamState>,
}

impl QueueRx {
    /// Non-blocking pop from the head.
    pub fn pop(&self) -> Popped {
        match self.sources.try_recv() {
            Ok(source) => Popped::Source(source),
            Err(TryRecvError::Empty) => Popped::Empty,
            Err(TryRecvError::Disconnected) => Popped::Closed,
        }
    }

    /// Hand a consumed source to the reclaimer.
    pub fn retire(&mut self, source: SampleSource) {
        // Ring full: the reclaimer has fallen behind, drop it here.
        if let Err(PushError::Full(source)) = self.retired.push(source) {
            self.state.record_inline_drop();
            drop(source);
        }
    }
}

/// Drops consumed sources on its own thread.
pub(crate) struct Reclaimer {
    retired: Consumer<SampleSource>,
    state: Arc<StreamState>,
}

impl Reclaimer {
    /// Drop every source waiting in the ring. Returns how many.
    pub fn release(&mut self) -> usize {
        let mut released = 0;
        while self.retired.pop().is_ok() {
            released += 1;
        }
        self.state.record_reclaimed(released);
        released
    }

    /// Poll the ring until the renderer closes the stream or is dropped.
    pub fn spawn(mut self) -> JoinHandle<()> {
        std::thread::spawn(move || {
            loop {
                // Checked before the final sweep: every retire happens
                // before the renderer closes or goes away.
                let finished = self.state.renderer_closed() || self.retired.is_abandoned();
                self.release();
                if finished {
                    debug!(
                        "Reclaimer finished after {} sources",
                        self.state.snapshot().reclaimed_sources
                    );
                    break;
                }
                std::thread::sleep(RECLAIM_INTERVAL);
            }
        })
    }
}
