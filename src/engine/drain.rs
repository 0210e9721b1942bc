//! One-shot "drained" notification from the render thread.
//!
//! The renderer side only flips an atomic and does a non-blocking send into a
//! one-slot channel. Observers wait on the [`DrainWatcher`] from ordinary
//! threads, so no observer code ever runs inside the audio callback.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use tracing::debug;

pub(crate) fn drain_signal() -> (DrainSignal, DrainWatcher) {
    let drained = Arc::new(AtomicBool::new(false));
    let (tx, rx) = channel::bounded(1);
    (
        DrainSignal {
            drained: drained.clone(),
            tx,
        },
        DrainWatcher { drained, rx },
    )
}

pub(crate) struct DrainSignal {
    drained: Arc<AtomicBool>,
    tx: Sender<()>,
}

impl DrainSignal {
    /// Mark the stream drained. Only the first call has any effect.
    pub fn notify(&self) {
        if !self.drained.swap(true, Ordering::AcqRel) {
            let _ = self.tx.try_send(());
        }
    }
}

/// Observes the terminal drained notification of a stream.
pub struct DrainWatcher {
    drained: Arc<AtomicBool>,
    rx: Receiver<()>,
}

impl DrainWatcher {
    pub fn is_drained(&self) -> bool {
        self.drained.load(Ordering::Acquire)
    }

    /// Block until the stream drains.
    ///
    /// Returns `false` if the renderer was dropped before draining.
    pub fn wait(&self) -> bool {
        if self.is_drained() {
            return true;
        }
        self.rx.recv().is_ok() || self.is_drained()
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_drained() {
            return true;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(()) => true,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                self.is_drained()
            }
        }
    }

    /// Run `callback` once on a separate thread after the stream drains.
    ///
    /// The callback is skipped if the renderer is dropped without draining.
    pub fn on_drained<F>(self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce() + Send + 'static,
    {
        std::thread::spawn(move || {
            if self.wait() {
                callback();
            } else {
                debug!("Renderer dropped before draining, skipping drain callback");
            }
        })
    }
}
