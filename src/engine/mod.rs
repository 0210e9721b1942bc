//! The buffer-queue engine.
//!
//! [`pcm_stream`] builds the three handles of a stream:
//!
//! - [`PcmWriter`] - producer side, validates and queues writes
//! - [`BlockRenderer`] - consumer side, fills fixed-size blocks from the audio callback
//! - [`DrainWatcher`] - observes the one-shot drained notification
//!
//! A background reclaimer thread frees consumed sources so the audio
//! callback never deallocates sample buffers.
//!
//! ```ignore
//! let (mut writer, mut renderer, watcher) = pcm_stream(EngineConfig::default())?;
//! writer.write(vec![0.0f32; 512])?;
//! writer.request_drain();
//!
//! let mut block = renderer.block();
//! while renderer.render(&mut block) != RenderStatus::Drained {}
//! assert!(watcher.is_drained());
//! ```

pub mod drain;
pub mod queue;
pub mod render;
pub mod stats;
pub mod writer;

use std::sync::Arc;

use tracing::info;

pub use drain::DrainWatcher;
pub use render::{BlockRenderer, RenderStatus};
pub use stats::StreamStats;
pub use writer::PcmWriter;

use crate::config::EngineConfig;
use crate::error::Result;

/// Create a stream from `config`.
///
/// Fails with [`StreamError::Configuration`](crate::StreamError::Configuration)
/// before anything is allocated if the config is invalid.
pub fn pcm_stream(config: EngineConfig) -> Result<(PcmWriter, BlockRenderer, DrainWatcher)> {
    config.validate()?;

    let state = Arc::new(stats::StreamState::default());
    let (queue_tx, queue_rx, reclaimer) = queue::source_queue(state.clone());
    let (signal, watcher) = drain::drain_signal();
    // Detached; it exits once the renderer drains or is dropped.
    reclaimer.spawn();

    let writer = PcmWriter::new(queue_tx, state.clone(), &config);
    let renderer = BlockRenderer::new(queue_rx, state, signal, &config);

    info!(
        "PCM stream created: {} channels, {}, block length {}",
        config.channel_count,
        if config.interleaved { "interleaved" } else { "planar" },
        config.effective_block_length()
    );

    Ok((writer, renderer, watcher))
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::audio::{AudioBlock, Encoding, PlanarBuffer, SampleData};
    use crate::error::StreamError;

    fn stream(
        channels: usize,
        interleaved: bool,
        block: usize,
    ) -> (PcmWriter, BlockRenderer, DrainWatcher) {
        pcm_stream(EngineConfig {
            channel_count: channels,
            interleaved,
            block_length: Some(block),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = pcm_stream(EngineConfig {
            channel_count: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(StreamError::Configuration(_))));
    }

    #[test]
    fn test_silence_without_writes() {
        let (_writer, mut renderer, watcher) = stream(2, true, 8);
        let mut block = renderer.block();
        block.channel_mut(0).fill(1.0);

        for _ in 0..3 {
            assert_eq!(renderer.render(&mut block), RenderStatus::Underrun);
            assert!(block.data().iter().all(|&s| s == 0.0));
        }
        assert!(!watcher.is_drained());
        assert_eq!(renderer.stats().underrun_blocks, 3);
    }

    #[test]
    fn test_source_spans_blocks() {
        let (mut writer, mut renderer, _watcher) = stream(1, true, 4);
        writer.write((0..6).map(|v| v as f32).collect::<Vec<_>>()).unwrap();

        let mut block = renderer.block();
        assert_eq!(renderer.render(&mut block), RenderStatus::Playing);
        assert_eq!(block.channel(0), &[0.0, 1.0, 2.0, 3.0]);

        assert_eq!(renderer.render(&mut block), RenderStatus::Underrun);
        assert_eq!(block.channel(0), &[4.0, 5.0, 0.0, 0.0]);
    }

    #[test]
    fn test_multiple_sources_in_one_block() {
        let (mut writer, mut renderer, _watcher) = stream(2, true, 8);
        writer.write(vec![1.0f32, -1.0]).unwrap();
        writer.write(vec![0i16, 32767, -32768, 0]).unwrap();
        writer
            .write(PlanarBuffer::new(vec![vec![0.5, 0.25], vec![-0.5, -0.25]]).unwrap())
            .unwrap();

        let mut block = renderer.block();
        assert_eq!(renderer.render(&mut block), RenderStatus::Underrun);
        assert_eq!(block.channel(0), &[1.0, 0.0, -1.0, 0.5, 0.25, 0.0, 0.0, 0.0]);
        assert_eq!(block.channel(1), &[-1.0, 1.0, 0.0, -0.5, -0.25, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_drain_fires_once_after_queue_empties() {
        let (mut writer, mut renderer, watcher) = stream(1, true, 4);
        writer.write(vec![0.5f32; 6]).unwrap();
        writer.request_drain();
        writer.request_drain();

        let mut block = renderer.block();
        assert_eq!(renderer.render(&mut block), RenderStatus::Playing);
        assert!(!watcher.is_drained());

        assert_eq!(renderer.render(&mut block), RenderStatus::Drained);
        assert_eq!(block.channel(0), &[0.5, 0.5, 0.0, 0.0]);
        assert!(watcher.is_drained());
        assert!(renderer.is_closed());

        block.channel_mut(0).fill(7.0);
        assert_eq!(renderer.render(&mut block), RenderStatus::Closed);
        assert_eq!(block.channel(0), &[7.0; 4]);
    }

    #[test]
    fn test_dropping_writer_drains() {
        let (mut writer, mut renderer, watcher) = stream(1, true, 4);
        writer.write(vec![0.25f32; 2]).unwrap();
        drop(writer);

        let mut block = renderer.block();
        assert_eq!(renderer.render(&mut block), RenderStatus::Drained);
        assert_eq!(block.channel(0), &[0.25, 0.25, 0.0, 0.0]);
        assert!(watcher.wait());
    }

    #[test]
    fn test_write_after_drain_fails() {
        let (mut writer, _renderer, _watcher) = stream(1, true, 4);
        writer.request_drain();
        assert!(writer.is_draining());
        assert!(matches!(writer.write(vec![0.0f32; 4]), Err(StreamError::Ended)));
        assert_eq!(writer.queued_frames(), 0);
    }

    #[test]
    fn test_write_after_renderer_dropped() {
        let (mut writer, renderer, _watcher) = stream(1, true, 4);
        drop(renderer);
        assert!(matches!(
            writer.write(vec![0.0f32; 4]),
            Err(StreamError::Disconnected)
        ));
        assert_eq!(writer.queued_frames(), 0);
    }

    #[test]
    fn test_invalid_write_leaves_queue_untouched() {
        let (mut writer, mut renderer, _watcher) = stream(2, true, 4);
        writer.write(vec![1.0f32, 2.0]).unwrap();
        assert!(writer.write(vec![3.0f32, 4.0, 5.0]).is_err());
        assert!(writer.write_bytes(&[0, 0, 0]).is_err());
        assert_eq!(writer.queued_frames(), 1);

        let mut block = renderer.block();
        renderer.render(&mut block);
        assert_eq!(block.channel(0), &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(block.channel(1), &[2.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_empty_write_contributes_nothing() {
        let (mut writer, mut renderer, _watcher) = stream(1, true, 4);
        writer.write(vec![1.0f32]).unwrap();
        writer.write(Vec::<f32>::new()).unwrap();
        writer.write(Vec::<i16>::new()).unwrap();
        writer.write_bytes(&[]).unwrap();
        writer.write(vec![2.0f32]).unwrap();

        let mut block = renderer.block();
        renderer.render(&mut block);
        assert_eq!(block.channel(0), &[1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_write_bytes_uses_default_encoding() {
        let (mut writer, mut renderer, _watcher) = pcm_stream(EngineConfig {
            block_length: Some(2),
            default_encoding: Encoding::Int16,
            ..Default::default()
        })
        .unwrap();

        let bytes: Vec<u8> = [i16::MIN, i16::MAX]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect();
        writer.write_bytes(&bytes).unwrap();

        let mut block = renderer.block();
        renderer.render(&mut block);
        assert_eq!(block.channel(0), &[-1.0, 1.0]);
    }

    #[test]
    fn test_queue_limit() {
        let (mut writer, mut renderer, _watcher) = pcm_stream(EngineConfig {
            block_length: Some(4),
            max_queued_frames: Some(6),
            ..Default::default()
        })
        .unwrap();

        writer.write(vec![0.0f32; 4]).unwrap();
        assert!(matches!(
            writer.write(vec![0.0f32; 4]),
            Err(StreamError::QueueFull { queued: 4, limit: 6 })
        ));
        writer.write(vec![0.0f32; 2]).unwrap();

        let mut block = renderer.block();
        renderer.render(&mut block);
        assert_eq!(writer.queued_frames(), 2);
        writer.write(vec![0.0f32; 4]).unwrap();
    }

    #[test]
    fn test_oversized_write_into_empty_queue() {
        let (mut writer, _renderer, _watcher) = pcm_stream(EngineConfig {
            max_queued_frames: Some(4),
            ..Default::default()
        })
        .unwrap();
        writer.write(vec![0.0f32; 16]).unwrap();
        assert_eq!(writer.queued_frames(), 16);
    }

    #[test]
    fn test_stats_track_frames() {
        let (mut writer, mut renderer, _watcher) = stream(2, false, 4);
        writer.write(SampleData::F32(vec![0.0; 12])).unwrap();
        assert_eq!(writer.stats().queued_frames, 6);

        let mut block = renderer.block();
        renderer.render(&mut block);
        renderer.render(&mut block);

        let stats = writer.stats();
        assert_eq!(stats.queued_frames, 0);
        assert_eq!(stats.frames_rendered, 6);
        assert_eq!(stats.underrun_blocks, 1);
    }

    #[test]
    fn test_block_wider_than_stream() {
        let (mut writer, mut renderer, _watcher) = stream(1, true, 2);
        writer.write(vec![0.5f32, 0.5]).unwrap();

        let mut block = AudioBlock::new(2, 2);
        block.channel_mut(1).fill(3.0);
        renderer.render(&mut block);
        assert_eq!(block.channel(0), &[0.5, 0.5]);
        assert_eq!(block.channel(1), &[0.0, 0.0]);
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "timed out waiting for condition");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_consumed_sources_reclaimed_without_further_writes() {
        let total = queue::RETIRE_CAPACITY + 100;
        let (mut writer, mut renderer, watcher) = stream(1, true, 4);
        for _ in 0..total {
            writer.write(vec![0.5f32; 4]).unwrap();
        }
        writer.request_drain();

        // One source per block. Pause between batches so the reclaimer can
        // keep up; the writer is never called again.
        let mut block = renderer.block();
        let mut rendered = 0;
        while rendered < total {
            let batch = (total - rendered).min(queue::RETIRE_CAPACITY / 4);
            for _ in 0..batch {
                assert_eq!(renderer.render(&mut block), RenderStatus::Playing);
            }
            rendered += batch;
            wait_until(|| renderer.stats().reclaimed_sources == rendered as u64);
        }

        assert_eq!(renderer.render(&mut block), RenderStatus::Drained);
        assert!(watcher.is_drained());

        let stats = writer.stats();
        assert_eq!(stats.reclaimed_sources, total as u64);
        assert_eq!(stats.inline_drops, 0);
    }

    #[test]
    fn test_handles_are_thread_safe() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<PcmWriter>();
        assert_sync::<PcmWriter>();
        assert_send::<BlockRenderer>();
        assert_send::<DrainWatcher>();
        assert_sync::<DrainWatcher>();
    }
}
