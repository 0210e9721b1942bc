use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{error, info};

use pcm_queue::io::AudioFileReader;
use pcm_queue::{BlockRenderer, DrainWatcher, EngineConfig, pcm_stream};

fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    if let Err(e) = run() {
        error!("Application error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<PathBuf>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig {
            channel_count: 2,
            ..Default::default()
        });
    };
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    Ok(EngineConfig::from_json(&json)?)
}

fn run() -> Result<()> {
    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let Some(file) = args.next() else {
        bail!("Usage: pcm-queue <audio file> [config.json]");
    };
    let config = load_config(args.next())?;

    let reader = AudioFileReader::open(&file)?;
    let sample_rate = reader.info.sample_rate;
    let (mut writer, renderer, watcher) = pcm_stream(config)?;

    // The decoder feeds the queue from its own thread, like any producer would.
    let producer = std::thread::spawn(move || -> Result<usize> {
        let frames = reader.stream_into(&mut writer)?;
        writer.request_drain();
        Ok(frames)
    });

    play(renderer, &watcher, sample_rate)?;

    let frames = producer
        .join()
        .map_err(|_| anyhow!("Decoder thread panicked"))??;
    info!(
        "Drained after {} frames ({:.2}s)",
        frames,
        frames as f64 / sample_rate as f64
    );
    Ok(())
}

/// Play through the default output device until the stream drains.
#[cfg(feature = "device")]
fn play(renderer: BlockRenderer, watcher: &DrainWatcher, _sample_rate: u32) -> Result<()> {
    let stream = pcm_queue::io::DeviceOutput::new(None).start(renderer)?;
    if !watcher.wait() {
        bail!("Renderer stopped before the stream drained");
    }
    drop(stream);
    info!("Audio playback stopped");
    Ok(())
}

/// Render offline as fast as possible, logging once per second of audio.
#[cfg(not(feature = "device"))]
fn play(mut renderer: BlockRenderer, watcher: &DrainWatcher, sample_rate: u32) -> Result<()> {
    use pcm_queue::RenderStatus;

    let mut block = renderer.block();
    let mut peak = 0.0f32;
    let mut next_report = u64::from(sample_rate);

    loop {
        let status = renderer.render(&mut block);
        peak = block.data().iter().fold(peak, |p, s| p.max(s.abs()));

        let stats = renderer.stats();
        if stats.frames_rendered >= next_report {
            info!(
                "Rendered {:.1}s, peak {:.3}, {} frames queued, {} underruns",
                stats.frames_rendered as f64 / sample_rate as f64,
                peak,
                stats.queued_frames,
                stats.underrun_blocks
            );
            peak = 0.0;
            next_report += u64::from(sample_rate);
        }

        match status {
            RenderStatus::Drained | RenderStatus::Closed => break,
            // The decoder is behind; give it a moment instead of spinning.
            RenderStatus::Underrun => std::thread::yield_now(),
            RenderStatus::Playing => {}
        }
    }

    if !watcher.is_drained() {
        bail!("Render loop stopped before the stream drained");
    }
    Ok(())
}
