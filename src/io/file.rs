//! Audio file decoding using symphonia.
//!
//! Provides [`AudioFileReader`], which decodes common audio formats (mp3,
//! flac, wav, ogg, aac) packet by packet into [`PlanarBuffer`]s and writes
//! them into a stream. No resampling is done.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info, warn};

use crate::audio::PlanarBuffer;
use crate::engine::PcmWriter;

const WRITE_RETRY_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone)]
pub struct AudioFileInfo {
    pub sample_rate: u32,
    pub channels: usize,
    pub duration_secs: Option<f64>,
    pub file_name: String,
}

pub struct AudioFileReader {
    format: Box<dyn symphonia::core::formats::FormatReader>,
    decoder: Box<dyn symphonia::core::codecs::Decoder>,
    track_id: u32,
    pub info: AudioFileInfo,
}

impl AudioFileReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let file = File::open(path).context("Failed to open audio file")?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .context("Failed to probe audio format")?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| anyhow!("No supported audio track found"))?;

        let track_id = track.id;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| anyhow!("Unknown sample rate"))?;

        let channels = track
            .codec_params
            .channels
            .map(|c| c.count())
            .unwrap_or(2);

        let duration_secs = track
            .codec_params
            .n_frames
            .map(|frames| frames as f64 / sample_rate as f64);

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .context("Failed to create decoder")?;

        let info = AudioFileInfo {
            sample_rate,
            channels,
            duration_secs,
            file_name,
        };
        info!("Opened {:?}", info);

        Ok(Self {
            format,
            decoder,
            track_id,
            info,
        })
    }

    /// Decode the next packet of the audio track as `channel_count` planar
    /// channels. Returns `None` at end of stream.
    pub fn next_buffer(&mut self, channel_count: usize) -> Result<Option<PlanarBuffer>> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => return Ok(Some(PlanarBuffer::from_decoded(decoded, channel_count))),
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping undecodable packet: {}", e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Decode the whole track into `writer`. Returns the number of frames written.
    ///
    /// Waits while the writer's queue limit is reached rather than failing.
    pub fn stream_into(mut self, writer: &mut PcmWriter) -> Result<usize> {
        let channel_count = writer.channel_count();
        let mut frames = 0;
        while let Some(buffer) = self.next_buffer(channel_count)? {
            let len = buffer.frame_count();
            while !writer.has_room_for(len) {
                if writer.is_disconnected() {
                    bail!("Renderer dropped while streaming {}", self.info.file_name);
                }
                std::thread::sleep(WRITE_RETRY_INTERVAL);
            }
            writer
                .write(buffer)
                .context("Failed to queue decoded audio")?;
            frames += len;
        }
        debug!("Decoded {} frames from {}", frames, self.info.file_name);
        Ok(frames)
    }
}
