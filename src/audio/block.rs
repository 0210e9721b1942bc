/// A fixed-size planar block of f32 samples, the render destination.
///
/// Storage is one contiguous allocation, channel 0 first. Blocks are allocated
/// once by the host and reused across callbacks.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBlock {
    data: Vec<f32>,
    channels: usize,
    frames: usize,
}

impl AudioBlock {
    /// Create a silent block.
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            data: vec![0.0; channels * frames],
            channels,
            frames,
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Frames per channel.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn channel(&self, idx: usize) -> &[f32] {
        let start = idx * self.frames;
        &self.data[start..start + self.frames]
    }

    pub fn channel_mut(&mut self, idx: usize) -> &mut [f32] {
        let start = idx * self.frames;
        &mut self.data[start..start + self.frames]
    }

    /// Zero frames `from..` in channels `first_channel..`.
    pub fn silence_from(&mut self, first_channel: usize, from: usize) {
        for ch in first_channel..self.channels {
            self.channel_mut(ch)[from..].fill(0.0);
        }
    }

    /// Zero `len` frames starting at `from` in channels `first_channel..`.
    pub fn silence_range(&mut self, first_channel: usize, from: usize, len: usize) {
        for ch in first_channel..self.channels {
            self.channel_mut(ch)[from..from + len].fill(0.0);
        }
    }

    /// Write frames `from..` interleaved into `out`, converting each sample.
    ///
    /// `out` holds `out_channels` samples per frame. Output channels the block
    /// lacks are set to `fill`. Returns the number of frames written, limited
    /// by whichever of the two runs out first.
    pub fn write_interleaved<T: Copy>(
        &self,
        from: usize,
        out: &mut [T],
        out_channels: usize,
        fill: T,
        convert: impl Fn(f32) -> T,
    ) -> usize {
        let frames = self
            .frames
            .saturating_sub(from)
            .min(out.len() / out_channels);
        for (i, frame) in out.chunks_exact_mut(out_channels).take(frames).enumerate() {
            for (ch, slot) in frame.iter_mut().enumerate() {
                *slot = if ch < self.channels {
                    convert(self.data[ch * self.frames + from + i])
                } else {
                    fill
                };
            }
        }
        frames
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_layout() {
        let mut block = AudioBlock::new(2, 3);
        block.channel_mut(1).copy_from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(block.channel(0), &[0.0; 3]);
        assert_eq!(block.data(), &[0.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_silence_from() {
        let mut block = AudioBlock::new(2, 4);
        block.channel_mut(0).fill(1.0);
        block.channel_mut(1).fill(1.0);
        block.silence_from(0, 2);
        assert_eq!(block.channel(0), &[1.0, 1.0, 0.0, 0.0]);
        assert_eq!(block.channel(1), &[1.0, 1.0, 0.0, 0.0]);

        block.silence_range(1, 0, 1);
        assert_eq!(block.channel(1), &[0.0, 1.0, 0.0, 0.0]);
        assert_eq!(block.channel(0), &[1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_write_interleaved() {
        let mut block = AudioBlock::new(2, 2);
        block.channel_mut(0).copy_from_slice(&[0.5, -0.5]);
        block.channel_mut(1).copy_from_slice(&[1.0, -1.0]);

        let mut out = [9i32; 6];
        assert_eq!(block.write_interleaved(0, &mut out, 3, 0, |s| (s * 10.0) as i32), 2);
        assert_eq!(out, [5, 10, 0, -5, -10, 0]);

        let mut out = [9i32; 6];
        assert_eq!(block.write_interleaved(1, &mut out, 2, 0, |s| (s * 10.0) as i32), 1);
        assert_eq!(out, [-5, -10, 9, 9, 9, 9]);
    }
}
