//! Core audio data types

/// Fully decoded audio asset, ready for windowing and playback.
///
/// **Format:**
/// - Samples are f32 (floating point -1.0 to 1.0)
/// - Stereo interleaved: [L, R, L, R, ...]
/// - Sample rate normalized to the working rate after decode
#[derive(Debug, Clone)]
pub struct DecodedAsset {
    /// PCM audio samples (interleaved stereo)
    pub samples: Vec<f32>,

    /// Sample rate of `samples`
    pub sample_rate: u32,
}

impl DecodedAsset {
    /// Wrap decoded samples. Truncates a trailing half-frame if the sample
    /// count is odd, so the buffer always holds whole stereo frames.
    pub fn new(mut samples: Vec<f32>, sample_rate: u32) -> Self {
        if samples.len() % 2 != 0 {
            samples.pop();
        }
        Self {
            samples,
            sample_rate,
        }
    }

    /// Number of stereo frames
    pub fn frame_count(&self) -> usize {
        self.samples.len() / 2
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        (self.frame_count() as u64 * 1000) / self.sample_rate as u64
    }

    /// Interleaved samples for the frame window `[start_frame, end_frame)`,
    /// clamped to the buffer
    pub fn window(&self, start_frame: usize, end_frame: usize) -> &[f32] {
        let frames = self.frame_count();
        let start = start_frame.min(frames);
        let end = end_frame.clamp(start, frames);
        &self.samples[start * 2..end * 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration() {
        let asset = DecodedAsset::new(vec![0.0; 44100 * 2], 44100);
        assert_eq!(asset.frame_count(), 44100);
        assert_eq!(asset.duration_ms(), 1000);
        assert!((asset.duration_seconds() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_odd_sample_count_truncated() {
        let asset = DecodedAsset::new(vec![0.0; 5], 44100);
        assert_eq!(asset.samples.len(), 4);
        assert_eq!(asset.frame_count(), 2);
    }

    #[test]
    fn test_window_clamps_to_buffer() {
        let asset = DecodedAsset::new((0..8).map(|i| i as f32).collect(), 4);
        assert_eq!(asset.window(1, 3), &[2.0, 3.0, 4.0, 5.0]);
        assert_eq!(asset.window(3, 100).len(), 2);
        assert_eq!(asset.window(100, 200).len(), 0);
    }
}
