//! Audio resampling using rubato
//!
//! Decoded assets are normalized to the working sample rate; the playback
//! engine resamples again only if the output device runs at a different
//! rate.

use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Working sample rate all decoded audio is normalized to
pub const WORKING_SAMPLE_RATE: u32 = 44100;

/// Whole-buffer resampler for interleaved audio.
pub struct Resampler;

impl Resampler {
    /// Resample interleaved audio from `input_rate` to `output_rate`.
    ///
    /// Returns a copy unchanged when the rates already match.
    pub fn resample(
        input: &[f32],
        input_rate: u32,
        output_rate: u32,
        channels: u16,
    ) -> Result<Vec<f32>> {
        if input_rate == output_rate {
            return Ok(input.to_vec());
        }
        if input.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "resampling from {}Hz to {}Hz ({} channels)",
            input_rate, output_rate, channels
        );

        let planar_input = Self::deinterleave(input, channels);
        let input_frames = planar_input[0].len();

        let mut resampler = FastFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            1.0,
            PolynomialDegree::Septic,
            input_frames,
            channels as usize,
        )
        .map_err(|e| Error::DecodeError(format!("failed to create resampler: {}", e)))?;

        let planar_output = resampler
            .process(&planar_input, None)
            .map_err(|e| Error::DecodeError(format!("resampling failed: {}", e)))?;

        Ok(Self::interleave(planar_output))
    }

    /// Split interleaved samples into per-channel vectors (rubato expects
    /// planar input)
    fn deinterleave(input: &[f32], channels: u16) -> Vec<Vec<f32>> {
        let channels = channels as usize;
        let frames = input.len() / channels;
        let mut planar = vec![Vec::with_capacity(frames); channels];

        for frame in input.chunks_exact(channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                planar[ch].push(sample);
            }
        }

        planar
    }

    /// Merge per-channel vectors back into interleaved samples
    fn interleave(planar: Vec<Vec<f32>>) -> Vec<f32> {
        let channels = planar.len();
        if channels == 0 {
            return Vec::new();
        }
        let frames = planar[0].len();
        let mut interleaved = Vec::with_capacity(frames * channels);

        for frame_idx in 0..frames {
            for channel in &planar {
                interleaved.push(channel[frame_idx]);
            }
        }

        interleaved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_is_identity() {
        let input = vec![0.1, 0.2, 0.3, 0.4];
        let output = Resampler::resample(&input, 44100, 44100, 2).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_upsample_doubles_frame_count() {
        let input = vec![0.0f32; 2 * 1000]; // 1000 stereo frames
        let output = Resampler::resample(&input, 22050, 44100, 2).unwrap();

        let frames_out = output.len() / 2;
        // Within a few frames of the exact 2x ratio
        assert!((frames_out as i64 - 2000).abs() < 16, "got {}", frames_out);
    }

    #[test]
    fn test_downsample_halves_frame_count() {
        let input = vec![0.0f32; 2 * 2000];
        let output = Resampler::resample(&input, 44100, 22050, 2).unwrap();

        let frames_out = output.len() / 2;
        assert!((frames_out as i64 - 1000).abs() < 16, "got {}", frames_out);
    }

    #[test]
    fn test_empty_input() {
        let output = Resampler::resample(&[], 22050, 44100, 2).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_deinterleave_interleave_round_trip() {
        let input = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let planar = Resampler::deinterleave(&input, 2);
        assert_eq!(planar[0], vec![1.0, 3.0, 5.0]);
        assert_eq!(planar[1], vec![2.0, 4.0, 6.0]);
        assert_eq!(Resampler::interleave(planar), input);
    }
}
