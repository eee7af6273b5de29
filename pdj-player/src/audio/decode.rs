//! Audio decoding using symphonia
//!
//! Decodes a fetched preview asset (a byte buffer, typically MP3 or AAC)
//! into a [`DecodedAsset`]: interleaved stereo f32 at the working sample
//! rate. Mono input is duplicated to stereo; multi-channel input is
//! downmixed by averaging.

use crate::audio::resampler::{Resampler, WORKING_SAMPLE_RATE};
use crate::audio::types::DecodedAsset;
use crate::error::{Error, Result};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Decode an in-memory audio asset to stereo f32 at the working rate.
///
/// `extension_hint` helps the format probe when the asset URL carries a
/// recognizable extension ("mp3", "wav", ...).
pub fn decode_bytes(bytes: Vec<u8>, extension_hint: Option<&str>) -> Result<DecodedAsset> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension_hint {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::DecodeError(format!("unrecognized format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| Error::DecodeError("no audio track found".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let channels = codec_params
        .channels
        .map(|c| c.count())
        .ok_or_else(|| Error::DecodeError("unknown channel layout".to_string()))?;
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| Error::DecodeError("unknown sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| Error::DecodeError(format!("unsupported codec: {}", e)))?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(Error::DecodeError(format!("read error: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A corrupt packet mid-stream is skippable; anything else is not
            Err(SymphoniaError::DecodeError(e)) => {
                debug!("skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(Error::DecodeError(format!("decode error: {}", e))),
        };

        let buf = sample_buf.get_or_insert_with(|| {
            SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
        });
        buf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(buf.samples());
    }

    if interleaved.is_empty() {
        return Err(Error::DecodeError("no audio data decoded".to_string()));
    }

    let stereo = to_stereo(&interleaved, channels);
    let resampled = Resampler::resample(&stereo, sample_rate, WORKING_SAMPLE_RATE, 2)?;

    debug!(
        "decoded asset: {} frames at {} Hz ({} channels native)",
        resampled.len() / 2,
        WORKING_SAMPLE_RATE,
        channels
    );

    Ok(DecodedAsset::new(resampled, WORKING_SAMPLE_RATE))
}

/// Map interleaved samples of any channel count to interleaved stereo.
///
/// Mono is duplicated to both channels; layouts above stereo are downmixed
/// by averaging even channels into the left and odd channels into the right.
fn to_stereo(interleaved: &[f32], channels: usize) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => {
            let mut stereo = Vec::with_capacity(interleaved.len() * 2);
            for &sample in interleaved {
                stereo.push(sample);
                stereo.push(sample);
            }
            stereo
        }
        2 => interleaved.to_vec(),
        n => {
            let frames = interleaved.len() / n;
            let mut stereo = Vec::with_capacity(frames * 2);
            let half = (n as f32 / 2.0).max(1.0);
            for frame in interleaved.chunks_exact(n) {
                let mut left = 0.0f32;
                let mut right = 0.0f32;
                for (ch, &sample) in frame.iter().enumerate() {
                    if ch % 2 == 0 {
                        left += sample;
                    } else {
                        right += sample;
                    }
                }
                stereo.push(left / half);
                stereo.push(right / half);
            }
            stereo
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 440 Hz sine, i16 WAV, returned as raw bytes
    fn sine_wav_bytes(sample_rate: u32, channels: u16, seconds: f64) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            let frames = (sample_rate as f64 * seconds) as u32;
            for i in 0..frames {
                let t = i as f64 / sample_rate as f64;
                let value = (t * 440.0 * 2.0 * std::f64::consts::PI).sin();
                let sample = (value * i16::MAX as f64 * 0.5) as i16;
                for _ in 0..channels {
                    writer.write_sample(sample).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_stereo_wav() {
        let bytes = sine_wav_bytes(44100, 2, 1.0);
        let asset = decode_bytes(bytes, Some("wav")).unwrap();

        assert_eq!(asset.sample_rate, WORKING_SAMPLE_RATE);
        assert!((asset.duration_seconds() - 1.0).abs() < 0.05);
        // Not silence
        assert!(asset.samples.iter().any(|s| s.abs() > 0.1));
    }

    #[test]
    fn test_decode_mono_wav_duplicates_channels() {
        let bytes = sine_wav_bytes(44100, 1, 0.5);
        let asset = decode_bytes(bytes, Some("wav")).unwrap();

        // Mono becomes stereo with identical channels
        let left = asset.samples[100 * 2];
        let right = asset.samples[100 * 2 + 1];
        assert_eq!(left, right);
    }

    #[test]
    fn test_decode_resamples_to_working_rate() {
        let bytes = sine_wav_bytes(22050, 2, 1.0);
        let asset = decode_bytes(bytes, Some("wav")).unwrap();

        assert_eq!(asset.sample_rate, WORKING_SAMPLE_RATE);
        assert!((asset.duration_seconds() - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = decode_bytes(vec![0u8; 512], None);
        assert!(matches!(result, Err(Error::DecodeError(_))));
    }

    #[test]
    fn test_to_stereo_mono() {
        assert_eq!(to_stereo(&[0.5, -0.5], 1), vec![0.5, 0.5, -0.5, -0.5]);
    }

    #[test]
    fn test_to_stereo_quad_downmix() {
        // One quad frame: L1, R1, L2, R2 -> averaged pairs
        let stereo = to_stereo(&[0.2, 0.4, 0.6, 0.8], 4);
        assert_eq!(stereo.len(), 2);
        assert!((stereo[0] - 0.4).abs() < 1e-6);
        assert!((stereo[1] - 0.6).abs() < 1e-6);
    }
}
