//! Audio pipeline: decode, resample, output
//!
//! Preview assets are decoded in full to interleaved stereo f32 at the
//! working sample rate, windowed and fade-enveloped by the playback engine,
//! then pushed through a [`SampleSink`] to the output device.

pub mod decode;
pub mod output;
pub mod resampler;
pub mod types;

pub use decode::decode_bytes;
pub use output::{CpalOutput, NullSink, SampleSink};
pub use resampler::{Resampler, WORKING_SAMPLE_RATE};
pub use types::DecodedAsset;
