//! Clip specification
//!
//! A `ClipSpec` describes a trimmed, faded segment of a source audio asset.
//! It is immutable once constructed; re-editing a clip replaces it in the
//! sequence rather than mutating it in place.

use crate::error::{Error, Result};
use pdj_common::FadeEnvelope;
use serde::{Deserialize, Serialize};

/// Immutable description of one playable clip: which asset, which window of
/// it, and the fade lengths applied at the window edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipSpec {
    asset_ref: String,
    start_offset: f64,
    end_offset: f64,
    fade_in: f64,
    fade_out: f64,
}

impl ClipSpec {
    /// Build a clip, validating the window and fade lengths.
    ///
    /// Requires `0 <= start_offset < end_offset` and non-negative fades.
    /// `fade_in + fade_out` may exceed the clip duration; the envelope
    /// resolves the overlap (later-scheduled ramp wins), so it is not
    /// rejected here.
    pub fn new(
        asset_ref: impl Into<String>,
        start_offset: f64,
        end_offset: f64,
        fade_in: f64,
        fade_out: f64,
    ) -> Result<Self> {
        if !start_offset.is_finite() || !end_offset.is_finite() {
            return Err(Error::InvalidTiming("offsets must be finite".to_string()));
        }
        if start_offset < 0.0 {
            return Err(Error::InvalidTiming(format!(
                "start offset {} is negative",
                start_offset
            )));
        }
        if end_offset <= start_offset {
            return Err(Error::InvalidTiming(format!(
                "end offset {} must be greater than start offset {}",
                end_offset, start_offset
            )));
        }
        if fade_in < 0.0 || fade_out < 0.0 {
            return Err(Error::InvalidTiming(
                "fade lengths must be non-negative".to_string(),
            ));
        }

        Ok(Self {
            asset_ref: asset_ref.into(),
            start_offset,
            end_offset,
            fade_in,
            fade_out,
        })
    }

    /// Identifier/URL of the source audio asset
    pub fn asset_ref(&self) -> &str {
        &self.asset_ref
    }

    /// Window start, seconds into the asset
    pub fn start_offset(&self) -> f64 {
        self.start_offset
    }

    /// Window end, seconds into the asset
    pub fn end_offset(&self) -> f64 {
        self.end_offset
    }

    /// Fade-in length in seconds
    pub fn fade_in(&self) -> f64 {
        self.fade_in
    }

    /// Fade-out length in seconds
    pub fn fade_out(&self) -> f64 {
        self.fade_out
    }

    /// Clip duration in seconds
    pub fn duration(&self) -> f64 {
        self.end_offset - self.start_offset
    }

    /// Gain envelope over this clip's local timeline
    pub fn envelope(&self) -> FadeEnvelope {
        FadeEnvelope::new(self.duration(), self.fade_in, self.fade_out)
    }
}
