//! Linear fade envelope for clip playback
//!
//! A clip is rendered through a single gain stage. The envelope is built from
//! two independent linear ramp instructions against that gain:
//!
//! 1. Fade-in: gain 0.0 at clip start, ramping linearly to 1.0 over
//!    `fade_in` seconds.
//! 2. Fade-out: gain set to 1.0 at `duration - fade_out`, ramping linearly
//!    to 0.0 at `duration` exactly.
//!
//! The two instructions are scheduled in that order. When
//! `fade_in + fade_out > duration` the ramps overlap, and the
//! later-scheduled fade-out owns the overlap window: gain jumps to the
//! fade-out ramp value at `duration - fade_out` regardless of how far the
//! fade-in had progressed. This last-writer-wins behavior is intentional and
//! is not a crossfade.
//!
//! Only linear ramps are supported; no other curve shapes exist here.

/// Gain envelope over one clip's local timeline (`0.0..=duration` seconds).
///
/// Pure value type; all times are in seconds relative to the start of the
/// clip window, not the underlying asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeEnvelope {
    /// Clip duration in seconds
    duration: f64,

    /// Fade-in length in seconds (0.0 = no fade-in)
    fade_in: f64,

    /// Fade-out length in seconds (0.0 = no fade-out)
    fade_out: f64,
}

impl FadeEnvelope {
    /// Build an envelope for a clip of `duration` seconds.
    ///
    /// Negative fade lengths are treated as zero. Fade lengths longer than
    /// the duration are legal; see the module docs for overlap semantics.
    pub fn new(duration: f64, fade_in: f64, fade_out: f64) -> Self {
        Self {
            duration,
            fade_in: fade_in.max(0.0),
            fade_out: fade_out.max(0.0),
        }
    }

    /// Clip duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Gain multiplier (0.0 to 1.0) at `elapsed` seconds into the clip.
    ///
    /// Outside `[0, duration]` the clip produces silence. Inside, the
    /// fade-out ramp is evaluated first (it was scheduled second and wins
    /// the overlap window), then the fade-in ramp, then full volume.
    pub fn gain_at(&self, elapsed: f64) -> f32 {
        if elapsed < 0.0 || elapsed > self.duration {
            return 0.0;
        }

        // Fade-out region: later-scheduled ramp wins from its anchor point.
        if self.fade_out > 0.0 {
            let fade_out_start = self.duration - self.fade_out;
            if elapsed >= fade_out_start {
                let progress = (elapsed - fade_out_start) / self.fade_out;
                return (1.0 - progress).clamp(0.0, 1.0) as f32;
            }
        }

        // Fade-in region.
        if self.fade_in > 0.0 && elapsed < self.fade_in {
            let progress = elapsed / self.fade_in;
            return progress.clamp(0.0, 1.0) as f32;
        }

        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-6;

    #[test]
    fn test_no_fades_constant_unity_gain() {
        let env = FadeEnvelope::new(10.0, 0.0, 0.0);

        // Sample across the full duration
        for i in 0..=100 {
            let t = 10.0 * (i as f64) / 100.0;
            assert_eq!(env.gain_at(t), 1.0, "gain at t={} should be 1.0", t);
        }
    }

    #[test]
    fn test_linear_fade_in() {
        // duration 10, fade_in 2: gain 0 at t=0, 1 at t=2, linear between
        let env = FadeEnvelope::new(10.0, 2.0, 0.0);

        assert!((env.gain_at(0.0) - 0.0).abs() < TOLERANCE);
        assert!((env.gain_at(1.0) - 0.5).abs() < TOLERANCE);
        assert!((env.gain_at(2.0) - 1.0).abs() < TOLERANCE);
        assert_eq!(env.gain_at(5.0), 1.0);
    }

    #[test]
    fn test_linear_fade_out() {
        // duration 10, fade_out 3: gain 1 at t=7, 0 at t=10
        let env = FadeEnvelope::new(10.0, 0.0, 3.0);

        assert_eq!(env.gain_at(5.0), 1.0);
        assert!((env.gain_at(7.0) - 1.0).abs() < TOLERANCE);
        assert!((env.gain_at(8.5) - 0.5).abs() < TOLERANCE);
        assert!((env.gain_at(10.0) - 0.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_fade_in_is_linear() {
        let env = FadeEnvelope::new(10.0, 2.0, 0.0);

        // Midpoints of midpoints stay on the line
        assert!((env.gain_at(0.5) - 0.25).abs() < TOLERANCE);
        assert!((env.gain_at(1.5) - 0.75).abs() < TOLERANCE);
    }

    #[test]
    fn test_overlapping_ramps_fade_out_wins() {
        // fade_in + fade_out > duration: fade-out owns [2, 10]
        let env = FadeEnvelope::new(10.0, 8.0, 8.0);

        // Before the fade-out anchor, the fade-in ramp applies
        assert!((env.gain_at(1.0) - 0.125).abs() < TOLERANCE);

        // At the anchor the fade-out ramp takes over at full volume,
        // regardless of the fade-in's progress (0.25 at this point)
        assert!((env.gain_at(2.0) - 1.0).abs() < TOLERANCE);

        // Linear down to zero at the end
        assert!((env.gain_at(6.0) - 0.5).abs() < TOLERANCE);
        assert!((env.gain_at(10.0) - 0.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_fade_out_longer_than_clip() {
        // Fade-out alone exceeding the duration anchors before t=0;
        // the ramp is already partially elapsed when the clip starts
        let env = FadeEnvelope::new(4.0, 0.0, 8.0);

        assert!((env.gain_at(0.0) - 0.5).abs() < TOLERANCE);
        assert!((env.gain_at(4.0) - 0.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_silence_outside_window() {
        let env = FadeEnvelope::new(10.0, 0.0, 0.0);

        assert_eq!(env.gain_at(-0.1), 0.0);
        assert_eq!(env.gain_at(10.1), 0.0);
    }

    #[test]
    fn test_negative_fades_treated_as_zero() {
        let env = FadeEnvelope::new(10.0, -1.0, -2.0);
        assert_eq!(env.gain_at(0.0), 1.0);
        assert_eq!(env.gain_at(10.0), 1.0);
    }
}
