//! Frame/time conversion functions.
//!
//! Pure functions for converting between frame indices and seconds. They are
//! total: invalid input (NaN, infinities, negative values, a frame rate that
//! is not positive) yields `0` instead of an error, so callers never branch
//! on failure. A result of `0` is therefore ambiguous between "zero" and
//! "invalid"; validate first if the difference matters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A positive, finite number of frames per second.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct FrameRate(f64);

impl FrameRate {
    /// The frame rate assumed when a video does not report one.
    pub const DEFAULT: Self = Self(50.0);

    /// Creates a frame rate, or `None` if `fps` is not positive and finite.
    #[must_use]
    pub fn new(fps: f64) -> Option<Self> {
        (fps.is_finite() && fps > 0.0).then_some(Self(fps))
    }

    /// Frames per second.
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }

    /// Duration of a single frame in seconds.
    #[must_use]
    pub const fn frame_duration(self) -> f64 {
        1.0 / self.0
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fps", self.0)
    }
}

impl TryFrom<f64> for FrameRate {
    type Error = InvalidFrameRate;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidFrameRate(value))
    }
}

impl From<FrameRate> for f64 {
    fn from(value: FrameRate) -> Self {
        value.0
    }
}

/// Error returned when a frame rate is not positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("invalid frame rate {0}: must be positive and finite")]
pub struct InvalidFrameRate(f64);

const fn is_valid_quantity(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Convert a frame count to seconds.
///
/// Returns `frames / fps`, or `0` if `frames` is not finite and
/// non-negative or `fps` is not positive and finite.
///
/// # Examples
/// ```
/// use lxcore::timing::frames_to_seconds;
///
/// assert_eq!(frames_to_seconds(90.0, 30.0), 3.0);
/// assert_eq!(frames_to_seconds(90.0, 0.0), 0.0);
/// assert_eq!(frames_to_seconds(f64::NAN, 30.0), 0.0);
/// ```
#[must_use]
pub fn frames_to_seconds(frames: f64, fps: f64) -> f64 {
    match FrameRate::new(fps) {
        Some(fps) if is_valid_quantity(frames) => frames / fps.get(),
        _ => 0.0,
    }
}

/// Convert seconds to a frame index, rounding half away from zero.
///
/// Returns `0` under the same conditions as [`frames_to_seconds`]. Results
/// beyond `u64::MAX` saturate.
///
/// # Examples
/// ```
/// use lxcore::timing::seconds_to_frames;
///
/// assert_eq!(seconds_to_frames(2.5, 30.0), 75);
/// assert_eq!(seconds_to_frames(1.0, -30.0), 0);
/// ```
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "the product is finite and non-negative; `as` saturates at u64::MAX"
)]
pub fn seconds_to_frames(seconds: f64, fps: f64) -> u64 {
    match FrameRate::new(fps) {
        Some(fps) if is_valid_quantity(seconds) => (seconds * fps.get()).round() as u64,
        _ => 0,
    }
}

/// Normalise a value that is either a frame count or seconds into seconds.
///
/// `None`, NaN, infinite and negative values yield `0`. Frame counts are
/// converted with [`frames_to_seconds`]; seconds pass through. The result is
/// never negative.
///
/// # Examples
/// ```
/// use lxcore::timing::safe_time_conversion;
///
/// assert_eq!(safe_time_conversion(Some(30.0), true, 30.0), 1.0);
/// assert_eq!(safe_time_conversion(Some(3.0), false, 30.0), 3.0);
/// assert_eq!(safe_time_conversion(None, true, 30.0), 0.0);
/// ```
#[must_use]
pub fn safe_time_conversion(value: Option<f64>, is_frame_based: bool, fps: f64) -> f64 {
    let Some(value) = value.filter(|v| is_valid_quantity(*v)) else {
        return 0.0;
    };

    if is_frame_based {
        frames_to_seconds(value, fps)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(30.0, 30.0, 1.0; "one second")]
    #[test_case(90.0, 30.0, 3.0; "three seconds")]
    #[test_case(150.0, 50.0, 3.0; "fifty fps")]
    #[test_case(0.0, 30.0, 0.0; "zero frames")]
    #[test_case(f64::NAN, 30.0, 0.0; "nan frames")]
    #[test_case(f64::INFINITY, 30.0, 0.0; "infinite frames")]
    #[test_case(-1.0, 30.0, 0.0; "negative frames")]
    #[test_case(30.0, 0.0, 0.0; "zero fps")]
    #[test_case(30.0, -1.0, 0.0; "negative fps")]
    #[test_case(30.0, f64::NAN, 0.0; "nan fps")]
    fn frames_to_seconds_cases(frames: f64, fps: f64, expected: f64) {
        assert_eq!(frames_to_seconds(frames, fps), expected);
    }

    #[test_case(1.0, 30.0, 30; "one second")]
    #[test_case(2.5, 30.0, 75; "half second boundary")]
    #[test_case(0.5, 1.0, 1; "rounds half up")]
    #[test_case(0.0, 30.0, 0; "zero")]
    #[test_case(f64::NAN, 30.0, 0; "nan seconds")]
    #[test_case(-2.0, 30.0, 0; "negative seconds")]
    #[test_case(1.0, 0.0, 0; "zero fps")]
    #[test_case(1.0, f64::INFINITY, 0; "infinite fps")]
    fn seconds_to_frames_cases(seconds: f64, fps: f64, expected: u64) {
        assert_eq!(seconds_to_frames(seconds, fps), expected);
    }

    #[test_case(Some(30.0), true, 30.0, 1.0; "frames")]
    #[test_case(Some(90.0), true, 30.0, 3.0; "more frames")]
    #[test_case(Some(1.0), false, 30.0, 1.0; "seconds")]
    #[test_case(Some(3.0), false, 30.0, 3.0; "more seconds")]
    #[test_case(None, true, 30.0, 0.0; "missing frames")]
    #[test_case(None, false, 30.0, 0.0; "missing seconds")]
    #[test_case(Some(f64::NAN), true, 30.0, 0.0; "nan")]
    #[test_case(Some(-1.0), true, 30.0, 0.0; "negative frame")]
    #[test_case(Some(-1.0), false, 30.0, 0.0; "negative seconds")]
    #[test_case(Some(3.0), false, 0.0, 3.0; "seconds ignore fps")]
    #[test_case(Some(30.0), true, 0.0, 0.0; "frames need fps")]
    fn safe_time_conversion_cases(value: Option<f64>, frames: bool, fps: f64, expected: f64) {
        assert_eq!(safe_time_conversion(value, frames, fps), expected);
    }

    #[test]
    fn frames_survive_round_trip() {
        for fps in [23.976, 25.0, 29.97, 30.0, 50.0, 59.94, 60.0] {
            for frame in [0_u32, 1, 2, 29, 30, 31, 1_000, 123_457, 9_999_999] {
                let seconds = frames_to_seconds(f64::from(frame), fps);
                assert_eq!(
                    seconds_to_frames(seconds, fps),
                    u64::from(frame),
                    "{frame} @ {fps}"
                );
            }
        }
    }

    #[test]
    fn converted_seconds_are_stable() {
        for value in [Some(0.0), Some(31.0), Some(1e6), Some(-4.0), None] {
            let once = safe_time_conversion(value, true, 30.0);
            assert_eq!(safe_time_conversion(Some(once), false, 30.0), once);
        }
    }

    #[test]
    fn single_frame_segment_length() {
        let start = safe_time_conversion(Some(30.0), true, 30.0);
        let end = safe_time_conversion(Some(31.0), true, 30.0);
        assert!((end - start - 1.0 / 30.0).abs() < 1e-3);
    }

    #[test]
    fn frame_rate_validation() {
        assert!(FrameRate::new(0.0).is_none());
        assert!(FrameRate::new(f64::INFINITY).is_none());
        assert_eq!(FrameRate::new(25.0).map(FrameRate::get), Some(25.0));
        assert_eq!(FrameRate::default().get(), 50.0);
        assert_eq!(FrameRate::new(50.0).unwrap().frame_duration(), 0.02);

        let parsed: Result<FrameRate, _> = serde_json::from_str("-5");
        assert!(parsed.is_err());
    }
}
