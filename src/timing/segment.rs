//! Video annotation segments and their timeline layout.
//!
//! Segments arrive from the API with frame-based bounds, time-based bounds or
//! both. [`RawSegment::normalize`] reconciles them into a [`Segment`] measured
//! in seconds. Normalisation performs no clamping and does not require
//! `end >= start`; that is left to the caller.

use serde::{Deserialize, Serialize};

use crate::timing::{FrameRate, safe_time_conversion};

/// A segment as reported by the annotation API.
///
/// Seconds fields take precedence over frame fields for the same bound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSegment {
    /// Segment id; drafts use negative ids.
    pub id: i64,
    /// Label name.
    #[serde(alias = "label_name", alias = "labelName")]
    pub label: Option<String>,
    /// Start in seconds.
    #[serde(alias = "startTime")]
    pub start_time: Option<f64>,
    /// End in seconds.
    #[serde(alias = "endTime")]
    pub end_time: Option<f64>,
    /// Start as a frame index.
    #[serde(alias = "startFrameNumber")]
    pub start_frame_number: Option<f64>,
    /// End as a frame index.
    #[serde(alias = "endFrameNumber")]
    pub end_frame_number: Option<f64>,
}

impl RawSegment {
    /// Converts both bounds to seconds.
    ///
    /// Each bound uses its seconds field when present and otherwise its frame
    /// field converted at `fps`. Missing or invalid bounds become `0`.
    #[must_use]
    pub fn normalize(&self, fps: FrameRate) -> Segment {
        Segment {
            id: self.id,
            label: self.label.clone().unwrap_or_else(|| "unknown".to_string()),
            start: bound(self.start_time, self.start_frame_number, fps),
            end: bound(self.end_time, self.end_frame_number, fps),
        }
    }
}

fn bound(seconds: Option<f64>, frame: Option<f64>, fps: FrameRate) -> f64 {
    seconds.map_or_else(
        || safe_time_conversion(frame, true, fps.get()),
        |seconds| safe_time_conversion(Some(seconds), false, fps.get()),
    )
}

/// A labelled interval of a video, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment id.
    pub id: i64,
    /// Label name.
    pub label: String,
    /// Start in seconds.
    pub start: f64,
    /// End in seconds.
    pub end: f64,
}

impl Segment {
    /// `end - start`, negative if the bounds are reversed.
    #[must_use]
    pub const fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Position and width of the segment on a timeline of `video_duration`
    /// seconds.
    #[must_use]
    pub const fn layout(&self, video_duration: f64) -> TimelineLayout {
        TimelineLayout {
            position: calculate_segment_position(self.start, video_duration),
            width: calculate_segment_width(self.start, self.end, video_duration),
        }
    }
}

/// Horizontal placement of a segment on a timeline, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimelineLayout {
    /// Offset of the segment's start from the left edge.
    pub position: f64,
    /// Width of the segment.
    pub width: f64,
}

/// Offset of `start` as a percentage of `duration`.
///
/// Returns `0` for non-finite input or a non-positive duration.
#[must_use]
pub const fn calculate_segment_position(start: f64, duration: f64) -> f64 {
    if !start.is_finite() || !duration.is_finite() || duration <= 0.0 {
        return 0.0;
    }
    start / duration * 100.0
}

/// Width of `start..end` as a percentage of `duration`.
///
/// Returns `0` for non-finite input, a non-positive duration or
/// `end <= start`.
#[must_use]
pub const fn calculate_segment_width(start: f64, end: f64, duration: f64) -> f64 {
    if !start.is_finite() || !end.is_finite() || !duration.is_finite() {
        return 0.0;
    }
    if duration <= 0.0 || end <= start {
        return 0.0;
    }
    (end - start) / duration * 100.0
}
