//! Conversions between frame indices and seconds for video annotation.

pub mod convert;
pub use convert::{
    FrameRate, InvalidFrameRate, frames_to_seconds, safe_time_conversion, seconds_to_frames,
};

pub mod format;
pub use format::{
    calculate_duration, clamp_time, format_duration, format_time, is_valid_time_range, parse_time,
    round_time, time_ranges_overlap,
};

pub mod segment;
pub use segment::{
    RawSegment, Segment, TimelineLayout, calculate_segment_position, calculate_segment_width,
};
