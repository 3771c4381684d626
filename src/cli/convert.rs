use std::path::Path;

use clap::Parser;
use lxcore::timing::{
    FrameRate, format_duration, format_time, frames_to_seconds, parse_time, round_time,
    seconds_to_frames,
};
use tracing::instrument;

use super::parse_fps;

#[derive(Debug, Parser)]
pub struct Convert {
    /// The value to convert: seconds (or `MM:SS`), or frames with `--frames`
    value: String,

    /// Treat the value as a frame index and convert it to seconds
    #[arg(long)]
    frames: bool,

    /// Frames per second (defaults to the configured frame rate)
    #[arg(long, value_parser = parse_fps)]
    fps: Option<FrameRate>,
}

impl Convert {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let fps = self
            .fps
            .unwrap_or_else(|| super::load_config(root).default_fps());
        let value = parse_value(&self.value, self.frames)?;

        println!("{}", convert(value, self.frames, fps));
        Ok(())
    }
}

fn parse_value(text: &str, frames: bool) -> anyhow::Result<f64> {
    if let Ok(value) = text.trim().parse::<f64>() {
        return Ok(value);
    }
    if !frames {
        if let Some(seconds) = parse_time(text) {
            return Ok(seconds);
        }
    }
    anyhow::bail!("'{text}' is not a number or an MM:SS time")
}

fn convert(value: f64, frames: bool, fps: FrameRate) -> String {
    if frames {
        let seconds = frames_to_seconds(value, fps.get());
        format!(
            "frame {value} at {fps} = {}s ({})",
            round_time(seconds, 3),
            format_time(seconds)
        )
    } else {
        let frame = seconds_to_frames(value, fps.get());
        format!("{} at {fps} = frame {frame}", format_duration(value))
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("12.5", false, Some(12.5); "decimal seconds")]
    #[test_case("01:30", false, Some(90.0); "minutes and seconds")]
    #[test_case("150", true, Some(150.0); "frames")]
    #[test_case("01:30", true, None; "frames must be numeric")]
    #[test_case("soon", false, None; "not a time")]
    fn parse_values(text: &str, frames: bool, expected: Option<f64>) {
        assert_eq!(parse_value(text, frames).ok(), expected);
    }

    #[test]
    fn frames_to_seconds_line() {
        let fps = FrameRate::new(30.0).unwrap();
        assert_eq!(convert(150.0, true, fps), "frame 150 at 30 fps = 5s (00:05)");
    }

    #[test]
    fn seconds_to_frames_line() {
        let fps = FrameRate::new(30.0).unwrap();
        assert_eq!(convert(90.0, false, fps), "1m 30s at 30 fps = frame 2700");
    }
}
