use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Parser;
use lxcore::timing::{
    FrameRate, RawSegment, Segment, TimelineLayout, format_duration, format_time, round_time,
};
use serde::Serialize;
use tracing::instrument;

use super::{parse_fps, terminal::Colorize};

#[derive(Debug, Parser)]
pub struct Segments {
    /// A JSON file holding an array of segments
    file: PathBuf,

    /// Frames per second (defaults to the configured frame rate)
    #[arg(long, value_parser = parse_fps)]
    fps: Option<FrameRate>,

    /// Length of the video in seconds (defaults to the latest segment end)
    #[arg(long)]
    duration: Option<f64>,

    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Serialize)]
struct PlacedSegment {
    #[serde(flatten)]
    segment: Segment,
    duration: f64,
    #[serde(flatten)]
    layout: TimelineLayout,
}

impl Segments {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let fps = self
            .fps
            .unwrap_or_else(|| super::load_config(root).default_fps());

        let content = fs::read_to_string(&self.file)
            .with_context(|| format!("failed to read {}", self.file.display()))?;
        let raw: Vec<RawSegment> = serde_json::from_str(&content)
            .with_context(|| format!("{} is not a JSON array of segments", self.file.display()))?;

        let video_duration = self.duration;
        let placed = place(&raw, fps, video_duration);
        tracing::debug!(segments = placed.len(), %fps, "normalised segments");

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&placed)?),
            OutputFormat::Table => Self::output_table(&placed),
        }
        Ok(())
    }

    fn output_table(placed: &[PlacedSegment]) {
        if placed.is_empty() {
            println!("No segments.");
            return;
        }

        println!(
            "{:>6}  {:<20} {:>6} {:>6} {:>10} {:>8} {:>8}",
            "ID", "LABEL", "START", "END", "DURATION", "POS %", "WIDTH %"
        );
        for entry in placed {
            let line = format!(
                "{:>6}  {:<20} {:>6} {:>6} {:>10} {:>8} {:>8}",
                entry.segment.id,
                entry.segment.label,
                format_time(entry.segment.start),
                format_time(entry.segment.end),
                format_duration(entry.duration),
                round_time(entry.layout.position, 2),
                round_time(entry.layout.width, 2),
            );
            if entry.duration < 0.0 {
                println!("{}", line.warning());
            } else {
                println!("{line}");
            }
        }
    }
}

/// Normalise segments and lay them out on a timeline of `video_duration`
/// seconds, or of the latest segment end when no duration is given.
fn place(raw: &[RawSegment], fps: FrameRate, video_duration: Option<f64>) -> Vec<PlacedSegment> {
    let segments: Vec<Segment> = raw.iter().map(|segment| segment.normalize(fps)).collect();
    let video_duration = video_duration.unwrap_or_else(|| {
        segments
            .iter()
            .map(|segment| segment.end)
            .fold(0.0, f64::max)
    });

    segments
        .into_iter()
        .map(|segment| PlacedSegment {
            duration: segment.duration(),
            layout: segment.layout(video_duration),
            segment,
        })
        .collect()
}
