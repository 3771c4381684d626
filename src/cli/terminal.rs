//! Styled terminal output

use std::sync::LazyLock;

use owo_colors::{OwoColorize, colors::css};

static COLOR: LazyLock<bool> =
    LazyLock::new(|| supports_color::on(supports_color::Stream::Stdout).is_some());

#[derive(Debug, Clone, Copy)]
enum Tone {
    Success,
    Warning,
    Error,
    Muted,
}

fn paint(text: &str, tone: Tone) -> String {
    if !*COLOR {
        return text.to_string();
    }
    match tone {
        Tone::Success => text.fg::<css::Green>().to_string(),
        Tone::Warning => text.fg::<css::Orange>().to_string(),
        Tone::Error => text.fg::<css::Red>().bold().to_string(),
        Tone::Muted => text.dimmed().to_string(),
    }
}

/// Styles text for stdout, leaving it plain when colour is unsupported.
pub trait Colorize: AsRef<str> {
    /// A passed check.
    fn success(&self) -> String {
        paint(self.as_ref(), Tone::Success)
    }

    /// Something that needs attention but does not fail.
    fn warning(&self) -> String {
        paint(self.as_ref(), Tone::Warning)
    }

    /// A failure.
    fn error(&self) -> String {
        paint(self.as_ref(), Tone::Error)
    }

    /// Secondary detail.
    fn dim(&self) -> String {
        paint(self.as_ref(), Tone::Muted)
    }
}

impl Colorize for str {}

impl Colorize for String {}
