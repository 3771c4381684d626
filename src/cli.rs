use std::path::{Path, PathBuf};

mod check;
mod convert;
mod linked;
mod segments;
mod status;
mod terminal;

use check::Check;
use clap::ArgAction;
use convert::Convert;
use linked::Linked;
use lxcore::{Config, Directory, storage::directory::Loaded, timing::FrameRate};
use segments::Segments;
use status::Status;

/// Parse a frame rate, rejecting values that are not positive and finite.
fn parse_fps(s: &str) -> Result<FrameRate, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    FrameRate::try_from(value).map_err(|e| e.to_string())
}

/// Read `config.toml` at `root`, falling back to the defaults.
fn load_config(root: &Path) -> Config {
    Config::load(&root.join("config.toml")).unwrap_or_else(|e| {
        tracing::debug!("Failed to load config: {e}");
        Config::default()
    })
}

/// Load the rule data below `root`.
fn load(root: PathBuf) -> anyhow::Result<Directory<Loaded>> {
    Ok(Directory::new(root).load_all()?)
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the root of the rule data directory
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Status(Status::default()))
            .run(self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show catalog counts and consistency (default)
    Status(Status),

    /// Report unresolved references and link cycles
    Check(Check),

    /// List the sets reachable from a requirement set
    ///
    /// Sets are printed in post-order: every linked set appears before the
    /// set that links to it, and the starting set comes last.
    Linked(Linked),

    /// Convert between seconds and frames
    Convert(Convert),

    /// Normalise annotation segments and lay them out on a timeline
    Segments(Segments),
}

impl Command {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::Status(command) => command.run(root)?,
            Self::Check(command) => command.run(root)?,
            Self::Linked(command) => command.run(root)?,
            Self::Convert(command) => command.run(&root)?,
            Self::Segments(command) => command.run(&root)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn defaults_to_status() {
        let cli = Cli::try_parse_from(["lx"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.root, PathBuf::from("."));
    }

    #[test]
    fn verbosity_is_counted() {
        let cli = Cli::try_parse_from(["lx", "-vv", "status"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn frame_rate_must_be_positive() {
        assert_eq!(parse_fps("25").unwrap().get(), 25.0);
        assert!(parse_fps("0").is_err());
        assert!(parse_fps("-30").is_err());
        assert!(parse_fps("fast").is_err());
    }

    #[test]
    fn convert_arguments() {
        let cli = Cli::try_parse_from(["lx", "convert", "150", "--frames", "--fps", "30"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Convert(_))));
        assert!(Cli::try_parse_from(["lx", "convert", "1", "--fps", "0"]).is_err());
    }
}
