//! `lx`: inspect clinical rule data and convert video annotation timings.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
