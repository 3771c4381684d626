use std::path::PathBuf;

use clap::Parser;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
pub struct Linked {
    /// The name of the requirement set to start from
    set: String,

    /// Print one name per line without decoration
    #[arg(long)]
    quiet: bool,
}

impl Linked {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let directory = super::load(root)?;
        let catalog = directory.catalog();

        let Some(set) = catalog.requirement_set(&self.set) else {
            anyhow::bail!("requirement set '{}' not found", self.set);
        };

        let linked = catalog.linked_sets(&self.set);

        if self.quiet {
            for name in linked {
                println!("{name}");
            }
            return Ok(());
        }

        println!(
            "{} ({}, {} members)",
            set.name,
            set.requirement_set_type,
            set.member_count()
        );
        for (position, name) in linked.iter().enumerate() {
            let requirements = catalog
                .requirement_set(name)
                .map_or(0, |set| set.requirements.len());
            println!(
                "  {:>3}. {name} {}",
                position + 1,
                format!("({requirements} requirements)").dim()
            );
        }

        if catalog.has_cycle(Some(&self.set)) {
            println!("\n{}", "Links reachable from this set form a cycle".warning());
        }
        if let Some(missing) = catalog.unresolved_set_links().get(self.set.as_str()) {
            let missing: Vec<&str> = missing.iter().map(String::as_str).collect();
            println!(
                "{}",
                format!("Unresolved links skipped: {}", missing.join(", ")).dim()
            );
        }

        Ok(())
    }
}
