use std::path::PathBuf;

use clap::Parser;
use lxcore::Catalog;
use serde::Serialize;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser, Default)]
#[command(about = "Show catalog counts and consistency")]
pub struct Status {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress headers and format for scripting
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
struct Summary {
    requirements: usize,
    requirement_sets: usize,
    operators: usize,
    requirement_types: usize,
    sets_with_unresolved_links: usize,
    sets_with_unresolved_requirements: usize,
    cycles: usize,
    skipped_entries: usize,
}

impl Summary {
    fn new(catalog: &Catalog, skipped_entries: usize) -> Self {
        Self {
            requirements: catalog.requirement_count(),
            requirement_sets: catalog.requirement_set_count(),
            operators: catalog.known_operators().len(),
            requirement_types: catalog.known_requirement_types().len(),
            sets_with_unresolved_links: catalog.unresolved_set_links().len(),
            sets_with_unresolved_requirements: catalog.unresolved_requirements().len(),
            cycles: catalog.cycles().len(),
            skipped_entries,
        }
    }

    const fn is_healthy(&self) -> bool {
        self.sets_with_unresolved_links == 0
            && self.sets_with_unresolved_requirements == 0
            && self.cycles == 0
    }
}

impl Status {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let directory = super::load(root)?;
        let summary = Summary::new(directory.catalog(), directory.skipped_entries());

        match self.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            OutputFormat::Table if self.quiet => Self::output_quiet(&summary),
            OutputFormat::Table => Self::output_table(&summary),
        }

        Ok(())
    }

    fn output_quiet(summary: &Summary) {
        println!(
            "requirements={} sets={} unresolved={} cycles={}",
            summary.requirements,
            summary.requirement_sets,
            summary.sets_with_unresolved_links + summary.sets_with_unresolved_requirements,
            summary.cycles
        );
    }

    fn output_table(summary: &Summary) {
        if summary.requirements == 0 && summary.requirement_sets == 0 {
            println!("No rule data found yet. Add YAML files below the root directory.");
            return;
        }

        println!("{:<26} {:>6}", "Requirements", summary.requirements);
        println!("{:<26} {:>6}", "Requirement sets", summary.requirement_sets);
        println!("{:<26} {:>6}", "Operators", summary.operators);
        println!("{:<26} {:>6}", "Requirement types", summary.requirement_types);
        if summary.skipped_entries > 0 {
            println!(
                "{}",
                format!("{:<26} {:>6}", "Skipped entries", summary.skipped_entries).dim()
            );
        }
        println!();

        if summary.is_healthy() {
            println!("{}", "Catalog is consistent".success());
        } else {
            println!(
                "{}",
                format!(
                    "{} sets with unresolved links, {} with unresolved requirements, {} cycles",
                    summary.sets_with_unresolved_links,
                    summary.sets_with_unresolved_requirements,
                    summary.cycles
                )
                .warning()
            );
            println!("{}", "Run 'lx check' for details".dim());
        }
    }
}

#[cfg(test)]
mod tests {
    use lxcore::{RequirementRecord, RequirementSetRecord};

    use super::*;

    #[test]
    fn summary_counts_unresolved_sets() {
        let mut catalog = Catalog::default();
        catalog.upsert_requirement(RequirementRecord::named("age_gte_18"));
        catalog.upsert_requirement_sets([
            RequirementSetRecord::linking("screening", ["exclusions"]),
            RequirementSetRecord::linking("loop", ["loop"]),
        ]);

        let summary = Summary::new(&catalog, 1);
        assert_eq!(summary.requirements, 1);
        assert_eq!(summary.requirement_sets, 2);
        assert_eq!(summary.sets_with_unresolved_links, 1);
        assert_eq!(summary.cycles, 1);
        assert_eq!(summary.skipped_entries, 1);
        assert!(!summary.is_healthy());
    }

    #[test]
    fn empty_catalog_is_healthy() {
        assert!(Summary::new(&Catalog::default(), 0).is_healthy());
    }
}
