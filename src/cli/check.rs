use std::{path::PathBuf, process};

use clap::Parser;
use lxcore::{Catalog, Config, domain::Unresolved};
use serde::Serialize;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Report unresolved references and link cycles")]
pub struct Check {
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

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct MissingReference {
    set: String,
    missing: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
struct CheckResult {
    unresolved_set_links: Vec<MissingReference>,
    unresolved_requirements: Vec<MissingReference>,
    cycles: Vec<Vec<String>>,
}

impl CheckResult {
    fn new(catalog: &Catalog) -> Self {
        let collect = |unresolved: &Unresolved| -> Vec<MissingReference> {
            unresolved
                .iter()
                .map(|(set, missing)| MissingReference {
                    set: set.to_string(),
                    missing: missing.iter().cloned().collect(),
                })
                .collect()
        };

        Self {
            unresolved_set_links: collect(catalog.unresolved_set_links()),
            unresolved_requirements: collect(catalog.unresolved_requirements()),
            cycles: catalog
                .cycles()
                .into_iter()
                .map(|cycle| cycle.iter().map(ToString::to_string).collect())
                .collect(),
        }
    }

    fn unresolved_count(&self) -> usize {
        self.unresolved_set_links
            .iter()
            .chain(&self.unresolved_requirements)
            .map(|reference| reference.missing.len())
            .sum()
    }

    fn issue_count(&self) -> usize {
        self.unresolved_count() + self.cycles.len()
    }

    /// Cycles always fail; unresolved references fail unless the configuration
    /// allows them.
    fn fails(&self, config: &Config) -> bool {
        !self.cycles.is_empty() || (!config.allow_unresolved && self.unresolved_count() > 0)
    }
}

impl Check {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let directory = super::load(root)?;
        let result = CheckResult::new(directory.catalog());
        let fails = result.fails(directory.config());

        match self.output {
            OutputFormat::Table => Self::output_table(&result, fails),
            OutputFormat::Json => Self::output_json(&result, fails)?,
        }

        if fails {
            process::exit(2);
        }

        Ok(())
    }

    fn output_table(result: &CheckResult, fails: bool) {
        println!("Checking rule data...\n");

        Self::print_references("Set links", &result.unresolved_set_links, "set");
        Self::print_references(
            "Requirements",
            &result.unresolved_requirements,
            "requirement",
        );

        if result.cycles.is_empty() {
            println!("✓ Cycles:       No link cycles");
        } else {
            println!(
                "{}",
                format!("✗ Cycles:       {} link cycles found", result.cycles.len()).error()
            );
            for cycle in &result.cycles {
                println!("    {}", cycle.join(" -> "));
            }
        }

        let total = result.issue_count();
        if total == 0 {
            println!("\n{}", "Catalog is consistent (0 issues)".success());
        } else if fails {
            println!("\n{}", format!("Summary: {total} issues found").error());
        } else {
            println!(
                "\n{}",
                format!("Summary: {total} issues found (unresolved references allowed)").warning()
            );
        }
    }

    fn print_references(title: &str, references: &[MissingReference], noun: &str) {
        let label = format!("{title}:");
        if references.is_empty() {
            println!("✓ {label:<13} All references resolve");
            return;
        }

        let missing: usize = references.iter().map(|r| r.missing.len()).sum();
        println!(
            "{}",
            format!("✗ {label:<13} {missing} unknown {noun} references").warning()
        );
        for reference in references {
            println!(
                "    {} {}",
                reference.set,
                format!("-> {}", reference.missing.join(", ")).dim()
            );
        }
    }

    fn output_json(result: &CheckResult, fails: bool) -> anyhow::Result<()> {
        use serde_json::json;

        let status = if fails {
            "failed"
        } else if result.issue_count() == 0 {
            "consistent"
        } else {
            "issues_allowed"
        };

        let output = json!({
            "status": status,
            "issues": result,
            "summary": {
                "total_issues": result.issue_count(),
                "unresolved": result.unresolved_count(),
                "cycles": result.cycles.len(),
            }
        });

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use lxcore::{RequirementRecord, RequirementSetRecord, domain::OneOrMany};

    use super::*;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::default();
        catalog.upsert_requirement(RequirementRecord::named("age_gte_18"));
        catalog.upsert_requirement_set(RequirementSetRecord {
            requirements: Some(OneOrMany::Many(vec![
                "age_gte_18".to_string(),
                "is_pregnant".to_string(),
            ])),
            ..RequirementSetRecord::linking("screening", ["exclusions", "followup"])
        });
        catalog
    }

    #[test]
    fn unresolved_references_are_listed() {
        let result = CheckResult::new(&catalog());

        assert_eq!(
            result.unresolved_set_links,
            vec![MissingReference {
                set: "screening".to_string(),
                missing: vec!["exclusions".to_string(), "followup".to_string()],
            }]
        );
        assert_eq!(result.unresolved_requirements[0].missing, vec!["is_pregnant"]);
        assert_eq!(result.issue_count(), 3);
    }

    #[test]
    fn unresolved_references_may_be_allowed() {
        let result = CheckResult::new(&catalog());
        let mut config = Config::default();
        assert!(result.fails(&config));

        config.allow_unresolved = true;
        assert!(!result.fails(&config));
    }

    #[test]
    fn cycles_always_fail() {
        let mut catalog = Catalog::default();
        catalog.upsert_requirement_sets([
            RequirementSetRecord::linking("a", ["b"]),
            RequirementSetRecord::linking("b", ["a"]),
        ]);

        let result = CheckResult::new(&catalog);
        assert_eq!(result.cycles, vec![vec!["a".to_string(), "b".to_string()]]);

        let mut config = Config::default();
        config.allow_unresolved = true;
        assert!(result.fails(&config));
    }
}
