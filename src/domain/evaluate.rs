//! Evaluation of requirement sets against caller-supplied facts.
//!
//! The catalog does not know how to decide an individual [`Requirement`]; that
//! needs patient data. Callers pass a predicate for requirements and the
//! catalog combines the answers through each set's [`RequirementSetType`],
//! recursing into linked sets.
//!
//! [`RequirementSetType`]: crate::domain::RequirementSetType

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::domain::{Catalog, Requirement};

/// Reasons a requirement set cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// The set to evaluate, or a set it links to, is not in the catalog.
    #[error("requirement set '{0}' not found")]
    SetNotFound(String),
    /// A set references a requirement that is not in the catalog.
    #[error("requirement set '{set}' references unknown requirement '{requirement}'")]
    RequirementNotFound {
        /// The referencing set.
        set: String,
        /// The missing requirement.
        requirement: String,
    },
    /// The set links back to itself, directly or indirectly.
    #[error("requirement set '{0}' is part of a link cycle")]
    Cycle(String),
}

struct Evaluator<'a, F> {
    catalog: &'a Catalog,
    predicate: F,
    in_progress: HashSet<&'a str>,
    done: HashMap<&'a str, bool>,
}

impl<'a, F> Evaluator<'a, F>
where
    F: FnMut(&Requirement) -> bool,
{
    fn evaluate(&mut self, name: &str) -> Result<bool, EvaluationError> {
        let catalog = self.catalog;
        let set = catalog
            .requirement_set(name)
            .ok_or_else(|| EvaluationError::SetNotFound(name.to_string()))?;
        let key = set.name.as_str();

        if let Some(&result) = self.done.get(key) {
            return Ok(result);
        }
        if !self.in_progress.insert(key) {
            return Err(EvaluationError::Cycle(key.to_string()));
        }

        let mut satisfied = 0;
        for requirement_name in &set.requirements {
            let requirement = catalog
                .requirement(requirement_name)
                .ok_or_else(|| EvaluationError::RequirementNotFound {
                    set: key.to_string(),
                    requirement: requirement_name.clone(),
                })?;
            if (self.predicate)(requirement) {
                satisfied += 1;
            }
        }
        for linked in &set.links_to_sets {
            if self.evaluate(linked)? {
                satisfied += 1;
            }
        }

        let result = set
            .requirement_set_type
            .accepts(satisfied, set.member_count());

        self.in_progress.remove(key);
        self.done.insert(key, result);
        tracing::trace!(set = key, satisfied, result, "evaluated requirement set");
        Ok(result)
    }
}

impl Catalog {
    /// Evaluates a requirement set.
    ///
    /// Each member requirement counts as satisfied when `predicate` returns
    /// `true` for it; each linked set counts as satisfied when it evaluates to
    /// `true`. The counts are then combined through the set's type. Sets shared
    /// by several parents are evaluated once.
    ///
    /// # Errors
    ///
    /// Returns an [`EvaluationError`] if a referenced set or requirement is
    /// missing, or if the links reachable from `name` form a cycle.
    pub fn evaluate_set<F>(&self, name: &str, predicate: F) -> Result<bool, EvaluationError>
    where
        F: FnMut(&Requirement) -> bool,
    {
        Evaluator {
            catalog: self,
            predicate,
            in_progress: HashSet::new(),
            done: HashMap::new(),
        }
        .evaluate(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        RequirementSetType,
        record::{OneOrMany, RequirementRecord, RequirementSetRecord},
    };

    fn set(
        name: &str,
        kind: RequirementSetType,
        requirements: &[&str],
        links: &[&str],
    ) -> RequirementSetRecord {
        RequirementSetRecord {
            requirement_set_type: Some(kind),
            requirements: Some(OneOrMany::Many(
                requirements.iter().map(ToString::to_string).collect(),
            )),
            ..RequirementSetRecord::linking(name, links.iter().copied())
        }
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::default();
        catalog.upsert_requirements(
            ["age_gte_18", "has_colonoscopy", "has_polyp", "is_pregnant"]
                .into_iter()
                .map(RequirementRecord::named),
        );
        catalog.upsert_requirement_sets([
            set(
                "screening",
                RequirementSetType::All,
                &["age_gte_18"],
                &["exam", "exclusions"],
            ),
            set(
                "exam",
                RequirementSetType::Any,
                &["has_colonoscopy", "has_polyp"],
                &[],
            ),
            set("exclusions", RequirementSetType::None, &["is_pregnant"], &[]),
        ]);
        catalog
    }

    fn facts<'a>(facts: &'a [&'a str]) -> impl FnMut(&Requirement) -> bool + 'a {
        move |requirement| facts.contains(&requirement.name.as_str())
    }

    #[test]
    fn nested_sets_combine() {
        let catalog = catalog();

        assert_eq!(
            catalog.evaluate_set("screening", facts(&["age_gte_18", "has_polyp"])),
            Ok(true)
        );
        assert_eq!(
            catalog.evaluate_set(
                "screening",
                facts(&["age_gte_18", "has_polyp", "is_pregnant"])
            ),
            Ok(false)
        );
        assert_eq!(
            catalog.evaluate_set("screening", facts(&["age_gte_18"])),
            Ok(false)
        );
    }

    #[test]
    fn missing_references_are_errors() {
        let mut catalog = catalog();
        catalog.upsert_requirement_set(set("broken", RequirementSetType::All, &["ghost"], &[]));
        catalog.upsert_requirement_set(set("dangling", RequirementSetType::All, &[], &["nowhere"]));

        assert_eq!(
            catalog.evaluate_set("broken", facts(&[])),
            Err(EvaluationError::RequirementNotFound {
                set: "broken".to_string(),
                requirement: "ghost".to_string(),
            })
        );
        assert_eq!(
            catalog.evaluate_set("dangling", facts(&[])),
            Err(EvaluationError::SetNotFound("nowhere".to_string()))
        );
        assert_eq!(
            catalog.evaluate_set("absent", facts(&[])),
            Err(EvaluationError::SetNotFound("absent".to_string()))
        );
    }

    #[test]
    fn cycles_are_errors() {
        let mut catalog = Catalog::default();
        catalog.upsert_requirement_sets([
            set("X", RequirementSetType::All, &[], &["Y"]),
            set("Y", RequirementSetType::All, &[], &["X"]),
        ]);

        assert_eq!(
            catalog.evaluate_set("X", facts(&[])),
            Err(EvaluationError::Cycle("X".to_string()))
        );
    }

    #[test]
    fn shared_sets_are_evaluated_once() {
        let mut catalog = Catalog::default();
        catalog.upsert_requirement(RequirementRecord::named("r"));
        catalog.upsert_requirement_sets([
            set("top", RequirementSetType::All, &[], &["left", "right"]),
            set("left", RequirementSetType::All, &[], &["shared"]),
            set("right", RequirementSetType::All, &[], &["shared"]),
            set("shared", RequirementSetType::All, &["r"], &[]),
        ]);

        let mut calls = 0;
        let result = catalog.evaluate_set("top", |_| {
            calls += 1;
            true
        });

        assert_eq!(result, Ok(true));
        assert_eq!(calls, 1);
    }
}
