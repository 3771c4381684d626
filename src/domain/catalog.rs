//! In-memory catalog of requirements and requirement sets.
//!
//! The [`Catalog`] knows nothing about files or YAML. It stores records by
//! name, keeps secondary id indices, and tracks which references between
//! entries cannot be resolved. Mutations never fail: records without a usable
//! name are skipped, and referential problems are reported through
//! [`Catalog::unresolved_set_links`], [`Catalog::unresolved_requirements`] and
//! [`Catalog::has_cycle`].

use std::collections::{BTreeMap, BTreeSet};

use nonempty::NonEmpty;
use tracing::instrument;

use crate::domain::{
    Config, Name, RecordId, Requirement, RequirementSet,
    link_graph::LinkGraph,
    record::{RequirementRecord, RequirementSetRecord},
    requirement::{DEFAULT_OPERATORS, DEFAULT_REQUIREMENT_TYPES},
};

/// Unresolved references, keyed by the name of the set that holds them.
///
/// A set with no unresolved references has no entry at all.
pub type Unresolved = BTreeMap<Name, NonEmpty<String>>;

/// A name-indexed store of requirements and requirement sets.
///
/// The catalog is mutated through `&mut self`; share it between threads by
/// wrapping the whole catalog in a single lock, since the id indices and the
/// unresolved maps must change together with the entries they describe.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    requirements_by_name: BTreeMap<Name, Requirement>,
    sets_by_name: BTreeMap<Name, RequirementSet>,

    /// Secondary index from backend id to requirement name.
    requirement_ids: BTreeMap<RecordId, Name>,
    /// Secondary index from backend id to set name.
    set_ids: BTreeMap<RecordId, Name>,

    known_operators: BTreeSet<String>,
    known_requirement_types: BTreeSet<String>,

    unresolved_set_links: Unresolved,
    unresolved_requirements: Unresolved,
}

/// Outcome of a batch upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertReport {
    /// Number of records merged into the catalog.
    pub accepted: usize,
    /// Positions (within the batch) of records skipped for lacking a name.
    pub skipped: Vec<usize>,
}

impl UpsertReport {
    /// Whether every record in the batch was accepted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            requirements_by_name: BTreeMap::new(),
            sets_by_name: BTreeMap::new(),
            requirement_ids: BTreeMap::new(),
            set_ids: BTreeMap::new(),
            known_operators: DEFAULT_OPERATORS.iter().map(ToString::to_string).collect(),
            known_requirement_types: DEFAULT_REQUIREMENT_TYPES
                .iter()
                .map(ToString::to_string)
                .collect(),
            unresolved_set_links: BTreeMap::new(),
            unresolved_requirements: BTreeMap::new(),
        }
    }
}

impl Catalog {
    /// Creates an empty catalog whose vocabulary includes the configured
    /// operators and requirement types.
    #[must_use]
    pub fn with_config(config: &Config) -> Self {
        let mut catalog = Self::default();
        catalog
            .known_operators
            .extend(config.operators().iter().cloned());
        catalog
            .known_requirement_types
            .extend(config.requirement_types().iter().cloned());
        catalog
    }

    /// Removes every entry and diagnostic. The known vocabulary is kept.
    pub fn reset(&mut self) {
        self.requirements_by_name.clear();
        self.sets_by_name.clear();
        self.requirement_ids.clear();
        self.set_ids.clear();
        self.unresolved_set_links.clear();
        self.unresolved_requirements.clear();
    }

    /// Inserts or merges a requirement.
    ///
    /// Returns `false` (and changes nothing) if the record has no non-empty
    /// name.
    #[instrument(level = "debug", skip(self, record), fields(name = ?record.name))]
    pub fn upsert_requirement(&mut self, record: RequirementRecord) -> bool {
        if !self.merge_requirement(record) {
            return false;
        }
        self.revalidate_links();
        true
    }

    /// Inserts or merges a batch of requirements, then revalidates every set.
    #[instrument(level = "debug", skip_all)]
    pub fn upsert_requirements(
        &mut self,
        records: impl IntoIterator<Item = RequirementRecord>,
    ) -> UpsertReport {
        let mut report = UpsertReport::default();
        for (position, record) in records.into_iter().enumerate() {
            if self.merge_requirement(record) {
                report.accepted += 1;
            } else {
                report.skipped.push(position);
            }
        }
        self.revalidate_links();
        report
    }

    fn merge_requirement(&mut self, record: RequirementRecord) -> bool {
        let Some(name) = record.key() else {
            tracing::warn!("skipping requirement without a name");
            return false;
        };

        if let Some(id) = &record.id {
            self.requirement_ids.insert(id.clone(), name.clone());
        }

        let requirement = self
            .requirements_by_name
            .entry(name.clone())
            .or_insert_with(|| Requirement::new(name));
        requirement.merge(record);

        self.known_requirement_types
            .extend(requirement.requirement_types.iter().cloned());
        self.known_operators
            .extend(requirement.operators.iter().cloned());

        true
    }

    /// Removes a requirement and every id pointing at it.
    ///
    /// Returns `true` if the requirement existed.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_requirement_by_name(&mut self, name: &str) -> bool {
        self.requirement_ids.retain(|_, n| n.as_str() != name);
        let existed = self.requirements_by_name.remove(name).is_some();
        self.revalidate_links();
        existed
    }

    /// Inserts or merges a requirement set.
    ///
    /// Revalidates the upserted set, plus any set whose unresolved links
    /// named it. Returns `false` (and changes nothing) if the record has no
    /// non-empty name.
    #[instrument(level = "debug", skip(self, record), fields(name = ?record.name))]
    pub fn upsert_requirement_set(&mut self, record: RequirementSetRecord) -> bool {
        let Some(name) = self.merge_set(record) else {
            return false;
        };

        self.revalidate_links_for_set(name.as_str());

        let dependents: Vec<Name> = self
            .unresolved_set_links
            .iter()
            .filter(|(_, missing)| missing.iter().any(|target| target == name.as_str()))
            .map(|(set, _)| set.clone())
            .collect();
        for dependent in dependents {
            self.revalidate_links_for_set(dependent.as_str());
        }

        true
    }

    /// Inserts or merges a batch of requirement sets, then revalidates every
    /// set.
    #[instrument(level = "debug", skip_all)]
    pub fn upsert_requirement_sets(
        &mut self,
        records: impl IntoIterator<Item = RequirementSetRecord>,
    ) -> UpsertReport {
        let mut report = UpsertReport::default();
        for (position, record) in records.into_iter().enumerate() {
            if self.merge_set(record).is_some() {
                report.accepted += 1;
            } else {
                report.skipped.push(position);
            }
        }
        self.revalidate_links();
        report
    }

    fn merge_set(&mut self, record: RequirementSetRecord) -> Option<Name> {
        let Some(name) = record.key() else {
            tracing::warn!("skipping requirement set without a name");
            return None;
        };

        if let Some(id) = &record.id {
            self.set_ids.insert(id.clone(), name.clone());
        }

        self.sets_by_name
            .entry(name.clone())
            .or_insert_with(|| RequirementSet::new(name.clone()))
            .merge(record);

        Some(name)
    }

    /// Removes a requirement set, every id pointing at it and its diagnostics,
    /// then revalidates every remaining set.
    ///
    /// Returns `true` if the set existed.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_requirement_set_by_name(&mut self, name: &str) -> bool {
        self.set_ids.retain(|_, n| n.as_str() != name);
        let existed = self.sets_by_name.remove(name).is_some();
        self.unresolved_set_links.remove(name);
        self.unresolved_requirements.remove(name);
        self.revalidate_links();
        existed
    }

    /// Recomputes the unresolved maps for every set from scratch.
    pub fn revalidate_links(&mut self) {
        let mut unresolved_set_links = Unresolved::new();
        let mut unresolved_requirements = Unresolved::new();

        for set in self.sets_by_name.values() {
            let (missing_sets, missing_requirements) = self.missing_references(set);
            if let Some(missing) = missing_sets {
                unresolved_set_links.insert(set.name.clone(), missing);
            }
            if let Some(missing) = missing_requirements {
                unresolved_requirements.insert(set.name.clone(), missing);
            }
        }

        self.unresolved_set_links = unresolved_set_links;
        self.unresolved_requirements = unresolved_requirements;

        tracing::trace!(
            unresolved_links = self.unresolved_set_links.len(),
            unresolved_requirements = self.unresolved_requirements.len(),
            "revalidated catalog"
        );
    }

    /// Recomputes the unresolved links and requirements of a single set.
    ///
    /// Entries are written only when something is missing and removed
    /// otherwise. Unknown set names are ignored.
    pub fn revalidate_links_for_set(&mut self, name: &str) {
        let Some(set) = self.sets_by_name.get(name) else {
            return;
        };
        let (missing_sets, missing_requirements) = self.missing_references(set);
        let key = set.name.clone();

        self.unresolved_set_links.remove(name);
        self.unresolved_requirements.remove(name);
        if let Some(missing) = missing_sets {
            self.unresolved_set_links.insert(key.clone(), missing);
        }
        if let Some(missing) = missing_requirements {
            self.unresolved_requirements.insert(key, missing);
        }
    }

    /// The links and requirements of `set` that are not in the catalog.
    fn missing_references(
        &self,
        set: &RequirementSet,
    ) -> (Option<NonEmpty<String>>, Option<NonEmpty<String>>) {
        let missing_sets: Vec<String> = set
            .links_to_sets
            .iter()
            .filter(|target| !self.sets_by_name.contains_key(target.as_str()))
            .cloned()
            .collect();
        let missing_requirements: Vec<String> = set
            .requirements
            .iter()
            .filter(|target| !self.requirements_by_name.contains_key(target.as_str()))
            .cloned()
            .collect();

        (
            NonEmpty::from_vec(missing_sets),
            NonEmpty::from_vec(missing_requirements),
        )
    }

    /// Every set reachable from `root` through `links_to_sets`, in depth-first
    /// post-order.
    ///
    /// Linked sets appear before the sets linking to them and `root` comes
    /// last. Each set appears once, even when links form a cycle. Names that
    /// are not in the catalog are omitted, so an unknown root yields an empty
    /// list.
    #[must_use]
    pub fn linked_sets(&self, root: &str) -> Vec<&Name> {
        LinkGraph::new(&self.sets_by_name).post_order(root)
    }

    /// Whether the set links contain a cycle.
    ///
    /// With a `root`, only sets reachable from it are considered; otherwise the
    /// whole catalog is checked.
    #[must_use]
    pub fn has_cycle(&self, root: Option<&str>) -> bool {
        let graph = LinkGraph::new(&self.sets_by_name);
        match root {
            Some(root) => graph.has_cycle_from(root),
            None => graph.has_cycle(),
        }
    }

    /// Every cycle in the set links, as sorted lists of set names.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<Name>> {
        LinkGraph::new(&self.sets_by_name).cycles()
    }

    /// Whether every reference resolves and no cycle exists.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.unresolved_set_links.is_empty()
            && self.unresolved_requirements.is_empty()
            && !self.has_cycle(None)
    }

    /// Links to sets that are not in the catalog.
    #[must_use]
    pub const fn unresolved_set_links(&self) -> &Unresolved {
        &self.unresolved_set_links
    }

    /// Requirement references that are not in the catalog.
    #[must_use]
    pub const fn unresolved_requirements(&self) -> &Unresolved {
        &self.unresolved_requirements
    }

    /// Looks up a requirement by name.
    #[must_use]
    pub fn requirement(&self, name: &str) -> Option<&Requirement> {
        self.requirements_by_name.get(name)
    }

    /// Looks up a requirement set by name.
    #[must_use]
    pub fn requirement_set(&self, name: &str) -> Option<&RequirementSet> {
        self.sets_by_name.get(name)
    }

    /// Looks up a requirement by backend id.
    #[must_use]
    pub fn requirement_by_id(&self, id: &RecordId) -> Option<&Requirement> {
        let name = self.requirement_ids.get(id)?;
        self.requirements_by_name.get(name)
    }

    /// Looks up a requirement set by backend id.
    #[must_use]
    pub fn requirement_set_by_id(&self, id: &RecordId) -> Option<&RequirementSet> {
        let name = self.set_ids.get(id)?;
        self.sets_by_name.get(name)
    }

    /// All requirements, ordered by name.
    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements_by_name.values()
    }

    /// All requirement sets, ordered by name.
    pub fn requirement_sets(&self) -> impl Iterator<Item = &RequirementSet> {
        self.sets_by_name.values()
    }

    /// Number of requirements.
    #[must_use]
    pub fn requirement_count(&self) -> usize {
        self.requirements_by_name.len()
    }

    /// Number of requirement sets.
    #[must_use]
    pub fn requirement_set_count(&self) -> usize {
        self.sets_by_name.len()
    }

    /// Total number of entries (requirements and sets).
    #[must_use]
    pub fn len(&self) -> usize {
        self.requirement_count() + self.requirement_set_count()
    }

    /// Whether the catalog holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Operators seen so far, including the built-in vocabulary.
    #[must_use]
    pub const fn known_operators(&self) -> &BTreeSet<String> {
        &self.known_operators
    }

    /// Requirement types seen so far, including the built-in vocabulary.
    #[must_use]
    pub const fn known_requirement_types(&self) -> &BTreeSet<String> {
        &self.known_requirement_types
    }
}
