//! YAML ingestion of requirement and requirement set records.
//!
//! Rule data is stored as YAML sequences. Each entry is either a bare record or
//! a fixture-style wrapper whose record lives under `fields`:
//!
//! ```yaml
//! - model: endoreg_db.requirement
//!   fields:
//!     name: age_gte_18
//!     requirement_types: [patient]
//!     operators: [age_gte]
//!     numeric_value: 18
//! ```
//!
//! Entries without a string `name`, or that do not decode, are skipped with a
//! warning. A document that is not a sequence contributes no entries.

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

use crate::domain::{Catalog, RequirementRecord, RequirementSetRecord, UpsertReport};

/// Error returned when rule data cannot be read.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The text is not valid YAML.
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// A file could not be read.
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

/// Which kind of record a YAML entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A single requirement.
    Requirement,
    /// A requirement set.
    RequirementSet,
}

/// Records decoded from a document that may mix requirements and sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entries {
    /// Decoded requirements, in document order.
    pub requirements: Vec<RequirementRecord>,
    /// Decoded requirement sets, in document order.
    pub sets: Vec<RequirementSetRecord>,
    /// Number of entries that were skipped.
    pub skipped: usize,
}

impl Entries {
    /// Appends the entries of another document.
    pub fn extend(&mut self, other: Self) {
        self.requirements.extend(other.requirements);
        self.sets.extend(other.sets);
        self.skipped += other.skipped;
    }

    /// Upserts the requirements, then the sets, into a catalog.
    pub fn apply(self, catalog: &mut Catalog) -> (UpsertReport, UpsertReport) {
        let requirements = catalog.upsert_requirements(self.requirements);
        let sets = catalog.upsert_requirement_sets(self.sets);
        (requirements, sets)
    }
}

/// Parses a YAML sequence of requirements.
///
/// # Errors
///
/// Returns [`LoadError::Yaml`] if the text is not valid YAML.
pub fn parse_requirements(yaml: &str) -> Result<Vec<RequirementRecord>, LoadError> {
    Ok(decode_sequence(yaml)?.records)
}

/// Parses a YAML sequence of requirement sets.
///
/// # Errors
///
/// Returns [`LoadError::Yaml`] if the text is not valid YAML.
pub fn parse_requirement_sets(yaml: &str) -> Result<Vec<RequirementSetRecord>, LoadError> {
    Ok(decode_sequence(yaml)?.records)
}

/// Parses a YAML sequence that may contain both requirements and sets.
///
/// Entries are classified by their `model` when present (a model ending in
/// `requirement_set` or `requirementset` is a set, one ending in `requirement`
/// is a requirement, anything else is skipped). Entries without a model are
/// sets if they carry set-only keys and requirements otherwise.
///
/// # Errors
///
/// Returns [`LoadError::Yaml`] if the text is not valid YAML.
pub fn parse_entries(yaml: &str) -> Result<Entries, LoadError> {
    let document: Value = serde_yaml::from_str(yaml)?;
    let Value::Sequence(items) = document else {
        return Ok(Entries::default());
    };

    let mut entries = Entries::default();
    for item in items {
        let Some(kind) = classify(&item) else {
            tracing::debug!("skipping entry of unrelated model");
            entries.skipped += 1;
            continue;
        };
        let Some(fields) = named_fields(item) else {
            entries.skipped += 1;
            continue;
        };
        let decoded = match kind {
            EntryKind::Requirement => decode(fields).map(|r| entries.requirements.push(r)),
            EntryKind::RequirementSet => decode(fields).map(|s| entries.sets.push(s)),
        };
        if decoded.is_none() {
            entries.skipped += 1;
        }
    }

    Ok(entries)
}

/// Loads requirements and then requirement sets from YAML text into a catalog.
///
/// Either document may be omitted. Requirements are upserted before sets are
/// parsed, so a malformed sets document leaves the requirements in place.
///
/// The reports list skipped entries by their position in the document,
/// whether they were dropped while decoding or by the catalog.
///
/// # Errors
///
/// Returns [`LoadError::Yaml`] if either document is not valid YAML.
pub fn load_from_yaml_strings(
    catalog: &mut Catalog,
    requirements_yaml: Option<&str>,
    sets_yaml: Option<&str>,
) -> Result<(UpsertReport, UpsertReport), LoadError> {
    let requirements = match requirements_yaml {
        Some(yaml) => {
            decode_sequence(yaml)?.upsert(|records| catalog.upsert_requirements(records))
        }
        None => UpsertReport::default(),
    };
    let sets = match sets_yaml {
        Some(yaml) => {
            decode_sequence(yaml)?.upsert(|records| catalog.upsert_requirement_sets(records))
        }
        None => UpsertReport::default(),
    };
    Ok((requirements, sets))
}

/// Records decoded from a YAML sequence.
struct Decoded<T> {
    records: Vec<T>,
    /// Document position of each decoded record.
    positions: Vec<usize>,
    /// Document positions of entries that could not be decoded.
    skipped: Vec<usize>,
}

impl<T> Decoded<T> {
    /// Upserts the records, reporting every skipped entry by document
    /// position.
    fn upsert(self, upsert: impl FnOnce(Vec<T>) -> UpsertReport) -> UpsertReport {
        let Self {
            records,
            positions,
            mut skipped,
        } = self;

        let report = upsert(records);
        skipped.extend(report.skipped.iter().map(|&index| positions[index]));
        skipped.sort_unstable();

        UpsertReport {
            accepted: report.accepted,
            skipped,
        }
    }
}

/// Decodes the entries of a sequence document, unwrapping fixture entries and
/// dropping those without a string name.
fn decode_sequence<T: DeserializeOwned>(yaml: &str) -> Result<Decoded<T>, LoadError> {
    let document: Value = serde_yaml::from_str(yaml)?;
    let mut decoded = Decoded {
        records: Vec::new(),
        positions: Vec::new(),
        skipped: Vec::new(),
    };

    let Value::Sequence(items) = document else {
        tracing::debug!("document is not a sequence, ignoring");
        return Ok(decoded);
    };

    for (position, item) in items.into_iter().enumerate() {
        if let Some(record) = named_fields(item).and_then(decode) {
            decoded.records.push(record);
            decoded.positions.push(position);
            continue;
        }
        decoded.skipped.push(position);
    }

    Ok(decoded)
}

fn decode<T: DeserializeOwned>(value: Value) -> Option<T> {
    serde_yaml::from_value(value)
        .map_err(|e| tracing::warn!("skipping malformed entry: {e}"))
        .ok()
}

/// Unwraps a fixture-style entry and checks it has a string name.
fn named_fields(item: Value) -> Option<Value> {
    let fields = match item {
        Value::Mapping(mut mapping) => match mapping.remove("fields") {
            Some(fields @ Value::Mapping(_)) => fields,
            Some(other) => {
                mapping.insert(Value::from("fields"), other);
                Value::Mapping(mapping)
            }
            None => Value::Mapping(mapping),
        },
        other => other,
    };

    let has_name = fields
        .as_mapping()
        .and_then(|mapping| mapping.get("name"))
        .is_some_and(Value::is_string);
    if has_name {
        Some(fields)
    } else {
        tracing::warn!("skipping entry without a string name");
        None
    }
}

fn classify(item: &Value) -> Option<EntryKind> {
    let mapping = item.as_mapping()?;

    if let Some(model) = mapping.get("model").and_then(Value::as_str) {
        let model = model.to_ascii_lowercase();
        return if model.ends_with("requirement_set") || model.ends_with("requirementset") {
            Some(EntryKind::RequirementSet)
        } else if model.ends_with("requirement") {
            Some(EntryKind::Requirement)
        } else {
            None
        };
    }

    let fields = match mapping.get("fields") {
        Some(Value::Mapping(fields)) => fields,
        _ => mapping,
    };
    Some(if is_set_like(fields) {
        EntryKind::RequirementSet
    } else {
        EntryKind::Requirement
    })
}

fn is_set_like(fields: &Mapping) -> bool {
    ["requirement_set_type", "links_to_sets", "requirements"]
        .iter()
        .any(|key| fields.contains_key(*key))
}
