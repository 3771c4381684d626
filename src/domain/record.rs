//! Decoded input records for the catalog.
//!
//! Records mirror what arrives from YAML files or an API: every field is
//! optional and list fields accept either a single value or a list. The
//! catalog merges records into its stored [`Requirement`]s and
//! [`RequirementSet`]s.
//!
//! [`Requirement`]: crate::domain::Requirement
//! [`RequirementSet`]: crate::domain::RequirementSet

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Name, RecordId, RequirementSetType};

/// A value that may be given either as a scalar or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single value.
    One(T),
    /// A list of values.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Flattens the value into a list.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        Self::Many(values)
    }
}

/// Normalises an optional scalar-or-list into a list.
///
/// Absence and a lone empty string both become an empty list.
pub(crate) fn listify(value: Option<OneOrMany<String>>) -> Vec<String> {
    match value {
        Some(OneOrMany::One(value)) if !value.is_empty() => vec![value],
        Some(OneOrMany::Many(values)) => values,
        _ => Vec::new(),
    }
}

/// A requirement as supplied to [`Catalog::upsert_requirement`].
///
/// [`Catalog::upsert_requirement`]: crate::domain::Catalog::upsert_requirement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequirementRecord {
    /// Backend id, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Catalog key. Records without a non-empty name are skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// German display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_de: Option<String>,
    /// English display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    /// Free text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The kinds of data this requirement inspects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement_types: Option<OneOrMany<String>>,
    /// The operators used to evaluate this requirement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operators: Option<OneOrMany<String>>,
    /// Threshold value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<f64>,
    /// Lower bound of a numeric range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_value_min: Option<f64>,
    /// Upper bound of a numeric range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_value_max: Option<f64>,
    /// Unit of the numeric values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Linked finding names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub findings: Option<OneOrMany<String>>,
    /// Linked finding classification names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finding_classifications: Option<OneOrMany<String>>,
    /// Linked finding classification choice names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finding_classification_choices: Option<OneOrMany<String>>,
    /// Linked lab value names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_values: Option<OneOrMany<String>>,
    /// Linked disease names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diseases: Option<OneOrMany<String>>,
    /// Linked gender names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genders: Option<OneOrMany<String>>,
    /// Any further fields, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl RequirementRecord {
    /// Creates a record carrying only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Returns the catalog key, or `None` if the record has no usable name.
    #[must_use]
    pub fn key(&self) -> Option<Name> {
        self.name.clone().and_then(|name| Name::new(name).ok())
    }
}

/// A requirement set as supplied to [`Catalog::upsert_requirement_set`].
///
/// [`Catalog::upsert_requirement_set`]: crate::domain::Catalog::upsert_requirement_set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequirementSetRecord {
    /// Backend id, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Catalog key. Records without a non-empty name are skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// German display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_de: Option<String>,
    /// English display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    /// Free text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// How the members of the set combine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement_set_type: Option<RequirementSetType>,
    /// Names of member requirements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<OneOrMany<String>>,
    /// Names of linked requirement sets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links_to_sets: Option<OneOrMany<String>>,
    /// Any further fields, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl RequirementSetRecord {
    /// Creates a record with a name and links to other sets.
    #[must_use]
    pub fn linking<I, S>(name: impl Into<String>, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: Some(name.into()),
            links_to_sets: Some(OneOrMany::Many(links.into_iter().map(Into::into).collect())),
            ..Self::default()
        }
    }

    /// Returns the catalog key, or `None` if the record has no usable name.
    #[must_use]
    pub fn key(&self) -> Option<Name> {
        self.name.clone().and_then(|name| Name::new(name).ok())
    }
}
