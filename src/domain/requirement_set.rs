use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::domain::{
    Name, RecordId,
    record::{RequirementSetRecord, listify},
    requirement::replace_if_some,
};

/// How the members of a [`RequirementSet`] combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementSetType {
    /// Every member must be satisfied.
    #[default]
    All,
    /// At least one member must be satisfied.
    Any,
    /// No member may be satisfied.
    None,
    /// Exactly one member must be satisfied.
    #[serde(rename = "exactly_1")]
    Exactly1,
    /// At least one member must be satisfied.
    #[serde(rename = "at_least_1")]
    AtLeast1,
    /// At most one member may be satisfied.
    #[serde(rename = "at_most_1")]
    AtMost1,
}

impl RequirementSetType {
    /// Decides whether a set of this type holds, given how many of its
    /// `total` members are satisfied.
    ///
    /// An empty `all` set holds, an empty `any` set does not.
    #[must_use]
    pub const fn accepts(self, satisfied: usize, total: usize) -> bool {
        match self {
            Self::All => satisfied == total,
            Self::Any | Self::AtLeast1 => satisfied >= 1,
            Self::None => satisfied == 0,
            Self::Exactly1 => satisfied == 1,
            Self::AtMost1 => satisfied <= 1,
        }
    }

    /// The serialized form of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Any => "any",
            Self::None => "none",
            Self::Exactly1 => "exactly_1",
            Self::AtLeast1 => "at_least_1",
            Self::AtMost1 => "at_most_1",
        }
    }
}

impl fmt::Display for RequirementSetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named combination of requirements and other requirement sets.
///
/// Members are referenced by name and resolved against the catalog, so a set
/// may point at requirements or sets that are not (yet) loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementSet {
    /// Unique key within the catalog.
    pub name: Name,
    /// Backend id of the most recent record that carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// German display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_de: Option<String>,
    /// English display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    /// Free text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// How the members combine.
    pub requirement_set_type: RequirementSetType,
    /// Names of member requirements, in declaration order.
    pub requirements: Vec<String>,
    /// Names of linked requirement sets, in declaration order.
    pub links_to_sets: Vec<String>,
    /// Fields the catalog does not interpret.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl RequirementSet {
    /// Creates an empty `all` set with the given name.
    #[must_use]
    pub const fn new(name: Name) -> Self {
        Self {
            name,
            id: None,
            name_de: None,
            name_en: None,
            description: None,
            requirement_set_type: RequirementSetType::All,
            requirements: Vec::new(),
            links_to_sets: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Shallow-merges a record into this set.
    ///
    /// `requirements` and `links_to_sets` are always replaced (an absent list
    /// becomes empty); other fields are only replaced when present.
    pub(crate) fn merge(&mut self, record: RequirementSetRecord) {
        let RequirementSetRecord {
            id,
            name: _,
            name_de,
            name_en,
            description,
            requirement_set_type,
            requirements,
            links_to_sets,
            extra,
        } = record;

        replace_if_some(&mut self.id, id);
        replace_if_some(&mut self.name_de, name_de);
        replace_if_some(&mut self.name_en, name_en);
        replace_if_some(&mut self.description, description);
        if let Some(kind) = requirement_set_type {
            self.requirement_set_type = kind;
        }

        self.requirements = listify(requirements);
        self.links_to_sets = listify(links_to_sets);
        self.extra.extend(extra);
    }

    /// Number of direct members: requirements plus linked sets.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.requirements.len() + self.links_to_sets.len()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::record::OneOrMany;

    #[test_case(RequirementSetType::All, 3, 3, true; "all satisfied")]
    #[test_case(RequirementSetType::All, 2, 3, false; "all missing one")]
    #[test_case(RequirementSetType::All, 0, 0, true; "all empty")]
    #[test_case(RequirementSetType::Any, 1, 3, true; "any one")]
    #[test_case(RequirementSetType::Any, 0, 0, false; "any empty")]
    #[test_case(RequirementSetType::None, 0, 2, true; "none satisfied")]
    #[test_case(RequirementSetType::None, 1, 2, false; "none violated")]
    #[test_case(RequirementSetType::Exactly1, 1, 4, true; "exactly one")]
    #[test_case(RequirementSetType::Exactly1, 2, 4, false; "exactly one too many")]
    #[test_case(RequirementSetType::AtLeast1, 4, 4, true; "at least one")]
    #[test_case(RequirementSetType::AtMost1, 0, 4, true; "at most one zero")]
    #[test_case(RequirementSetType::AtMost1, 2, 4, false; "at most one exceeded")]
    fn accepts(kind: RequirementSetType, satisfied: usize, total: usize, expected: bool) {
        assert_eq!(kind.accepts(satisfied, total), expected);
    }

    #[test]
    fn set_type_serialized_names() {
        let kind: RequirementSetType = serde_yaml::from_str("exactly_1").unwrap();
        assert_eq!(kind, RequirementSetType::Exactly1);
        assert_eq!(kind.to_string(), "exactly_1");

        let kind: RequirementSetType = serde_yaml::from_str("at_most_1").unwrap();
        assert_eq!(kind, RequirementSetType::AtMost1);

        assert!(serde_yaml::from_str::<RequirementSetType>("most").is_err());
    }

    #[test]
    fn merge_replaces_lists_wholesale() {
        let mut set = RequirementSet::new(Name::try_from("s").unwrap());
        set.merge(RequirementSetRecord {
            requirement_set_type: Some(RequirementSetType::Any),
            requirements: Some(OneOrMany::One("age_gte_18".to_string())),
            ..RequirementSetRecord::linking("s", ["t"])
        });

        assert_eq!(set.requirement_set_type, RequirementSetType::Any);
        assert_eq!(set.requirements, vec!["age_gte_18"]);
        assert_eq!(set.links_to_sets, vec!["t"]);
        assert_eq!(set.member_count(), 2);

        set.merge(RequirementSetRecord {
            description: Some("updated".to_string()),
            ..RequirementSetRecord::default()
        });

        assert_eq!(set.requirement_set_type, RequirementSetType::Any);
        assert!(set.requirements.is_empty());
        assert!(set.links_to_sets.is_empty());
        assert_eq!(set.description.as_deref(), Some("updated"));
    }
}
