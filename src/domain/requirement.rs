use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{
    Name, RecordId,
    record::{RequirementRecord, listify},
};

/// Operators every catalog knows about before any data is loaded.
pub const DEFAULT_OPERATORS: &[&str] = &[
    "models_match_all",
    "models_match_any",
    "age_gte",
    "age_lte",
    "numeric_value_within_normal_range",
    "numeric_value_gte",
    "numeric_value_lte",
    "models_match_any_in_timeframe",
];

/// Requirement types every catalog knows about before any data is loaded.
pub const DEFAULT_REQUIREMENT_TYPES: &[&str] = &[
    "patient",
    "patient_finding",
    "patient_examination",
    "patient_lab_value",
    "patient_disease",
];

/// A single named clinical rule, such as "patient is at least 18 years old".
///
/// The requirement only describes the rule; evaluating it against patient
/// data is up to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Requirement {
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
    /// The kinds of data this requirement inspects.
    pub requirement_types: Vec<String>,
    /// The operators used to evaluate this requirement.
    pub operators: Vec<String>,
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
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<String>,
    /// Linked finding classification names.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub finding_classifications: Vec<String>,
    /// Linked finding classification choice names.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub finding_classification_choices: Vec<String>,
    /// Linked lab value names.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lab_values: Vec<String>,
    /// Linked disease names.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diseases: Vec<String>,
    /// Linked gender names.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genders: Vec<String>,
    /// Fields the catalog does not interpret.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Requirement {
    /// Creates an empty requirement with the given name.
    #[must_use]
    pub const fn new(name: Name) -> Self {
        Self {
            name,
            id: None,
            name_de: None,
            name_en: None,
            description: None,
            requirement_types: Vec::new(),
            operators: Vec::new(),
            numeric_value: None,
            numeric_value_min: None,
            numeric_value_max: None,
            unit: None,
            findings: Vec::new(),
            finding_classifications: Vec::new(),
            finding_classification_choices: Vec::new(),
            lab_values: Vec::new(),
            diseases: Vec::new(),
            genders: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Shallow-merges a record into this requirement.
    ///
    /// Fields present in the record replace the stored value and absent fields
    /// are left alone, except `requirement_types` and `operators`, which are
    /// always replaced (an absent list becomes empty).
    pub(crate) fn merge(&mut self, record: RequirementRecord) {
        let RequirementRecord {
            id,
            name: _,
            name_de,
            name_en,
            description,
            requirement_types,
            operators,
            numeric_value,
            numeric_value_min,
            numeric_value_max,
            unit,
            findings,
            finding_classifications,
            finding_classification_choices,
            lab_values,
            diseases,
            genders,
            extra,
        } = record;

        replace_if_some(&mut self.id, id);
        replace_if_some(&mut self.name_de, name_de);
        replace_if_some(&mut self.name_en, name_en);
        replace_if_some(&mut self.description, description);
        replace_if_some(&mut self.numeric_value, numeric_value);
        replace_if_some(&mut self.numeric_value_min, numeric_value_min);
        replace_if_some(&mut self.numeric_value_max, numeric_value_max);
        replace_if_some(&mut self.unit, unit);

        self.requirement_types = listify(requirement_types);
        self.operators = listify(operators);

        for (target, value) in [
            (&mut self.findings, findings),
            (&mut self.finding_classifications, finding_classifications),
            (
                &mut self.finding_classification_choices,
                finding_classification_choices,
            ),
            (&mut self.lab_values, lab_values),
            (&mut self.diseases, diseases),
            (&mut self.genders, genders),
        ] {
            if value.is_some() {
                *target = listify(value);
            }
        }

        self.extra.extend(extra);
    }

    /// Whether the requirement uses the given operator.
    #[must_use]
    pub fn has_operator(&self, operator: &str) -> bool {
        self.operators.iter().any(|op| op == operator)
    }
}

pub(crate) fn replace_if_some<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::OneOrMany;

    fn name(s: &str) -> Name {
        Name::try_from(s).unwrap()
    }

    #[test]
    fn merge_keeps_absent_scalars() {
        let mut requirement = Requirement::new(name("age_gte_18"));
        requirement.merge(RequirementRecord {
            description: Some("adult patient".to_string()),
            numeric_value: Some(18.0),
            unit: Some("years".to_string()),
            ..RequirementRecord::named("age_gte_18")
        });

        requirement.merge(RequirementRecord {
            numeric_value: Some(21.0),
            ..RequirementRecord::named("age_gte_18")
        });

        assert_eq!(requirement.description.as_deref(), Some("adult patient"));
        assert_eq!(requirement.numeric_value, Some(21.0));
        assert_eq!(requirement.unit.as_deref(), Some("years"));
    }

    #[test]
    fn merge_replaces_type_and_operator_lists() {
        let mut requirement = Requirement::new(name("r"));
        requirement.merge(RequirementRecord {
            requirement_types: Some(OneOrMany::One("patient".to_string())),
            operators: Some(OneOrMany::Many(vec![
                "age_gte".to_string(),
                "age_lte".to_string(),
            ])),
            ..RequirementRecord::named("r")
        });

        assert_eq!(requirement.requirement_types, vec!["patient"]);
        assert!(requirement.has_operator("age_lte"));

        requirement.merge(RequirementRecord::named("r"));

        assert!(requirement.requirement_types.is_empty());
        assert!(requirement.operators.is_empty());
    }

    #[test]
    fn merge_keeps_absent_link_lists() {
        let mut requirement = Requirement::new(name("r"));
        requirement.merge(RequirementRecord {
            findings: Some(OneOrMany::One("polyp".to_string())),
            ..RequirementRecord::named("r")
        });
        requirement.merge(RequirementRecord {
            diseases: Some(OneOrMany::One("colitis".to_string())),
            ..RequirementRecord::named("r")
        });

        assert_eq!(requirement.findings, vec!["polyp"]);
        assert_eq!(requirement.diseases, vec!["colitis"]);
    }
}
