use std::{borrow::Borrow, fmt, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
};

/// The unique key of a requirement or requirement set within a catalog.
///
/// Names are compared exactly; no case folding or trimming is applied.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Name(NonEmptyString);

impl Name {
    /// Creates a new `Name` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyNameError`] if the string is empty.
    pub fn new(s: String) -> Result<Self, EmptyNameError> {
        NonEmptyString::new(s).map(Self).map_err(|_| EmptyNameError)
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for Name {
    type Error = EmptyNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Name {
    type Error = EmptyNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl FromStr for Name {
    type Err = EmptyNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

// `Ord` on the wrapped string agrees with `str`, so map lookups by `&str` are
// consistent with lookups by `Name`.
impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl Deref for Name {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

/// Error returned when constructing a [`Name`] from an empty string.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("name must not be empty")]
pub struct EmptyNameError;

/// Identifier assigned to a record by an external system.
///
/// Backends hand out numeric or textual ids. Both forms share one key space,
/// so `1`, `1.0` and `"1"` are the same id. Numbers are stored in their
/// shortest decimal form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Returns the canonical string form of the id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<f64> for RecordId {
    fn from(value: f64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordIdVisitor;

        impl Visitor<'_> for RecordIdVisitor {
            type Value = RecordId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a number or a string")
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<RecordId, E> {
                Ok(RecordId::from(value))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<RecordId, E> {
                Ok(RecordId::from(value))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<RecordId, E> {
                Ok(RecordId::from(value))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<RecordId, E> {
                Ok(RecordId::from(value))
            }

            fn visit_string<E: de::Error>(self, value: String) -> Result<RecordId, E> {
                Ok(RecordId::from(value))
            }
        }

        deserializer.deserialize_any(RecordIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn empty_name_is_rejected() {
        assert_eq!(Name::new(String::new()), Err(EmptyNameError));
        assert!("".parse::<Name>().is_err());
    }

    #[test]
    fn whitespace_is_preserved() {
        let name = Name::try_from(" colonoscopy ").unwrap();
        assert_eq!(name.as_str(), " colonoscopy ");
    }

    #[test]
    fn map_lookup_by_str() {
        let mut map = BTreeMap::new();
        map.insert(Name::try_from("age_gte_18").unwrap(), 1);

        assert_eq!(map.get("age_gte_18"), Some(&1));
        assert_eq!(map.get("age_gte_21"), None);
    }

    #[test]
    fn deserialize_rejects_empty_name() {
        let result: Result<Name, _> = serde_yaml::from_str("''");
        assert!(result.is_err());

        let name: Name = serde_yaml::from_str("patient_is_adult").unwrap();
        assert_eq!(name, "patient_is_adult");
    }

    #[test]
    fn record_id_forms_share_a_key() {
        let number: RecordId = serde_yaml::from_str("1").unwrap();
        let text: RecordId = serde_yaml::from_str("'1'").unwrap();
        let float: RecordId = serde_yaml::from_str("1.0").unwrap();

        assert_eq!(number, text);
        assert_eq!(number, float);
        assert_eq!(number, RecordId::from(1_i64));
        assert_eq!(number.to_string(), "1");
    }

    #[test]
    fn fractional_record_id_is_accepted() {
        let id: RecordId = serde_yaml::from_str("1.5").unwrap();
        assert_eq!(id.as_str(), "1.5");

        let id: RecordId = serde_json::from_str("\"set-1\"").unwrap();
        assert_eq!(id, RecordId::from("set-1"));

        assert!(serde_yaml::from_str::<RecordId>("[1]").is_err());
    }
}
