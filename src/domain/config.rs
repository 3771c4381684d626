use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::timing::FrameRate;

/// Configuration for a catalog data directory.
///
/// This struct holds settings that control how rule data is loaded and
/// checked, and the frame rate assumed for video segments when none is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Frame rate used for frame-based segment bounds when the video does not
    /// report one.
    default_fps: FrameRate,

    /// Operators accepted in addition to the built-in vocabulary.
    operators: Vec<String>,

    /// Requirement types accepted in addition to the built-in vocabulary.
    requirement_types: Vec<String>,

    /// Whether unresolved references are reported as warnings rather than
    /// failures by `lx check`.
    pub allow_unresolved: bool,

    /// Whether YAML files in the data directory that cannot be parsed are
    /// skipped rather than failing the load.
    pub allow_unrecognised: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_fps: FrameRate::default(),
            operators: Vec::new(),
            requirement_types: Vec::new(),
            allow_unresolved: false,
            allow_unrecognised: false,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the default frame rate.
    #[must_use]
    pub const fn default_fps(&self) -> FrameRate {
        self.default_fps
    }

    /// Sets the default frame rate.
    pub const fn set_default_fps(&mut self, fps: FrameRate) {
        self.default_fps = fps;
    }

    /// Returns the configured extra operators.
    #[must_use]
    pub fn operators(&self) -> &[String] {
        &self.operators
    }

    /// Returns the configured extra requirement types.
    #[must_use]
    pub fn requirement_types(&self) -> &[String] {
        &self.requirement_types
    }

    /// Adds an operator to the configured vocabulary.
    ///
    /// Returns `true` if the operator was added, `false` if it already existed.
    pub fn add_operator(&mut self, operator: String) -> bool {
        if self.operators.contains(&operator) {
            false
        } else {
            self.operators.push(operator);
            true
        }
    }

    /// Adds a requirement type to the configured vocabulary.
    ///
    /// Returns `true` if the type was added, `false` if it already existed.
    pub fn add_requirement_type(&mut self, kind: String) -> bool {
        if self.requirement_types.contains(&kind) {
            false
        } else {
            self.requirement_types.push(kind);
            true
        }
    }
}

const fn default_fps() -> f64 {
    FrameRate::DEFAULT.get()
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        /// Frames per second. Values that are not positive and finite fall
        /// back to the default.
        #[serde(default = "default_fps")]
        default_fps: f64,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        operators: Vec<String>,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        requirement_types: Vec<String>,

        #[serde(default)]
        allow_unresolved: bool,

        #[serde(default)]
        allow_unrecognised: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                default_fps,
                operators,
                requirement_types,
                allow_unresolved,
                allow_unrecognised,
            } => Self {
                default_fps: FrameRate::new(default_fps).unwrap_or_default(),
                operators,
                requirement_types,
                allow_unresolved,
                allow_unrecognised,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            default_fps: config.default_fps.get(),
            operators: config.operators,
            requirement_types: config.requirement_types,
            allow_unresolved: config.allow_unresolved,
            allow_unrecognised: config.allow_unrecognised,
        }
    }
}
