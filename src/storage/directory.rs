//! A filesystem backed store of rule data
//!
//! The [`Directory`] loads every YAML file below a root directory into a
//! [`Catalog`], together with the `config.toml` found at the root.

use std::{
    ffi::OsStr,
    fmt,
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use walkdir::WalkDir;

use crate::{
    domain::{Catalog, Config},
    storage::{
        LoadError,
        yaml::{Entries, parse_entries},
    },
};

/// A directory whose rule data has been loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    catalog: Catalog,
    config: Config,
    skipped_entries: usize,
}

/// A directory that has not been read yet.
#[derive(Debug, PartialEq, Eq)]
pub struct Unloaded;

/// A filesystem backed store of requirements and requirement sets.
#[derive(Debug)]
pub struct Directory<S> {
    /// The root of the directory rule data is stored in.
    root: PathBuf,
    state: S,
}

impl<S> Directory<S> {
    /// The root of the directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Directory<Unloaded> {
    /// Opens a directory at the given path.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self {
            root,
            state: Unloaded,
        }
    }

    /// Load all rule data from disk.
    ///
    /// Files are parsed in parallel. Requirements from every file are upserted
    /// before any set, so references between files resolve regardless of the
    /// order files are visited in.
    ///
    /// # Errors
    ///
    /// If `allow_unrecognised` is `true` in the configuration, files that
    /// cannot be read or parsed are skipped. Otherwise (the default) they are
    /// reported as [`DirectoryLoadError::UnrecognisedFiles`].
    #[tracing::instrument(level = "debug", skip(self), fields(root = %self.root.display()))]
    pub fn load_all(self) -> Result<Directory<Loaded>, DirectoryLoadError> {
        let config = load_config(&self.root);
        let yaml_paths = collect_yaml_paths(&self.root);

        let (parsed, unrecognised): (Vec<_>, Vec<_>) = yaml_paths
            .par_iter()
            .map(|path| try_load_entries(path))
            .partition(Result::is_ok);

        let parsed: Vec<Entries> = parsed.into_iter().filter_map(Result::ok).collect();
        let unrecognised: Vec<PathBuf> = unrecognised.into_iter().filter_map(Result::err).collect();

        if !config.allow_unrecognised && !unrecognised.is_empty() {
            return Err(DirectoryLoadError::UnrecognisedFiles(unrecognised));
        }

        let mut entries = Entries::default();
        for file in parsed {
            entries.extend(file);
        }
        let skipped_entries = entries.skipped;

        let mut catalog = Catalog::with_config(&config);
        let (requirements, sets) = entries.apply(&mut catalog);
        tracing::debug!(
            requirements = requirements.accepted,
            sets = sets.accepted,
            skipped = skipped_entries + requirements.skipped.len() + sets.skipped.len(),
            "loaded rule data"
        );

        Ok(Directory {
            root: self.root,
            state: Loaded {
                catalog,
                config,
                skipped_entries,
            },
        })
    }
}

impl Directory<Loaded> {
    /// The loaded catalog.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.state.catalog
    }

    /// Mutable access to the loaded catalog.
    pub const fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.state.catalog
    }

    /// The configuration read from the directory root.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.state.config
    }

    /// Number of YAML entries skipped while loading.
    #[must_use]
    pub const fn skipped_entries(&self) -> usize {
        self.state.skipped_entries
    }

    /// Consumes the directory, returning its catalog.
    #[must_use]
    pub fn into_catalog(self) -> Catalog {
        self.state.catalog
    }
}

/// Error returned when a directory cannot be loaded.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryLoadError {
    /// Files that could not be read or parsed as YAML.
    UnrecognisedFiles(Vec<PathBuf>),
}

impl fmt::Display for DirectoryLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognisedFiles(paths) => {
                write!(f, "Unrecognised files: ")?;
                for (i, path) in paths.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", path.display())?;
                }
                Ok(())
            }
        }
    }
}

fn load_config(root: &Path) -> Config {
    let path = root.join("config.toml");
    Config::load(&path).unwrap_or_else(|e| {
        tracing::debug!("Failed to load config: {e}");
        Config::default()
    })
}

fn collect_yaml_paths(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable directory entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| {
            matches!(
                path.extension().and_then(OsStr::to_str),
                Some("yaml" | "yml")
            )
        })
        .collect();
    // Stable order so that later files win deterministically on name clashes.
    paths.sort();
    paths
}

fn try_load_entries(path: &Path) -> Result<Entries, PathBuf> {
    let result = std::fs::read_to_string(path)
        .map_err(LoadError::from)
        .and_then(|content| parse_entries(&content));

    result.map_err(|e| {
        tracing::debug!("Failed to load {}: {e}", path.display());
        path.to_path_buf()
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn seeded() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "requirement_sets/screening.yaml",
            "- name: screening\n  requirement_set_type: all\n  requirements: [age_gte_18]\n  links_to_sets: [exclusions]\n- name: exclusions\n  requirement_set_type: none\n  requirements: [is_pregnant]\n",
        );
        write(
            tmp.path(),
            "requirements/patient.yml",
            "- model: endoreg_db.requirement\n  fields:\n    name: age_gte_18\n    operators: age_gte\n- name: is_pregnant\n",
        );
        write(tmp.path(), "README.md", "not rule data");
        tmp
    }

    #[test]
    fn loads_files_across_subdirectories() {
        let tmp = seeded();
        let directory = Directory::new(tmp.path().to_path_buf()).load_all().unwrap();
        let catalog = directory.catalog();

        assert_eq!(catalog.requirement_count(), 2);
        assert_eq!(catalog.requirement_set_count(), 2);
        assert!(catalog.is_consistent());
        assert_eq!(directory.skipped_entries(), 0);
    }

    #[test]
    fn unparsable_file_is_an_error_by_default() {
        let tmp = seeded();
        write(tmp.path(), "broken.yaml", "- [unclosed");

        let error = Directory::new(tmp.path().to_path_buf())
            .load_all()
            .unwrap_err();
        let DirectoryLoadError::UnrecognisedFiles(paths) = error;
        assert_eq!(paths, vec![tmp.path().join("broken.yaml")]);
    }

    #[test]
    fn unparsable_file_is_skipped_when_allowed() {
        let tmp = seeded();
        write(tmp.path(), "broken.yaml", "- [unclosed");
        write(
            tmp.path(),
            "config.toml",
            "_version = \"1\"\nallow_unrecognised = true\noperators = [\"bmi_gte\"]\n",
        );

        let directory = Directory::new(tmp.path().to_path_buf()).load_all().unwrap();
        assert!(directory.config().allow_unrecognised);
        assert_eq!(directory.catalog().requirement_set_count(), 2);
        assert!(directory.catalog().known_operators().contains("bmi_gte"));
    }

    #[test]
    fn empty_directory_loads_empty_catalog() {
        let tmp = TempDir::new().unwrap();
        let catalog = Directory::new(tmp.path().to_path_buf())
            .load_all()
            .unwrap()
            .into_catalog();
        assert!(catalog.is_empty());
    }
}
