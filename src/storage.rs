pub mod directory;
/// YAML parsing of requirement and requirement set records.
pub mod yaml;

pub use directory::{Directory, DirectoryLoadError};
pub use yaml::{
    Entries, EntryKind, LoadError, load_from_yaml_strings, parse_entries, parse_requirement_sets,
    parse_requirements,
};
