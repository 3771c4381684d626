//! Clinical rule catalog and video segment timing.
//!
//! Requirements and requirement sets are loaded from YAML into a
//! [`Catalog`], which resolves the names they reference and reports what is
//! missing or cyclic. The [`timing`] module reconciles frame-based and
//! time-based video segment bounds.

pub mod domain;
pub use domain::{
    Catalog, Config, EvaluationError, Name, RecordId, Requirement, RequirementRecord,
    RequirementSet, RequirementSetRecord, RequirementSetType, UpsertReport,
};

/// YAML ingestion and filesystem storage for rule data.
pub mod storage;
pub use storage::{Directory, LoadError};

pub mod timing;
