//! Domain models for clinical rule data.
//!
//! This module contains the core domain types: names, requirements,
//! requirement sets, the catalog that resolves references between them, and
//! configuration.

/// In-memory catalog of requirements and requirement sets.
pub mod catalog;
pub use catalog::{Catalog, Unresolved, UpsertReport};

mod config;
pub use config::Config;

mod evaluate;
pub use evaluate::EvaluationError;

mod link_graph;

/// Catalog keys and backend ids.
pub mod name;
pub use name::{EmptyNameError, Name, RecordId};

pub mod record;
pub use record::{OneOrMany, RequirementRecord, RequirementSetRecord};

/// Requirement domain model.
pub mod requirement;
pub use requirement::Requirement;

/// Requirement set domain model.
pub mod requirement_set;
pub use requirement_set::{RequirementSet, RequirementSetType};
