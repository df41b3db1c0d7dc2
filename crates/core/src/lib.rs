#![warn(clippy::all, missing_docs)]

//! Core domain logic for the poolboard dashboard.
//!
//! This crate hosts the pool models, the sheet parser, the exclusion
//! overlay and its persistence, configuration handling and CSV export
//! used by the terminal UI and any future frontends.

pub mod config;
pub mod error;
pub mod exclusion;
pub mod export;
pub mod models;
pub mod resource;
pub mod summary;

pub use config::AppConfig;
pub use error::StoreError;
pub use exclusion::{
    ExclusionResolver, ExclusionsData, FileOverrideStore, MemoryOverrideStore, OverrideStore,
};
pub use models::{ExportRow, Program, ResourcePool, StateExclusion, VisitType};
pub use resource::{parse, HeaderLayout, PoolLoader, PoolSource};
pub use summary::{ProgramSummary, ProviderIndex};
