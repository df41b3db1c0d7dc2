//! Exclusion overlay: static defaults, local overrides and their merge.

/// Static exclusion document loading.
pub mod data;
/// Merge of defaults and overrides into a single predicate.
pub mod resolver;
/// Persistence of the local override list.
pub mod store;

pub use data::ExclusionsData;
pub use resolver::{names_match, ExclusionResolver};
pub use store::{FileOverrideStore, MemoryOverrideStore, OverrideStore, OVERRIDE_NAMESPACE};
