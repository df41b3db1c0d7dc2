//! Pool sheet parsing and loading.

/// Sheet reading and caching per program.
pub mod loader;
/// Conversion of raw sheet text into pools.
pub mod parser;
/// Legend and placeholder text classifier.
pub mod sentinel;

pub use loader::{PoolLoader, PoolSource};
pub use parser::{parse, parse_with_layout, HeaderLayout, ParseReport};
