//! # KeyHints Config
//!
//! Settings management for keyhints: the TOML schema, loading with
//! environment expansion, validation, an in-memory settings store,
//! exclusion rules and custom search-engine parsing.

mod error;
mod exclusions;
mod loader;
mod schema;
mod search_engines;
mod store;
mod validator;

pub use error::ConfigError;
pub use exclusions::{ExclusionMatch, ExclusionRules, UrlStatus};
pub use loader::ConfigLoader;
pub use schema::*;
pub use search_engines::{parse_lines, parse_search_engines, SearchEngineConfig};
pub use store::MemorySettingsStore;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
