//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/dashdoc/config.toml)
//! 3. Project config (.dashdoc/config.toml)
//! 4. Conventional environment variables (CONFLUENCE_*, REDSHIFT_*, ...)
//! 5. Environment variables (DASHDOC_*)
//!
//! The resolved [`Config`] is built once per process and handed to each
//! component constructor.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
