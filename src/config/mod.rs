//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    Config, ConfigError, ListingProvider, ScoringKind, SizingMode, load_config, parse_config,
};
