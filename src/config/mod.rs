//! Configuration module for Site-Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing values fall back to defaults.
//!
//! # Example
//!
//! ```no_run
//! use site_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("site-scout.toml")).unwrap();
//! println!("Crawl hard cap: {}", config.discovery.crawl_hard_cap);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BatchConfig, CompetitorConfig, Config, DiscoveryConfig, FetcherConfig, GroundedConfig,
    RendererConfig, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
