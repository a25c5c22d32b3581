//! Configuration management for pdfrelay
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use pdfrelay::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `PDFRELAY__<section>__<key>`
//!
//! Examples:
//! - `PDFRELAY__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `PDFRELAY__RENDER__BASE_URL=https://site.example.com`
//! - `PDFRELAY__CMS__SYSTEM_ACTOR_ID=svc-pdf-relay`
//!
//! Secrets are read only from plain environment variables
//! (`PDFRELAY_WEBHOOK_SECRET`, `PDFRELAY_DAM_TOKEN`,
//! `PDFRELAY_CMS_MANAGEMENT_TOKEN`, `PDFRELAY_CMS_DELIVERY_TOKEN`), never
//! from the TOML file.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/pdfrelay.toml`.
//! This can be overridden using the `PDFRELAY_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

// Re-export public types
pub use models::{CmsConfig, Config, DamConfig, RenderConfig, ServerConfig, WebhookConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`PDFRELAY__*`)
    /// 2. TOML file (default: `config/pdfrelay.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed
    /// - Validation fails (empty base urls, zero timeouts, blank system actor)
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
