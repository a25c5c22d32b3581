use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "PDFRELAY_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/pdfrelay.toml";
const ENV_PREFIX: &str = "PDFRELAY";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = load_from_sources(config_path)?;

    // Load secrets from environment variables
    load_secrets(&mut config);

    Ok(config)
}

/// Load secrets from environment variables into config
/// Secrets are never stored in TOML files, only in environment
fn load_secrets(config: &mut Config) {
    if let Ok(secret) = env::var("PDFRELAY_WEBHOOK_SECRET") {
        config.webhook.shared_secret = Some(secret);
    }

    if let Ok(token) = env::var("PDFRELAY_DAM_TOKEN") {
        config.dam.token = Some(token);
    }
    if let Ok(token) = env::var("PDFRELAY_CMS_MANAGEMENT_TOKEN") {
        config.cms.management_token = Some(token);
    }
    if let Ok(token) = env::var("PDFRELAY_CMS_DELIVERY_TOKEN") {
        config.cms.delivery_token = Some(token);
    }

    // Alternative: vendor-style environment variable names
    if config.dam.token.is_none() {
        if let Ok(token) = env::var("BYNDER_PERMANENT_TOKEN") {
            config.dam.token = Some(token);
        }
    }
    if config.cms.management_token.is_none() {
        if let Ok(token) = env::var("CONTENTFUL_MANAGEMENT_TOKEN") {
            config.cms.management_token = Some(token);
        }
    }
    if config.cms.delivery_token.is_none() {
        if let Ok(token) = env::var("CONTENTFUL_DELIVERY_API") {
            config.cms.delivery_token = Some(token);
        }
    }
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    // Start with defaults (handled by struct Default implementations)
    // Add TOML file if it exists (optional)
    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // Add environment variable overrides
    // PDFRELAY__RENDER__BASE_URL -> render.base_url
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
