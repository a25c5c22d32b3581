//! Compact resource locator parsing for cross-space content links.
//!
//! Locators have the fixed 6-segment form
//! `scheme/space/environments/environment/entries/entryId`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UrnError {
    #[error("malformed urn '{0}': expected 6 slash-delimited segments")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, UrnError>;

/// Coordinates extracted from a resource locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrnParts {
    pub space: String,
    pub environment: String,
    pub entry_id: String,
}

/// Parses a locator into space/environment/entry coordinates.
///
/// Fails when fewer than 6 segments are present or any extracted
/// field is empty.
pub fn parse(urn: &str) -> Result<UrnParts> {
    let segments: Vec<&str> = urn.split('/').collect();

    if segments.len() < 6 {
        return Err(UrnError::Malformed(urn.to_string()));
    }

    let space = segments[1];
    let environment = segments[3];
    let entry_id = segments[5];

    if space.is_empty() || environment.is_empty() || entry_id.is_empty() {
        return Err(UrnError::Malformed(urn.to_string()));
    }

    Ok(UrnParts {
        space: space.to_string(),
        environment: environment.to_string(),
        entry_id: entry_id.to_string(),
    })
}

/// Builds a locator from its three coordinates.
///
/// `parse(&build(space, env, id))` reproduces the same coordinates.
pub fn build(space: &str, environment: &str, entry_id: &str) -> String {
    format!("crn/{space}/environments/{environment}/entries/{entry_id}")
}
