//! Slug-based content retrieval with cross-space link resolution.
//!
//! Renderable pages reference related documents through compact resource
//! locators; the fetcher dereferences them via the delivery API. A link that
//! fails to resolve is dropped with a warning rather than failing the whole
//! page.

use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cms::{CmsDeliveryApi, CmsError};
use crate::urn::{self, UrnError};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Urn(#[from] UrnError),

    #[error(transparent)]
    Cms(#[from] CmsError),
}

pub type Result<T> = std::result::Result<T, ContentError>;

pub struct ContentFetcher {
    delivery: Arc<dyn CmsDeliveryApi>,
    space: String,
    environment: String,
    content_type: String,
}

impl ContentFetcher {
    pub fn new(
        delivery: Arc<dyn CmsDeliveryApi>,
        space: String,
        environment: String,
        content_type: String,
    ) -> Self {
        Self {
            delivery,
            space,
            environment,
            content_type,
        }
    }

    /// Retrieves the primary document for a slug, if one exists.
    pub async fn fetch_by_slug(&self, slug: &str, locale: Option<&str>) -> Result<Option<Value>> {
        let items = self
            .delivery
            .entries_by_slug(
                &self.space,
                &self.environment,
                &self.content_type,
                slug,
                locale,
            )
            .await?;

        Ok(items.into_iter().next())
    }

    /// Dereferences a cross-space resource locator.
    pub async fn fetch_by_urn(&self, urn: &str) -> Result<Value> {
        let parts = urn::parse(urn)?;
        debug!(space = %parts.space, environment = %parts.environment, entry_id = %parts.entry_id, "Resolving resource link");

        let entry = self
            .delivery
            .entry(&parts.space, &parts.environment, &parts.entry_id)
            .await?;

        Ok(entry)
    }

    /// Resolves a mixed list of inline entries and resource links.
    ///
    /// Inline entries pass through unchanged; resource links are fetched by
    /// URN. Links that fail to parse or resolve are dropped, never fatal.
    pub async fn resolve_related(&self, entries: &[Value]) -> Vec<Value> {
        let mut resolved = Vec::with_capacity(entries.len());

        for entry in entries {
            if entry["sys"]["type"] == "ResourceLink" {
                let Some(link) = entry["sys"]["urn"].as_str() else {
                    warn!("Resource link without a urn field, dropping");
                    continue;
                };
                match self.fetch_by_urn(link).await {
                    Ok(entry) => resolved.push(entry),
                    Err(e) => {
                        warn!(urn = link, error = %e, "Failed to resolve resource link, dropping");
                    }
                }
            } else {
                resolved.push(entry.clone());
            }
        }

        resolved
    }
}
