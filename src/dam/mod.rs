//! Digital-asset-management collaborator.
//!
//! [`AssetRepository`] implements the idempotent find-or-create upload: an
//! exact-name search filtered by the asset metadata tuple decides whether a
//! new upload replaces an existing asset's content (same identifier) or
//! creates a fresh one. Repeated webhook deliveries for the same entry
//! therefore never accumulate duplicate assets.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::DamConfig;

#[derive(Debug, Error)]
pub enum DamError {
    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("asset search failed: {0}")]
    SearchFailed(String),

    #[error("asset lookup failed for media id '{media_id}': {detail}")]
    AssetLookup { media_id: String, detail: String },

    #[error("DAM token is not configured")]
    MissingToken,

    #[error("failed to build DAM client: {0}")]
    ClientBuild(String),
}

pub type Result<T> = std::result::Result<T, DamError>;

/// The fixed metadata tuple used both to tag new assets and to query
/// existing ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMetadata {
    pub subject_id: String,
    pub asset_category: String,
    pub file_extension: String,
    pub organization: String,
}

/// A DAM-resident asset record.
#[derive(Debug, Clone, Deserialize)]
pub struct DamAsset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub batch_id: Option<String>,
}

/// Identifier returned by the DAM immediately after an upload. Not assumed
/// to carry every field the entry updater needs; the repository re-fetches
/// the full record for newly created assets.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceipt {
    #[serde(alias = "mediaid")]
    pub media_id: String,
    #[serde(default, alias = "batchId")]
    pub batch_id: Option<String>,
    #[serde(default, alias = "original_file_s3_location")]
    pub location: Option<String>,
}

/// Low-level DAM operations, implemented by the HTTP client and by test
/// fakes.
#[async_trait]
pub trait DamApi: Send + Sync {
    /// Exact-name match filtered by the metadata tuple.
    async fn find_by_exact_name(
        &self,
        name: &str,
        metadata: &AssetMetadata,
    ) -> Result<Option<DamAsset>>;

    /// Upload binary content. When `media_id` is given the upload replaces
    /// that asset's content instead of creating a new one.
    async fn upload(
        &self,
        content: Bytes,
        file_name: &str,
        media_id: Option<&str>,
        metadata: &AssetMetadata,
    ) -> Result<UploadReceipt>;

    /// Fetch a fully-populated asset record by its identifier.
    async fn asset_by_id(&self, media_id: &str) -> Result<DamAsset>;
}

/// Idempotent upload facade over a [`DamApi`].
pub struct AssetRepository {
    api: Arc<dyn DamApi>,
    organization: String,
}

impl AssetRepository {
    pub fn new(api: Arc<dyn DamApi>, organization: String) -> Self {
        Self { api, organization }
    }

    fn metadata_for(&self, correlation_id: &str) -> AssetMetadata {
        AssetMetadata {
            subject_id: correlation_id.to_string(),
            asset_category: "documents".to_string(),
            file_extension: "pdf".to_string(),
            organization: self.organization.clone(),
        }
    }

    /// Find-or-create upload keyed on `(file_name, correlation_id)`.
    ///
    /// An existing asset keeps its identifier; its binary content is
    /// replaced. A new asset is created, then re-fetched by the identifier
    /// from the create response to obtain the canonical record.
    pub async fn upload(
        &self,
        content: Bytes,
        file_name: &str,
        correlation_id: &str,
    ) -> Result<DamAsset> {
        let metadata = self.metadata_for(correlation_id);

        let existing = self.api.find_by_exact_name(file_name, &metadata).await?;
        let media_id = existing.as_ref().map(|asset| asset.id.clone());

        if let Some(id) = &media_id {
            debug!(file_name, media_id = %id, "Reusing existing DAM asset as update target");
        }

        let receipt = self
            .api
            .upload(content, file_name, media_id.as_deref(), &metadata)
            .await?;

        let asset = match existing {
            Some(asset) => asset,
            None => self.api.asset_by_id(&receipt.media_id).await?,
        };

        info!(file_name, asset_id = %asset.id, "Asset upload completed");
        Ok(asset)
    }
}

/// Bynder-style HTTP implementation of [`DamApi`].
///
/// Metaproperty filters are name-keyed in this codebase; the client resolves
/// names to ids through the DAM's metaproperty listing on each call, the
/// same way the filters are resolved server-side.
pub struct HttpDamClient {
    client: Client,
    base_url: String,
    token: String,
    brand_id: String,
}

#[derive(Debug, Deserialize)]
struct MetaProperty {
    id: String,
    name: String,
}

impl HttpDamClient {
    pub fn new(config: &DamConfig) -> Result<Self> {
        let token = config.token.clone().ok_or(DamError::MissingToken)?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DamError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            brand_id: config.brand_id.clone(),
        })
    }

    async fn metaproperty_ids(&self) -> Result<HashMap<String, String>> {
        let url = format!("{}/api/v4/metaproperties/", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| DamError::SearchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DamError::SearchFailed(format!(
                "metaproperty listing returned {}",
                response.status()
            )));
        }

        let properties: Vec<MetaProperty> = response
            .json()
            .await
            .map_err(|e| DamError::SearchFailed(e.to_string()))?;

        Ok(properties
            .into_iter()
            .map(|property| (property.name, property.id))
            .collect())
    }

    fn metadata_filters(
        property_ids: &HashMap<String, String>,
        metadata: &AssetMetadata,
    ) -> Vec<(String, String)> {
        // Properties missing from the DAM's schema are skipped rather than
        // failing the whole search.
        [
            ("PatientName", metadata.subject_id.as_str()),
            ("assettype", metadata.asset_category.as_str()),
            ("FileExtension", metadata.file_extension.as_str()),
            ("Organization", metadata.organization.as_str()),
        ]
        .iter()
        .filter_map(|(name, value)| {
            property_ids
                .get(*name)
                .map(|id| (format!("property_{id}"), value.to_string()))
        })
        .collect()
    }
}

#[async_trait]
impl DamApi for HttpDamClient {
    async fn find_by_exact_name(
        &self,
        name: &str,
        metadata: &AssetMetadata,
    ) -> Result<Option<DamAsset>> {
        let property_ids = self.metaproperty_ids().await?;

        let url = format!("{}/api/v4/media/", self.base_url);
        let mut query: Vec<(String, String)> = vec![
            ("keyword".to_string(), name.to_string()),
            ("limit".to_string(), "100".to_string()),
        ];
        query.extend(Self::metadata_filters(&property_ids, metadata));

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&query)
            .send()
            .await
            .map_err(|e| DamError::SearchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DamError::SearchFailed(format!(
                "media search returned {}",
                response.status()
            )));
        }

        let candidates: Vec<DamAsset> = response
            .json()
            .await
            .map_err(|e| DamError::SearchFailed(e.to_string()))?;

        Ok(candidates.into_iter().find(|asset| asset.name == name))
    }

    async fn upload(
        &self,
        content: Bytes,
        file_name: &str,
        media_id: Option<&str>,
        metadata: &AssetMetadata,
    ) -> Result<UploadReceipt> {
        let property_ids = self.metaproperty_ids().await?;

        let url = format!("{}/api/upload/", self.base_url);
        let mut query: Vec<(String, String)> = vec![
            ("filename".to_string(), file_name.to_string()),
            ("name".to_string(), file_name.to_string()),
            ("brandId".to_string(), self.brand_id.clone()),
        ];
        if let Some(id) = media_id {
            query.push(("mediaId".to_string(), id.to_string()));
        }
        for (name, value) in [
            ("PatientName", metadata.subject_id.as_str()),
            ("assettype", metadata.asset_category.as_str()),
            ("FileExtension", metadata.file_extension.as_str()),
            ("Organization", metadata.organization.as_str()),
        ] {
            if let Some(id) = property_ids.get(name) {
                query.push((format!("metaproperty.{id}"), value.to_string()));
            }
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .query(&query)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(content)
            .send()
            .await
            .map_err(|e| DamError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(DamError::UploadFailed(format!(
                "upload returned {status}: {detail}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DamError::UploadFailed(e.to_string()))
    }

    async fn asset_by_id(&self, media_id: &str) -> Result<DamAsset> {
        let url = format!("{}/api/v4/media/{}/", self.base_url, media_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| DamError::AssetLookup {
                media_id: media_id.to_string(),
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(DamError::AssetLookup {
                media_id: media_id.to_string(),
                detail: format!("lookup returned {}", response.status()),
            });
        }

        response.json().await.map_err(|e| DamError::AssetLookup {
            media_id: media_id.to_string(),
            detail: e.to_string(),
        })
    }
}
