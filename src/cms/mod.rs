//! Content-management system collaborator.
//!
//! [`EntryUpdater`] performs the link stage: load an entry, verify it is the
//! single content type this pipeline is authorized to mutate, write the
//! asset link into exactly one field, persist. Publication is deliberately
//! not part of this pipeline.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::CmsConfig;
use crate::dam::DamAsset;

#[derive(Debug, Error)]
pub enum CmsError {
    #[error("entry not found: {0}")]
    NotFound(String),

    #[error("entry '{entry_id}' is not a '{expected}' content type (found '{found}')")]
    WrongContentType {
        entry_id: String,
        expected: String,
        found: String,
    },

    #[error("version conflict updating entry '{0}'")]
    VersionConflict(String),

    #[error("CMS API error: {0}")]
    Api(String),

    #[error("CMS token is not configured")]
    MissingToken,

    #[error("failed to build CMS client: {0}")]
    ClientBuild(String),
}

impl CmsError {
    /// Stable reason code recorded in pipeline outcomes.
    pub fn code(&self) -> &'static str {
        match self {
            CmsError::NotFound(_) => "NOT_FOUND",
            CmsError::WrongContentType { .. } => "WRONG_CONTENT_TYPE",
            CmsError::VersionConflict(_) => "VERSION_CONFLICT",
            CmsError::Api(_) | CmsError::ClientBuild(_) => "LINK_FAILED",
            CmsError::MissingToken => "LINK_FAILED",
        }
    }
}

pub type Result<T> = std::result::Result<T, CmsError>;

/// A management-API entry: system metadata plus locale-keyed fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmsEntry {
    pub sys: EntrySys,
    #[serde(default)]
    pub fields: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySys {
    pub id: String,
    #[serde(default)]
    pub version: u64,
    #[serde(rename = "contentType")]
    pub content_type: TypeLink,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeLink {
    pub sys: TypeLinkSys,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeLinkSys {
    pub id: String,
}

/// Canonical asset-link representation written into the target field.
pub fn asset_link(asset_id: &str) -> Value {
    json!({
        "sys": {
            "type": "Link",
            "linkType": "Asset",
            "id": asset_id,
        }
    })
}

/// Management-side operations (load/persist entries).
#[async_trait]
pub trait CmsManagementApi: Send + Sync {
    async fn get_entry(&self, space: &str, environment: &str, entry_id: &str) -> Result<CmsEntry>;

    /// Persist a mutated entry using its current version for optimistic
    /// concurrency.
    async fn update_entry(&self, space: &str, environment: &str, entry: &CmsEntry)
    -> Result<CmsEntry>;
}

/// Delivery-side operations (read-only content queries).
#[async_trait]
pub trait CmsDeliveryApi: Send + Sync {
    async fn entries_by_slug(
        &self,
        space: &str,
        environment: &str,
        content_type: &str,
        slug: &str,
        locale: Option<&str>,
    ) -> Result<Vec<Value>>;

    async fn entry(&self, space: &str, environment: &str, entry_id: &str) -> Result<Value>;
}

/// Writes the asset back-reference into the source entry.
pub struct EntryUpdater {
    api: Arc<dyn CmsManagementApi>,
    expected_content_type: String,
    target_field: String,
    locale: String,
}

impl EntryUpdater {
    pub fn new(
        api: Arc<dyn CmsManagementApi>,
        expected_content_type: String,
        target_field: String,
        locale: String,
    ) -> Self {
        Self {
            api,
            expected_content_type,
            target_field,
            locale,
        }
    }

    /// Links `asset` into the configured field of the entry.
    ///
    /// Fails fast with [`CmsError::WrongContentType`] before mutating
    /// anything when the entry is not the expected content type. Does not
    /// publish the entry.
    pub async fn link(
        &self,
        entry_id: &str,
        space: &str,
        environment: &str,
        asset: &DamAsset,
    ) -> Result<()> {
        debug!(entry_id, space, environment, asset_id = %asset.id, "Linking asset into entry");

        let mut entry = self.api.get_entry(space, environment, entry_id).await?;

        let found = &entry.sys.content_type.sys.id;
        if *found != self.expected_content_type {
            return Err(CmsError::WrongContentType {
                entry_id: entry_id.to_string(),
                expected: self.expected_content_type.clone(),
                found: found.clone(),
            });
        }

        entry.fields.insert(
            self.target_field.clone(),
            json!({ &self.locale: [asset_link(&asset.id)] }),
        );

        self.api.update_entry(space, environment, &entry).await?;

        info!(entry_id, asset_id = %asset.id, "Entry updated with asset link");
        Ok(())
    }
}

/// Management-API HTTP client. Authenticates with the system actor's token
/// so the resulting change events are attributable to it.
pub struct HttpManagementClient {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpManagementClient {
    pub fn new(config: &CmsConfig) -> Result<Self> {
        let token = config.management_token.clone().ok_or(CmsError::MissingToken)?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| CmsError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.management_base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn entry_url(&self, space: &str, environment: &str, entry_id: &str) -> String {
        format!(
            "{}/spaces/{}/environments/{}/entries/{}",
            self.base_url, space, environment, entry_id
        )
    }
}

#[async_trait]
impl CmsManagementApi for HttpManagementClient {
    async fn get_entry(&self, space: &str, environment: &str, entry_id: &str) -> Result<CmsEntry> {
        let response = self
            .client
            .get(self.entry_url(space, environment, entry_id))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| CmsError::Api(e.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json()
                .await
                .map_err(|e| CmsError::Api(e.to_string())),
            reqwest::StatusCode::NOT_FOUND => Err(CmsError::NotFound(entry_id.to_string())),
            status => Err(CmsError::Api(format!("entry load returned {status}"))),
        }
    }

    async fn update_entry(
        &self,
        space: &str,
        environment: &str,
        entry: &CmsEntry,
    ) -> Result<CmsEntry> {
        let response = self
            .client
            .put(self.entry_url(space, environment, &entry.sys.id))
            .bearer_auth(&self.token)
            .header("X-Contentful-Version", entry.sys.version)
            .json(&json!({ "fields": entry.fields }))
            .send()
            .await
            .map_err(|e| CmsError::Api(e.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json()
                .await
                .map_err(|e| CmsError::Api(e.to_string())),
            reqwest::StatusCode::NOT_FOUND => Err(CmsError::NotFound(entry.sys.id.clone())),
            reqwest::StatusCode::CONFLICT => Err(CmsError::VersionConflict(entry.sys.id.clone())),
            status => Err(CmsError::Api(format!("entry update returned {status}"))),
        }
    }
}

/// Delivery-API HTTP client (read-only content queries).
pub struct HttpDeliveryClient {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpDeliveryClient {
    pub fn new(config: &CmsConfig) -> Result<Self> {
        let token = config.delivery_token.clone().ok_or(CmsError::MissingToken)?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| CmsError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.delivery_base_url.trim_end_matches('/').to_string(),
            token,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DeliveryCollection {
    #[serde(default)]
    items: Vec<Value>,
}

#[async_trait]
impl CmsDeliveryApi for HttpDeliveryClient {
    async fn entries_by_slug(
        &self,
        space: &str,
        environment: &str,
        content_type: &str,
        slug: &str,
        locale: Option<&str>,
    ) -> Result<Vec<Value>> {
        let url = format!(
            "{}/spaces/{}/environments/{}/entries",
            self.base_url, space, environment
        );

        let mut query: Vec<(&str, String)> = vec![
            ("content_type", content_type.to_string()),
            ("fields.slug", slug.to_string()),
            ("limit", "1".to_string()),
            ("include", "2".to_string()),
        ];
        if let Some(locale) = locale {
            query.push(("locale", locale.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&query)
            .send()
            .await
            .map_err(|e| CmsError::Api(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CmsError::Api(format!(
                "entry query returned {}",
                response.status()
            )));
        }

        let collection: DeliveryCollection = response
            .json()
            .await
            .map_err(|e| CmsError::Api(e.to_string()))?;

        Ok(collection.items)
    }

    async fn entry(&self, space: &str, environment: &str, entry_id: &str) -> Result<Value> {
        let url = format!(
            "{}/spaces/{}/environments/{}/entries/{}",
            self.base_url, space, environment, entry_id
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| CmsError::Api(e.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json()
                .await
                .map_err(|e| CmsError::Api(e.to_string())),
            reqwest::StatusCode::NOT_FOUND => Err(CmsError::NotFound(entry_id.to_string())),
            status => Err(CmsError::Api(format!("entry fetch returned {status}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeManagement {
        entry: Mutex<CmsEntry>,
        updates: AtomicUsize,
    }

    impl FakeManagement {
        fn with_content_type(content_type: &str) -> Self {
            Self {
                entry: Mutex::new(CmsEntry {
                    sys: EntrySys {
                        id: "E1".to_string(),
                        version: 3,
                        content_type: TypeLink {
                            sys: TypeLinkSys {
                                id: content_type.to_string(),
                            },
                        },
                    },
                    fields: serde_json::Map::from_iter([(
                        "title".to_string(),
                        json!({"en-US": "Asthma care"}),
                    )]),
                }),
                updates: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CmsManagementApi for FakeManagement {
        async fn get_entry(&self, _: &str, _: &str, _: &str) -> Result<CmsEntry> {
            Ok(self.entry.lock().unwrap().clone())
        }

        async fn update_entry(&self, _: &str, _: &str, entry: &CmsEntry) -> Result<CmsEntry> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            *self.entry.lock().unwrap() = entry.clone();
            Ok(entry.clone())
        }
    }

    fn sample_asset() -> DamAsset {
        DamAsset {
            id: "media-7".to_string(),
            name: "asthma-care.pdf".to_string(),
            location: None,
            batch_id: None,
        }
    }

    fn updater(api: Arc<FakeManagement>) -> EntryUpdater {
        EntryUpdater::new(
            api,
            "patientEducation".to_string(),
            "pdf".to_string(),
            "en-US".to_string(),
        )
    }

    #[tokio::test]
    async fn link_writes_single_field_and_persists() {
        let api = Arc::new(FakeManagement::with_content_type("patientEducation"));
        updater(api.clone())
            .link("E1", "S1", "master", &sample_asset())
            .await
            .unwrap();

        assert_eq!(api.updates.load(Ordering::SeqCst), 1);
        let entry = api.entry.lock().unwrap();
        let field = &entry.fields["pdf"]["en-US"][0];
        assert_eq!(field["sys"]["type"], "Link");
        assert_eq!(field["sys"]["linkType"], "Asset");
        assert_eq!(field["sys"]["id"], "media-7");
        // Sibling fields are untouched.
        assert_eq!(entry.fields["title"]["en-US"], "Asthma care");
    }

    #[tokio::test]
    async fn link_rejects_wrong_content_type_before_writing() {
        let api = Arc::new(FakeManagement::with_content_type("newsArticle"));
        let err = updater(api.clone())
            .link("E1", "S1", "master", &sample_asset())
            .await
            .unwrap_err();

        assert!(matches!(err, CmsError::WrongContentType { .. }));
        assert_eq!(err.code(), "WRONG_CONTENT_TYPE");
        assert_eq!(api.updates.load(Ordering::SeqCst), 0);
    }
}
