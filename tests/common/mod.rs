//! Shared counting fakes for the pipeline collaborators.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use pdfrelay::cms::{
    CmsDeliveryApi, CmsEntry, CmsError, CmsManagementApi, EntrySys, EntryUpdater, TypeLink,
    TypeLinkSys,
};
use pdfrelay::dam::{AssetMetadata, AssetRepository, DamApi, DamAsset, DamError, UploadReceipt};
use pdfrelay::observability::Metrics;
use pdfrelay::pipeline::{Pipeline, PipelineSettings, WebhookEvent};
use pdfrelay::render::{RenderResult, Renderer};

pub const SYSTEM_ACTOR: &str = "SYSTEM";

/// Renderer fake: succeeds with a fixed buffer unless `fail_with` is set.
pub struct FakeRenderer {
    pub calls: AtomicUsize,
    pub fail_with: Option<String>,
    pub payload: Bytes,
}

impl FakeRenderer {
    pub fn succeeding() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_with: None,
            payload: Bytes::from_static(b"%PDF-data_"), // 10 bytes
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_with: Some(error.to_string()),
            payload: Bytes::new(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render(&self, _url: &str, slug: &str) -> RenderResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let file_name = format!("{slug}.pdf");
        match &self.fail_with {
            Some(error) => RenderResult::failed(file_name, error.clone()),
            None => RenderResult::completed(file_name, self.payload.clone()),
        }
    }
}

/// DAM fake backed by an in-memory name->asset map, with per-operation
/// call counters.
#[derive(Default)]
pub struct FakeDam {
    pub known: Mutex<HashMap<String, DamAsset>>,
    pub searches: AtomicUsize,
    pub creates: AtomicUsize,
    pub replacements: AtomicUsize,
    pub last_metadata: Mutex<Option<AssetMetadata>>,
    pub fail_uploads: bool,
}

impl FakeDam {
    pub fn failing() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn with_asset(name: &str, id: &str) -> Self {
        let fake = Self::default();
        fake.known.lock().unwrap().insert(
            name.to_string(),
            DamAsset {
                id: id.to_string(),
                name: name.to_string(),
                location: None,
                batch_id: None,
            },
        );
        fake
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn replacement_count(&self) -> usize {
        self.replacements.load(Ordering::SeqCst)
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DamApi for FakeDam {
    async fn find_by_exact_name(
        &self,
        name: &str,
        metadata: &AssetMetadata,
    ) -> Result<Option<DamAsset>, DamError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        *self.last_metadata.lock().unwrap() = Some(metadata.clone());
        Ok(self.known.lock().unwrap().get(name).cloned())
    }

    async fn upload(
        &self,
        _content: Bytes,
        file_name: &str,
        media_id: Option<&str>,
        _metadata: &AssetMetadata,
    ) -> Result<UploadReceipt, DamError> {
        if self.fail_uploads {
            return Err(DamError::UploadFailed("binary rejected".to_string()));
        }

        let id = match media_id {
            Some(id) => {
                self.replacements.fetch_add(1, Ordering::SeqCst);
                id.to_string()
            }
            None => {
                self.creates.fetch_add(1, Ordering::SeqCst);
                let id = format!("media-{}", self.creates.load(Ordering::SeqCst));
                self.known.lock().unwrap().insert(
                    file_name.to_string(),
                    DamAsset {
                        id: id.clone(),
                        name: file_name.to_string(),
                        location: None,
                        batch_id: None,
                    },
                );
                id
            }
        };

        Ok(UploadReceipt {
            media_id: id,
            batch_id: Some("batch-1".to_string()),
            location: None,
        })
    }

    async fn asset_by_id(&self, media_id: &str) -> Result<DamAsset, DamError> {
        self.known
            .lock()
            .unwrap()
            .values()
            .find(|asset| asset.id == media_id)
            .cloned()
            .ok_or_else(|| DamError::AssetLookup {
                media_id: media_id.to_string(),
                detail: "not found".to_string(),
            })
    }
}

/// CMS management fake serving a single entry of the given content type.
pub struct FakeCms {
    pub content_type: String,
    pub gets: AtomicUsize,
    pub updates: AtomicUsize,
    pub last_entry: Mutex<Option<CmsEntry>>,
}

impl FakeCms {
    pub fn with_content_type(content_type: &str) -> Self {
        Self {
            content_type: content_type.to_string(),
            gets: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            last_entry: Mutex::new(None),
        }
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CmsManagementApi for FakeCms {
    async fn get_entry(
        &self,
        _space: &str,
        _environment: &str,
        entry_id: &str,
    ) -> Result<CmsEntry, CmsError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(CmsEntry {
            sys: EntrySys {
                id: entry_id.to_string(),
                version: 1,
                content_type: TypeLink {
                    sys: TypeLinkSys {
                        id: self.content_type.clone(),
                    },
                },
            },
            fields: serde_json::Map::new(),
        })
    }

    async fn update_entry(
        &self,
        _space: &str,
        _environment: &str,
        entry: &CmsEntry,
    ) -> Result<CmsEntry, CmsError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        *self.last_entry.lock().unwrap() = Some(entry.clone());
        Ok(entry.clone())
    }
}

/// CMS delivery fake: slug-keyed documents, entry lookup by id.
#[derive(Default)]
pub struct FakeDelivery {
    pub documents: Mutex<HashMap<String, Value>>,
}

impl FakeDelivery {
    pub fn with_document(slug: &str, document: Value) -> Self {
        let fake = Self::default();
        fake.documents
            .lock()
            .unwrap()
            .insert(slug.to_string(), document);
        fake
    }
}

#[async_trait]
impl CmsDeliveryApi for FakeDelivery {
    async fn entries_by_slug(
        &self,
        _space: &str,
        _environment: &str,
        _content_type: &str,
        slug: &str,
        _locale: Option<&str>,
    ) -> Result<Vec<Value>, CmsError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .get(slug)
            .cloned()
            .into_iter()
            .collect())
    }

    async fn entry(
        &self,
        space: &str,
        _environment: &str,
        entry_id: &str,
    ) -> Result<Value, CmsError> {
        if entry_id == "missing" {
            return Err(CmsError::NotFound(entry_id.to_string()));
        }
        Ok(serde_json::json!({"sys": {"id": entry_id, "space": space}}))
    }
}

/// Builds a pipeline wired to the given fakes, with test-friendly settings.
pub fn build_pipeline(
    renderer: Arc<FakeRenderer>,
    dam: Arc<FakeDam>,
    cms: Arc<FakeCms>,
    metrics: Arc<Metrics>,
    require_identifiers: bool,
) -> Pipeline {
    let assets = AssetRepository::new(dam, "test-org".to_string());
    let updater = EntryUpdater::new(
        cms,
        "patientEducation".to_string(),
        "pdf".to_string(),
        "en-US".to_string(),
    );

    Pipeline::new(
        renderer,
        assets,
        updater,
        metrics,
        PipelineSettings {
            base_url: "http://localhost:3000".to_string(),
            page_route: "pt-ed".to_string(),
            system_actor_id: SYSTEM_ACTOR.to_string(),
            require_identifiers,
        },
    )
}

/// Canonical valid event used across scenarios.
pub fn event(slug: Option<&str>, entity: Option<&str>, actor: &str) -> WebhookEvent {
    WebhookEvent {
        entity_id: entity.map(str::to_string),
        space_id: entity.map(|_| "S1".to_string()),
        environment: "master".to_string(),
        slug: slug.map(str::to_string),
        actor_id: Some(actor.to_string()),
    }
}
