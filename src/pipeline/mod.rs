//! Webhook orchestration: gates, the render -> upload -> link state machine,
//! and the structured outcome contract.
//!
//! Side effects are strictly ordered and never parallelized; no stage is
//! retried inside one invocation. Retry is achieved by the CMS redelivering
//! the webhook, which is safe because the upload stage is idempotent.

mod outcome;

pub use outcome::{OutcomeMetadata, PipelineOutcome, StageReport, StageStatus, Workflow};

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::cms::EntryUpdater;
use crate::config::Config;
use crate::dam::AssetRepository;
use crate::observability::Metrics;
use crate::render::Renderer;

const LOOP_PREVENTION_REASON: &str = "infinite-loop-prevention";

/// Normalized inbound trigger. Produced by the boundary adapter in
/// `api::validation`; downstream logic never sees raw payload shapes.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub entity_id: Option<String>,
    pub space_id: Option<String>,
    pub environment: String,
    /// Canonical-locale slug, when present in the payload.
    pub slug: Option<String>,
    /// The actor that produced the underlying content change.
    pub actor_id: Option<String>,
}

/// Validation-gate rejections. Raised before any side effect occurs and
/// mapped to 400-class responses at the HTTP boundary.
#[derive(Debug, Error)]
pub enum EventRejection {
    #[error("missing required field: slug")]
    MissingSlug,

    #[error("missing required fields: entityId and spaceId")]
    MissingIdentifiers,
}

/// Pipeline tuning extracted from the configuration.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub base_url: String,
    pub page_route: String,
    pub system_actor_id: String,
    pub require_identifiers: bool,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.render.base_url.clone(),
            page_route: config.render.page_route.clone(),
            system_actor_id: config.cms.system_actor_id.clone(),
            require_identifiers: config.webhook.require_identifiers,
        }
    }
}

/// The orchestrator. Owns the gating decision and the outcome; the
/// collaborators own only their own results and have no visibility into
/// sibling stages.
pub struct Pipeline {
    renderer: Arc<dyn Renderer>,
    assets: AssetRepository,
    updater: EntryUpdater,
    metrics: Arc<Metrics>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        assets: AssetRepository,
        updater: EntryUpdater,
        metrics: Arc<Metrics>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            renderer,
            assets,
            updater,
            metrics,
            settings,
        }
    }

    fn metadata_for(&self, event: &WebhookEvent) -> OutcomeMetadata {
        OutcomeMetadata {
            slug: event.slug.clone(),
            entity_id: event.entity_id.clone(),
            space_id: event.space_id.clone(),
            environment: event.environment.clone(),
            actor_id: event.actor_id.clone(),
            processed_at: Utc::now(),
        }
    }

    fn render_target(&self, slug: &str) -> String {
        format!(
            "{}/{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.page_route.trim_matches('/'),
            slug
        )
    }

    /// Runs the full gate/stage machine for one delivery.
    ///
    /// `Err` means a validation-gate rejection with zero side effects.
    /// `Ok` carries the outcome, including stage failures (`success:false`).
    pub async fn handle(&self, event: WebhookEvent) -> Result<PipelineOutcome, EventRejection> {
        self.metrics.webhook_received();

        // Loop-prevention gate. The entry updater's own write is attributed
        // to the system actor; events from that actor must short-circuit or
        // the webhook->update->webhook cycle never terminates.
        if event.actor_id.as_deref() == Some(self.settings.system_actor_id.as_str()) {
            info!(
                actor_id = %self.settings.system_actor_id,
                entity_id = event.entity_id.as_deref().unwrap_or("unknown"),
                "Skipping delivery attributed to the system actor"
            );
            self.metrics.pipeline_skipped();
            return Ok(PipelineOutcome {
                success: true,
                message: "Webhook skipped - event attributed to system actor".to_string(),
                skipped: true,
                reason: Some(LOOP_PREVENTION_REASON.to_string()),
                workflow: Workflow::all_skipped(LOOP_PREVENTION_REASON),
                metadata: self.metadata_for(&event),
            });
        }

        // Validation gate: no side effects before this point either.
        let slug = match event.slug.as_deref() {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => return Err(EventRejection::MissingSlug),
        };

        let identifiers = match (event.entity_id.as_deref(), event.space_id.as_deref()) {
            (Some(entity), Some(space)) if !entity.is_empty() && !space.is_empty() => {
                Some((entity.to_string(), space.to_string()))
            }
            _ if self.settings.require_identifiers => {
                return Err(EventRejection::MissingIdentifiers);
            }
            _ => None,
        };

        let mut workflow = Workflow::pending();
        let metadata = self.metadata_for(&event);

        // Render stage
        let target = self.render_target(&slug);
        let render = self.renderer.render(&target, &slug).await;

        if !render.success {
            let detail = render.error.unwrap_or_else(|| "unknown error".to_string());
            warn!(slug, target, error = %detail, "Render stage failed");
            workflow.render = StageReport::failed("RENDER_FAILED", detail);
            workflow.upload = StageReport::skipped("render failed");
            workflow.link = StageReport::skipped("render failed");
            self.metrics.render_failed();
            self.metrics.pipeline_failed();
            return Ok(PipelineOutcome {
                success: false,
                message: "Workflow failed at the render stage".to_string(),
                skipped: false,
                reason: None,
                workflow,
                metadata,
            });
        }

        let file_name = render.file_name.clone();
        let file_size = render.buffer.len();
        workflow.render = StageReport::completed_file(&file_name, file_size);

        // Upload stage. The correlation id keys the idempotent lookup; in
        // degraded mode (no identifiers) the slug stands in for the entry id
        // so redeliveries still converge on one asset.
        let correlation_id = identifiers
            .as_ref()
            .map(|(entity, _)| entity.clone())
            .unwrap_or_else(|| slug.clone());

        let asset = match self
            .assets
            .upload(render.buffer, &file_name, &correlation_id)
            .await
        {
            Ok(asset) => asset,
            Err(e) => {
                warn!(slug, file_name, error = %e, "Upload stage failed");
                workflow.upload = StageReport::failed("UPLOAD_FAILED", e.to_string());
                workflow.link = StageReport::skipped("upload failed");
                self.metrics.upload_failed();
                self.metrics.pipeline_failed();
                return Ok(PipelineOutcome {
                    success: false,
                    message: "Workflow failed at the upload stage".to_string(),
                    skipped: false,
                    reason: None,
                    workflow,
                    metadata,
                });
            }
        };

        workflow.upload = StageReport::completed_asset(&asset.id);

        // Link stage
        let Some((entity_id, space_id)) = identifiers else {
            workflow.link = StageReport::skipped("missing identifiers");
            self.metrics.pipeline_completed();
            return Ok(PipelineOutcome {
                success: true,
                message: "Workflow completed without entry update (missing identifiers)"
                    .to_string(),
                skipped: false,
                reason: None,
                workflow,
                metadata,
            });
        };

        if let Err(e) = self
            .updater
            .link(&entity_id, &space_id, &event.environment, &asset)
            .await
        {
            // The uploaded asset persists without a CMS back-reference;
            // redelivering the webhook resolves it since the upload stage
            // is idempotent.
            warn!(entity_id, asset_id = %asset.id, error = %e, "Link stage failed");
            workflow.link = StageReport::failed(e.code(), e.to_string());
            self.metrics.link_failed();
            self.metrics.pipeline_failed();
            return Ok(PipelineOutcome {
                success: false,
                message: "Workflow failed at the link stage".to_string(),
                skipped: false,
                reason: None,
                workflow,
                metadata,
            });
        }

        workflow.link = StageReport::completed();
        info!(slug, entity_id, asset_id = %asset.id, "Workflow completed");
        self.metrics.pipeline_completed();

        Ok(PipelineOutcome {
            success: true,
            message: "Workflow completed successfully".to_string(),
            skipped: false,
            reason: None,
            workflow,
            metadata,
        })
    }
}
