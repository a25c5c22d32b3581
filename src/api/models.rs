//! Wire models for the webhook endpoint.
//!
//! The inbound payload is duck-typed across CMS webhook configurations: the
//! actor id sometimes arrives as a flat `actorId`/`userId`, sometimes nested
//! under `sys.publishedBy.sys.id`. The raw shape is accepted here and
//! normalized into one canonical `WebhookEvent` by `api::validation`, so
//! downstream logic is isolated from upstream payload drift.
//!
//! Example payload:
//!
//! ```json
//! {
//!   "entityId": "entry-id",
//!   "spaceId": "space-id",
//!   "environment": "master",
//!   "slug": { "en-US": "asthma-care" },
//!   "sys": { "publishedBy": { "sys": { "id": "user-1" } } },
//!   "parameters": { "text": "Entity version: 1" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Raw inbound webhook payload, every field optional at the boundary.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookPayload {
    pub entity_id: Option<String>,
    pub space_id: Option<String>,
    pub environment: Option<String>,
    pub actor_id: Option<String>,
    pub user_id: Option<String>,
    /// Locale-keyed slug mapping; only the canonical locale is consulted.
    pub slug: Option<HashMap<String, String>>,
    pub parameters: Option<Value>,
    pub sys: Option<PayloadSys>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PayloadSys {
    pub published_by: Option<ActorLink>,
    pub updated_by: Option<ActorLink>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActorLink {
    pub sys: ActorSys,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActorSys {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, String>,
    pub version: String,
}
