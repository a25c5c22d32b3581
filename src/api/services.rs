use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use http_body_util::BodyExt;
use serde_json::Value;

use super::state::AppState;
use crate::api::error::ApiError;

/// Header carrying the deployment's shared secret, when one is configured.
pub const SHARED_SECRET_HEADER: &str = "x-webhook-secret";

const WORKFLOW_STATUS_HEADER: &str = "x-pdf-workflow-status";
const ENTRY_ID_HEADER: &str = "x-pdf-entry-id";
const ERROR_STAGE_HEADER: &str = "x-pdf-error-stage";

/// Webhook endpoint (POST /webhook/pdf)
///
/// Triggered by the CMS whenever a content editor updates a record. Runs the
/// render -> upload -> link pipeline and answers with a [`PipelineOutcome`]
/// describing every stage.
///
/// ## Flow:
/// 1. Authentication gate: `x-webhook-secret` must match when configured
/// 2. Content-Type and size validation
/// 3. Payload normalization into a canonical WebhookEvent
/// 4. Pipeline invocation (loop-prevention and validation gates live there)
/// 5. 200 with the outcome on success or clean skip; 400 on validation
///    rejection; 500 with the outcome when a stage failed
///
/// Diagnostic response headers (workflow status, entry id, error stage) are
/// informational only, not part of the contract a client must parse.
///
/// [`PipelineOutcome`]: crate::pipeline::PipelineOutcome
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<axum::response::Response, ApiError> {
    // Authentication gate: rejected before any side effect.
    if let Some(expected) = &state.config.webhook.shared_secret {
        let provided = headers
            .get(SHARED_SECRET_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
            return Err(ApiError::Unauthenticated);
        }
    }

    require_json(&headers)?;

    // Read body (decompression handled by RequestDecompressionLayer)
    let body_bytes = read_body(body, state.config.server.max_payload_bytes).await?;

    let payload: super::models::WebhookPayload = serde_json::from_slice(&body_bytes)?;

    // Normalize the duck-typed payload into the canonical event shape.
    let event = super::validation::normalize_event(payload, &state.config.webhook.locale);
    let entry_id = event.entity_id.clone().unwrap_or_else(|| "unknown".to_string());

    let delivery_id = uuid::Uuid::new_v4();
    tracing::info!(
        %delivery_id,
        entry_id,
        slug = event.slug.as_deref().unwrap_or(""),
        actor_id = event.actor_id.as_deref().unwrap_or("unknown"),
        "Webhook delivery received"
    );

    // Validation-gate rejections map to 400 responses with no side effects.
    let outcome = state.pipeline.handle(event).await?;

    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let workflow_status = outcome.workflow_status();
    let error_stage = outcome.error_stage();

    let mut response = (status, Json(outcome)).into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(
        WORKFLOW_STATUS_HEADER,
        HeaderValue::from_static(workflow_status),
    );
    response_headers.insert(
        ENTRY_ID_HEADER,
        HeaderValue::from_str(&entry_id).unwrap_or_else(|_| HeaderValue::from_static("unknown")),
    );
    if let Some(stage) = error_stage {
        response_headers.insert(ERROR_STAGE_HEADER, HeaderValue::from_static(stage));
    }

    Ok(response)
}

/// Secret comparison that does not leak the mismatch position through timing.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// The webhook body must be `application/json` (a charset parameter is fine;
/// `text/json` and friends are not).
fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::InvalidPayload("missing Content-Type header".into()))?;

    let media_type: mime::Mime = content_type
        .parse()
        .map_err(|_| ApiError::InvalidPayload(format!("invalid Content-Type: {content_type}")))?;

    if media_type.type_() != mime::APPLICATION || media_type.subtype() != mime::JSON {
        return Err(ApiError::InvalidPayload(format!(
            "Content-Type must be application/json, got: {}",
            media_type.essence_str()
        )));
    }

    Ok(())
}

/// Reads the request body, enforcing the configured size cap.
async fn read_body(body: axum::body::Body, max_size: usize) -> Result<Vec<u8>, ApiError> {
    let data = body
        .collect()
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
        .to_bytes()
        .to_vec();

    if data.len() > max_size {
        return Err(ApiError::PayloadTooLarge(data.len()));
    }

    Ok(data)
}

/// Content endpoint (GET /content/{slug})
///
/// Read-only lookup of the document backing a renderable page: the delivery
/// API is queried for the canonical-locale slug, and any cross-space resource
/// links in `fields.relatedContent` are dereferenced. Links that fail to
/// resolve are dropped from the list, not surfaced as errors.
pub async fn get_content(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let locale = state.config.webhook.locale.clone();

    let mut document = state
        .content
        .fetch_by_slug(&slug, Some(&locale))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(slug.clone()))?;

    let related = document["fields"]["relatedContent"].as_array().cloned();
    if let Some(related) = related {
        let resolved = state.content.resolve_related(&related).await;
        document["fields"]["relatedContent"] = Value::Array(resolved);
    }

    Ok(Json(document))
}

/// Health check endpoint (GET /health)
///
/// Returns 200 OK with a component map when the service can respond.
pub async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    use std::collections::HashMap;

    let mut components = HashMap::new();

    // In v0 we assume healthy if running; external collaborators are only
    // reachable per delivery, not probed here.
    components.insert("api".to_string(), "healthy".to_string());
    components.insert("renderer".to_string(), "healthy".to_string());
    components.insert("dam".to_string(), "healthy".to_string());
    components.insert("cms".to_string(), "healthy".to_string());

    let all_healthy = components.values().all(|status| status == "healthy");
    let overall_status = if all_healthy { "healthy" } else { "unhealthy" };

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = super::models::HealthResponse {
        status: overall_status.to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (status_code, Json(response))
}
