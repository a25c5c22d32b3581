//! Boundary normalization: raw webhook payload -> canonical [`WebhookEvent`].

use super::models::WebhookPayload;
use crate::pipeline::WebhookEvent;

const DEFAULT_ENVIRONMENT: &str = "master";

fn non_empty(id: Option<String>) -> Option<String> {
    id.filter(|id| !id.is_empty())
}

/// Collapses the payload's duck-typed shapes into one event.
///
/// Actor resolution order: flat `actorId`, flat `userId`, nested
/// `sys.publishedBy.sys.id`, nested `sys.updatedBy.sys.id`. A candidate that
/// is present but empty counts as absent, so an empty flat id never masks a
/// nested attribution. The slug mapping is reduced to its canonical-locale
/// value; the environment defaults when absent or empty.
pub fn normalize_event(payload: WebhookPayload, locale: &str) -> WebhookEvent {
    let actor_id = non_empty(payload.actor_id)
        .or_else(|| non_empty(payload.user_id))
        .or_else(|| {
            non_empty(
                payload
                    .sys
                    .as_ref()
                    .and_then(|sys| sys.published_by.as_ref())
                    .map(|link| link.sys.id.clone()),
            )
        })
        .or_else(|| {
            non_empty(
                payload
                    .sys
                    .as_ref()
                    .and_then(|sys| sys.updated_by.as_ref())
                    .map(|link| link.sys.id.clone()),
            )
        });

    let slug = payload
        .slug
        .as_ref()
        .and_then(|mapping| mapping.get(locale))
        .filter(|slug| !slug.is_empty())
        .cloned();

    let environment = payload
        .environment
        .filter(|environment| !environment.is_empty())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

    WebhookEvent {
        entity_id: payload.entity_id.filter(|id| !id.is_empty()),
        space_id: payload.space_id.filter(|id| !id.is_empty()),
        environment,
        slug,
        actor_id,
    }
}
