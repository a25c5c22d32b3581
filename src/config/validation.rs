use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("render.{field} must not be empty")]
    EmptyRenderField { field: &'static str },

    #[error("dam.base_url must not be empty")]
    EmptyDamBaseUrl,

    #[error("cms.{field} must not be empty")]
    EmptyCmsField { field: &'static str },

    #[error("webhook.locale must not be empty")]
    EmptyLocale,

    #[error("{field} timeout must be positive")]
    ZeroTimeout { field: &'static str },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_render(config)?;
    validate_dam(config)?;
    validate_cms(config)?;
    validate_webhook(config)?;
    Ok(())
}

fn validate_render(config: &Config) -> Result<(), ValidationError> {
    if config.render.endpoint.trim().is_empty() {
        return Err(ValidationError::EmptyRenderField { field: "endpoint" });
    }
    if config.render.base_url.trim().is_empty() {
        return Err(ValidationError::EmptyRenderField { field: "base_url" });
    }
    if config.render.page_route.trim().is_empty() {
        return Err(ValidationError::EmptyRenderField { field: "page_route" });
    }
    if config.render.navigation_timeout_ms == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "render.navigation_timeout_ms",
        });
    }
    if config.render.request_timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "render.request_timeout_secs",
        });
    }
    Ok(())
}

fn validate_dam(config: &Config) -> Result<(), ValidationError> {
    if config.dam.base_url.trim().is_empty() {
        return Err(ValidationError::EmptyDamBaseUrl);
    }
    if config.dam.request_timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "dam.request_timeout_secs",
        });
    }
    Ok(())
}

fn validate_cms(config: &Config) -> Result<(), ValidationError> {
    if config.cms.content_type.trim().is_empty() {
        return Err(ValidationError::EmptyCmsField {
            field: "content_type",
        });
    }
    if config.cms.target_field.trim().is_empty() {
        return Err(ValidationError::EmptyCmsField {
            field: "target_field",
        });
    }
    // A blank system actor would defeat the loop-prevention gate.
    if config.cms.system_actor_id.trim().is_empty() {
        return Err(ValidationError::EmptyCmsField {
            field: "system_actor_id",
        });
    }
    if config.cms.request_timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "cms.request_timeout_secs",
        });
    }
    Ok(())
}

fn validate_webhook(config: &Config) -> Result<(), ValidationError> {
    if config.webhook.locale.trim().is_empty() {
        return Err(ValidationError::EmptyLocale);
    }
    Ok(())
}
