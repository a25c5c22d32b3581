use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub dam: DamConfig,
    #[serde(default)]
    pub cms: CmsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap()
}

fn default_max_payload_bytes() -> usize {
    1024 * 1024 // 1 MB
}

/// Inbound webhook gating configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookConfig {
    /// Shared secret for the `x-webhook-secret` header.
    /// Loaded from environment, never from the config file.
    /// When unset the authentication gate is disabled.
    #[serde(skip)]
    pub shared_secret: Option<String>,
    /// When true, events missing entityId/spaceId are rejected outright.
    /// When false the pipeline renders and uploads but skips the link stage.
    #[serde(default = "default_require_identifiers")]
    pub require_identifiers: bool,
    /// Canonical locale key consulted in the slug mapping.
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            shared_secret: None,
            require_identifiers: default_require_identifiers(),
            locale: default_locale(),
        }
    }
}

fn default_require_identifiers() -> bool {
    true
}

fn default_locale() -> String {
    "en-US".to_string()
}

/// Page rendering configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    /// Headless-browser rendering endpoint (browserless-style `POST /pdf`)
    #[serde(default = "default_render_endpoint")]
    pub endpoint: String,
    /// Base URL of the site hosting the renderable pages
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Route segment between base URL and slug
    #[serde(default = "default_page_route")]
    pub page_route: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_render_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Bound on the browser's navigation wait inside the render call
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_render_endpoint(),
            base_url: default_base_url(),
            page_route: default_page_route(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_render_timeout_secs(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
        }
    }
}

fn default_render_endpoint() -> String {
    "http://localhost:3001/pdf".to_string()
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_page_route() -> String {
    "pt-ed".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_render_timeout_secs() -> u64 {
    30
}

fn default_navigation_timeout_ms() -> u64 {
    10_000
}

/// Digital-asset-management store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DamConfig {
    #[serde(default = "default_dam_base_url")]
    pub base_url: String,
    /// Permanent API token (loaded from environment, not from config file)
    #[serde(skip)]
    pub token: Option<String>,
    #[serde(default)]
    pub brand_id: String,
    /// Organization value stamped into the asset metadata tuple
    #[serde(default = "default_organization")]
    pub organization: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_dam_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for DamConfig {
    fn default() -> Self {
        Self {
            base_url: default_dam_base_url(),
            token: None,
            brand_id: String::new(),
            organization: default_organization(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_dam_timeout_secs(),
        }
    }
}

fn default_dam_base_url() -> String {
    "https://dam.example.com".to_string()
}

fn default_organization() -> String {
    "default".to_string()
}

fn default_dam_timeout_secs() -> u64 {
    60
}

/// Content-management system configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CmsConfig {
    #[serde(default = "default_management_base_url")]
    pub management_base_url: String,
    #[serde(default = "default_delivery_base_url")]
    pub delivery_base_url: String,
    /// Management API token (environment only)
    #[serde(skip)]
    pub management_token: Option<String>,
    /// Delivery API token (environment only)
    #[serde(skip)]
    pub delivery_token: Option<String>,
    /// Default space/environment used by the content fetcher
    #[serde(default)]
    pub space: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    /// The single content type this pipeline is authorized to mutate
    #[serde(default = "default_content_type")]
    pub content_type: String,
    /// The single entry field receiving the asset link
    #[serde(default = "default_target_field")]
    pub target_field: String,
    /// Actor id the entry updates are attributed to; inbound events from
    /// this actor short-circuit the pipeline
    #[serde(default = "default_system_actor_id")]
    pub system_actor_id: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_cms_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            management_base_url: default_management_base_url(),
            delivery_base_url: default_delivery_base_url(),
            management_token: None,
            delivery_token: None,
            space: String::new(),
            environment: default_environment(),
            content_type: default_content_type(),
            target_field: default_target_field(),
            system_actor_id: default_system_actor_id(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_cms_timeout_secs(),
        }
    }
}

fn default_management_base_url() -> String {
    "https://api.contentful.com".to_string()
}

fn default_delivery_base_url() -> String {
    "https://cdn.contentful.com".to_string()
}

fn default_environment() -> String {
    "master".to_string()
}

fn default_content_type() -> String {
    "patientEducation".to_string()
}

fn default_target_field() -> String {
    "pdf".to_string()
}

fn default_system_actor_id() -> String {
    "SYSTEM".to_string()
}

fn default_cms_timeout_secs() -> u64 {
    30
}
