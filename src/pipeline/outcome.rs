//! Structured result of one webhook delivery.
//!
//! The outcome is constructed once per request and returned as the HTTP
//! response body; it is never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed status set for each pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Completed,
    Failed,
    Skipped,
}

/// Per-stage record: status, reason code on skip/failure, and whatever
/// descriptive detail the stage produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl StageReport {
    fn bare(status: StageStatus) -> Self {
        Self {
            status,
            reason: None,
            error: None,
            file_name: None,
            file_size: None,
            asset_id: None,
            timestamp: None,
        }
    }

    pub fn pending() -> Self {
        Self::bare(StageStatus::Pending)
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::bare(StageStatus::Skipped)
        }
    }

    pub fn failed(reason: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            error: Some(error.into()),
            timestamp: Some(Utc::now()),
            ..Self::bare(StageStatus::Failed)
        }
    }

    pub fn completed() -> Self {
        Self {
            timestamp: Some(Utc::now()),
            ..Self::bare(StageStatus::Completed)
        }
    }

    pub fn completed_file(file_name: impl Into<String>, file_size: usize) -> Self {
        Self {
            file_name: Some(file_name.into()),
            file_size: Some(file_size),
            ..Self::completed()
        }
    }

    pub fn completed_asset(asset_id: impl Into<String>) -> Self {
        Self {
            asset_id: Some(asset_id.into()),
            ..Self::completed()
        }
    }
}

/// The three strictly-ordered pipeline stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub render: StageReport,
    pub upload: StageReport,
    pub link: StageReport,
}

impl Workflow {
    pub fn pending() -> Self {
        Self {
            render: StageReport::pending(),
            upload: StageReport::pending(),
            link: StageReport::pending(),
        }
    }

    pub fn all_skipped(reason: &str) -> Self {
        Self {
            render: StageReport::skipped(reason),
            upload: StageReport::skipped(reason),
            link: StageReport::skipped(reason),
        }
    }
}

/// Request metadata echoed back to the webhook caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    pub environment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    pub processed_at: DateTime<Utc>,
}

/// The single structured outcome describing every stage's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub workflow: Workflow,
    pub metadata: OutcomeMetadata,
}

impl PipelineOutcome {
    /// The first failed stage, if any. Drives the 500-level response and the
    /// diagnostic error-stage header.
    pub fn error_stage(&self) -> Option<&'static str> {
        if self.workflow.render.status == StageStatus::Failed {
            Some("render")
        } else if self.workflow.upload.status == StageStatus::Failed {
            Some("upload")
        } else if self.workflow.link.status == StageStatus::Failed {
            Some("link")
        } else {
            None
        }
    }

    pub fn workflow_status(&self) -> &'static str {
        if self.skipped {
            "skipped"
        } else if self.success {
            "success"
        } else {
            match self.error_stage() {
                Some("render") => "render-failed",
                Some("upload") => "upload-failed",
                Some("link") => "link-failed",
                _ => "failed",
            }
        }
    }
}
