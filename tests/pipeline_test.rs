//! Orchestrator scenarios driven through `Pipeline::handle` with counting
//! fakes for every collaborator.

mod common;

use std::sync::Arc;

use common::{FakeCms, FakeDam, FakeRenderer, SYSTEM_ACTOR, build_pipeline, event};
use pdfrelay::observability::Metrics;
use pdfrelay::pipeline::{EventRejection, StageStatus};

#[tokio::test]
async fn full_success_runs_every_stage_once() {
    let renderer = Arc::new(FakeRenderer::succeeding());
    let dam = Arc::new(FakeDam::default());
    let cms = Arc::new(FakeCms::with_content_type("patientEducation"));
    let metrics = Arc::new(Metrics::new());
    let pipeline = build_pipeline(renderer.clone(), dam.clone(), cms.clone(), metrics, true);

    let outcome = pipeline
        .handle(event(Some("asthma-care"), Some("E1"), "editor-1"))
        .await
        .unwrap();

    assert!(outcome.success);
    assert!(!outcome.skipped);
    assert_eq!(outcome.workflow.render.status, StageStatus::Completed);
    assert_eq!(outcome.workflow.upload.status, StageStatus::Completed);
    assert_eq!(outcome.workflow.link.status, StageStatus::Completed);
    assert_eq!(
        outcome.workflow.render.file_name.as_deref(),
        Some("asthma-care.pdf")
    );
    assert_eq!(outcome.workflow.render.file_size, Some(10));
    assert_eq!(
        outcome.workflow.upload.asset_id.as_deref(),
        Some("media-1")
    );

    assert_eq!(renderer.call_count(), 1);
    assert_eq!(dam.create_count(), 1);
    assert_eq!(dam.replacement_count(), 0);
    assert_eq!(cms.update_count(), 1);
}

#[tokio::test]
async fn redelivery_replaces_content_under_same_asset() {
    let renderer = Arc::new(FakeRenderer::succeeding());
    let dam = Arc::new(FakeDam::default());
    let cms = Arc::new(FakeCms::with_content_type("patientEducation"));
    let metrics = Arc::new(Metrics::new());
    let pipeline = build_pipeline(renderer, dam.clone(), cms, metrics, true);

    let first = pipeline
        .handle(event(Some("asthma-care"), Some("E1"), "editor-1"))
        .await
        .unwrap();
    let second = pipeline
        .handle(event(Some("asthma-care"), Some("E1"), "editor-1"))
        .await
        .unwrap();

    assert_eq!(
        first.workflow.upload.asset_id,
        second.workflow.upload.asset_id
    );
    assert_eq!(dam.create_count(), 1);
    assert_eq!(dam.replacement_count(), 1);
    assert_eq!(dam.search_count(), 2);
}

#[tokio::test]
async fn system_actor_delivery_is_skipped_with_zero_side_effects() {
    let renderer = Arc::new(FakeRenderer::succeeding());
    let dam = Arc::new(FakeDam::default());
    let cms = Arc::new(FakeCms::with_content_type("patientEducation"));
    let metrics = Arc::new(Metrics::new());
    let pipeline = build_pipeline(
        renderer.clone(),
        dam.clone(),
        cms.clone(),
        metrics.clone(),
        true,
    );

    let outcome = pipeline
        .handle(event(Some("asthma-care"), Some("E1"), SYSTEM_ACTOR))
        .await
        .unwrap();

    assert!(outcome.success);
    assert!(outcome.skipped);
    assert_eq!(outcome.reason.as_deref(), Some("infinite-loop-prevention"));
    for report in [
        &outcome.workflow.render,
        &outcome.workflow.upload,
        &outcome.workflow.link,
    ] {
        assert_eq!(report.status, StageStatus::Skipped);
        assert_eq!(report.reason.as_deref(), Some("infinite-loop-prevention"));
    }

    assert_eq!(renderer.call_count(), 0);
    assert_eq!(dam.search_count(), 0);
    assert_eq!(cms.get_count(), 0);
    assert_eq!(metrics.snapshot().pipelines_skipped, 1);
}

#[tokio::test]
async fn missing_slug_rejects_before_any_side_effect() {
    let renderer = Arc::new(FakeRenderer::succeeding());
    let dam = Arc::new(FakeDam::default());
    let cms = Arc::new(FakeCms::with_content_type("patientEducation"));
    let metrics = Arc::new(Metrics::new());
    let pipeline = build_pipeline(renderer.clone(), dam.clone(), cms.clone(), metrics, true);

    let err = pipeline
        .handle(event(None, Some("E1"), "editor-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, EventRejection::MissingSlug));
    assert_eq!(renderer.call_count(), 0);
    assert_eq!(dam.search_count(), 0);
    assert_eq!(cms.get_count(), 0);
}

#[tokio::test]
async fn missing_identifiers_reject_when_required() {
    let renderer = Arc::new(FakeRenderer::succeeding());
    let dam = Arc::new(FakeDam::default());
    let cms = Arc::new(FakeCms::with_content_type("patientEducation"));
    let metrics = Arc::new(Metrics::new());
    let pipeline = build_pipeline(renderer.clone(), dam.clone(), cms, metrics, true);

    let err = pipeline
        .handle(event(Some("asthma-care"), None, "editor-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, EventRejection::MissingIdentifiers));
    assert_eq!(renderer.call_count(), 0);
    assert_eq!(dam.search_count(), 0);
}

#[tokio::test]
async fn missing_identifiers_degrade_to_link_skip_when_not_required() {
    let renderer = Arc::new(FakeRenderer::succeeding());
    let dam = Arc::new(FakeDam::default());
    let cms = Arc::new(FakeCms::with_content_type("patientEducation"));
    let metrics = Arc::new(Metrics::new());
    let pipeline = build_pipeline(renderer.clone(), dam.clone(), cms.clone(), metrics, false);

    let outcome = pipeline
        .handle(event(Some("asthma-care"), None, "editor-1"))
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.workflow.render.status, StageStatus::Completed);
    assert_eq!(outcome.workflow.upload.status, StageStatus::Completed);
    assert_eq!(outcome.workflow.link.status, StageStatus::Skipped);
    assert_eq!(
        outcome.workflow.link.reason.as_deref(),
        Some("missing identifiers")
    );

    // The slug stands in as correlation id so redeliveries still converge.
    let metadata = dam.last_metadata.lock().unwrap().clone().unwrap();
    assert_eq!(metadata.subject_id, "asthma-care");

    assert_eq!(renderer.call_count(), 1);
    assert_eq!(dam.create_count(), 1);
    assert_eq!(cms.get_count(), 0);
    assert_eq!(cms.update_count(), 0);
}

#[tokio::test]
async fn render_failure_skips_downstream_stages() {
    let renderer = Arc::new(FakeRenderer::failing("navigation timed out"));
    let dam = Arc::new(FakeDam::default());
    let cms = Arc::new(FakeCms::with_content_type("patientEducation"));
    let metrics = Arc::new(Metrics::new());
    let pipeline = build_pipeline(renderer, dam.clone(), cms.clone(), metrics.clone(), true);

    let outcome = pipeline
        .handle(event(Some("asthma-care"), Some("E1"), "editor-1"))
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.workflow.render.status, StageStatus::Failed);
    assert_eq!(
        outcome.workflow.render.reason.as_deref(),
        Some("RENDER_FAILED")
    );
    assert_eq!(
        outcome.workflow.render.error.as_deref(),
        Some("navigation timed out")
    );
    assert_eq!(outcome.workflow.upload.status, StageStatus::Skipped);
    assert_eq!(outcome.workflow.link.status, StageStatus::Skipped);
    assert_eq!(outcome.error_stage(), Some("render"));
    assert_eq!(outcome.workflow_status(), "render-failed");

    assert_eq!(dam.search_count(), 0);
    assert_eq!(cms.get_count(), 0);
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.pipelines_failed, 1);
    assert_eq!(snapshot.render_failures, 1);
    assert_eq!(snapshot.upload_failures, 0);
}

#[tokio::test]
async fn upload_failure_skips_link_stage() {
    let renderer = Arc::new(FakeRenderer::succeeding());
    let dam = Arc::new(FakeDam::failing());
    let cms = Arc::new(FakeCms::with_content_type("patientEducation"));
    let metrics = Arc::new(Metrics::new());
    let pipeline = build_pipeline(renderer, dam, cms.clone(), metrics, true);

    let outcome = pipeline
        .handle(event(Some("asthma-care"), Some("E1"), "editor-1"))
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.workflow.render.status, StageStatus::Completed);
    assert_eq!(outcome.workflow.upload.status, StageStatus::Failed);
    assert_eq!(
        outcome.workflow.upload.reason.as_deref(),
        Some("UPLOAD_FAILED")
    );
    assert_eq!(outcome.workflow.link.status, StageStatus::Skipped);
    assert_eq!(outcome.error_stage(), Some("upload"));
    assert_eq!(cms.get_count(), 0);
}

#[tokio::test]
async fn wrong_content_type_fails_link_but_keeps_upload() {
    let renderer = Arc::new(FakeRenderer::succeeding());
    let dam = Arc::new(FakeDam::default());
    let cms = Arc::new(FakeCms::with_content_type("newsArticle"));
    let metrics = Arc::new(Metrics::new());
    let pipeline = build_pipeline(renderer, dam.clone(), cms.clone(), metrics, true);

    let outcome = pipeline
        .handle(event(Some("asthma-care"), Some("E1"), "editor-1"))
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.workflow.upload.status, StageStatus::Completed);
    assert_eq!(outcome.workflow.link.status, StageStatus::Failed);
    assert_eq!(
        outcome.workflow.link.reason.as_deref(),
        Some("WRONG_CONTENT_TYPE")
    );
    assert_eq!(outcome.error_stage(), Some("link"));
    assert_eq!(outcome.workflow_status(), "link-failed");

    // The upload already happened; the entry was inspected but never written.
    assert_eq!(dam.create_count(), 1);
    assert_eq!(cms.get_count(), 1);
    assert_eq!(cms.update_count(), 0);
}

#[tokio::test]
async fn metrics_track_pipeline_terminal_states() {
    let renderer = Arc::new(FakeRenderer::succeeding());
    let dam = Arc::new(FakeDam::default());
    let cms = Arc::new(FakeCms::with_content_type("patientEducation"));
    let metrics = Arc::new(Metrics::new());
    let pipeline = build_pipeline(renderer, dam, cms, metrics.clone(), true);

    pipeline
        .handle(event(Some("asthma-care"), Some("E1"), "editor-1"))
        .await
        .unwrap();
    pipeline
        .handle(event(Some("asthma-care"), Some("E1"), SYSTEM_ACTOR))
        .await
        .unwrap();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.webhooks_received, 2);
    assert_eq!(snapshot.pipelines_completed, 1);
    assert_eq!(snapshot.pipelines_skipped, 1);
    assert_eq!(snapshot.pipelines_failed, 0);
}
