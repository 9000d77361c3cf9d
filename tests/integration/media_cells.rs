//! Integration tests for media cells and sharing modes

use crate::integration::test_utils::ScriptedService;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use vitrine::cell::{CellState, CellView, MediaCell, MediaPipeline, SharingMode};
use vitrine::generation::RetryPolicy;
use vitrine::provider::ImageService;

fn pipeline(service: &Arc<ScriptedService>, mode: SharingMode) -> MediaPipeline {
    MediaPipeline::new(
        Arc::clone(service) as Arc<dyn ImageService>,
        RetryPolicy::default(),
        mode,
    )
}

#[tokio::test(start_paused = true)]
async fn test_cell_lifecycle_placeholder_to_image() {
    let service = Arc::new(ScriptedService::flaky(2, "QQ=="));
    let mut cell = MediaCell::mount("Black Jeep Wrangler trunk open", &pipeline(&service, SharingMode::Independent));

    assert_eq!(cell.view(), CellView::Placeholder);
    sleep(Duration::from_millis(1500)).await;
    assert_eq!(cell.refresh(), &CellState::Loading);
    assert_eq!(cell.attempts(), 2);

    cell.settle().await;
    assert_eq!(
        cell.view(),
        CellView::Image {
            src: "data:image/png;base64,QQ==".to_string(),
            alt: "Black Jeep Wrangler trunk open".to_string(),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_cell_does_not_affect_sibling() {
    let service = Arc::new(ScriptedService::new(
        vec![Err(vitrine::error::MediaError::MissingPayload)],
        Ok(vitrine::asset::GeneratedAsset::png("QQ==")),
    ));
    let failing = Arc::new(ScriptedService::failing());

    let mut healthy = MediaCell::mount("oak board", &pipeline(&service, SharingMode::Independent));
    let mut broken = MediaCell::mount("oak board", &pipeline(&failing, SharingMode::Independent));

    let (a, b) = tokio::join!(healthy.settle(), broken.settle());
    assert!(matches!(a, CellState::Ready(_)));
    assert_eq!(b, &CellState::Error);
    assert_eq!(broken.view(), CellView::ErrorMarker { label: "Error" });
}

#[tokio::test(start_paused = true)]
async fn test_independent_cells_issue_separate_sequences() {
    let service = Arc::new(ScriptedService::succeeding("QQ=="));
    let pipeline = pipeline(&service, SharingMode::Independent);
    let mut first = MediaCell::mount("artisan tools workshop moody", &pipeline);
    let mut second = MediaCell::mount("artisan tools workshop moody", &pipeline);

    first.settle().await;
    second.settle().await;
    assert_eq!(service.calls_for("artisan tools workshop moody"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_coalesced_cells_share_one_sequence() {
    let service = Arc::new(ScriptedService::flaky(1, "QQ=="));
    let pipeline = pipeline(&service, SharingMode::Coalesced);
    let mut first = MediaCell::mount("artisan measuring wood", &pipeline);
    let mut second = MediaCell::mount("artisan measuring wood", &pipeline);

    first.settle().await;
    second.settle().await;
    assert_eq!(service.calls(), 2);
    assert_eq!(first.state(), second.state());
    assert_eq!(pipeline.hub().unwrap().lease_count("artisan measuring wood"), 2);

    first.unmount();
    assert_eq!(pipeline.hub().unwrap().lease_count("artisan measuring wood"), 1);
    second.unmount();
    assert_eq!(pipeline.hub().unwrap().active_keys(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unmount_cancels_pending_retry() {
    let service = Arc::new(ScriptedService::failing());
    let mut cell = MediaCell::mount("holster", &pipeline(&service, SharingMode::Independent));

    sleep(Duration::from_millis(2000)).await;
    let calls_before = service.calls();
    cell.unmount();
    sleep(Duration::from_secs(120)).await;

    assert_eq!(service.calls(), calls_before);
    assert_eq!(cell.refresh(), &CellState::Loading);
}
