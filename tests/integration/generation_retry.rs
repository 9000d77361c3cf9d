//! Integration tests for the retrying generation client
//!
//! Tests cover:
//! - First-attempt success
//! - The 1s/2s/4s/8s/16s backoff schedule and the six-attempt budget
//! - Recovery part-way through the schedule
//! - Cancellation during a pending retry

use crate::integration::test_utils::ScriptedService;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use vitrine::generation::{GenerationClient, GenerationPhase, RequestStatus, RetryPolicy};
use vitrine::provider::ImageService;

fn client(service: &Arc<ScriptedService>, prompt: &str) -> GenerationClient {
    GenerationClient::new(
        prompt,
        Arc::clone(service) as Arc<dyn ImageService>,
        RetryPolicy::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_success_without_retry() {
    let service = Arc::new(ScriptedService::succeeding("QQ=="));
    let mut client = client(&service, "aged oak luggage board");
    assert_eq!(client.phase(), GenerationPhase::Idle);

    client.activate();
    let snapshot = client.wait_terminal().await;

    assert_eq!(snapshot.request.status, RequestStatus::Succeeded);
    assert!(snapshot.scheduled_delays.is_empty());
    assert_eq!(snapshot.attempts_made(), 1);
    assert_eq!(
        snapshot.asset.unwrap().data_uri(),
        "data:image/png;base64,QQ=="
    );
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_follows_backoff_schedule() {
    let service = Arc::new(ScriptedService::failing());
    let started = Instant::now();
    let mut client = client(&service, "offroad tires muddy terrain");
    client.activate();

    let snapshot = client.wait_terminal().await;
    assert_eq!(snapshot.request.status, RequestStatus::Failed);
    assert_eq!(snapshot.phase, GenerationPhase::Failed);
    assert!(snapshot.asset.is_none());
    assert_eq!(snapshot.attempts_made(), 6);
    assert_eq!(
        snapshot.scheduled_delays,
        [1, 2, 4, 8, 16].map(Duration::from_secs).to_vec()
    );

    let offsets: Vec<u64> = service
        .call_instants()
        .iter()
        .map(|at| at.duration_since(started).as_secs())
        .collect();
    assert_eq!(offsets, vec![0, 1, 3, 7, 15, 31]);

    sleep(Duration::from_secs(600)).await;
    assert_eq!(service.calls(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_transient_failures() {
    let service = Arc::new(ScriptedService::flaky(3, "QUJD"));
    let mut client = client(&service, "craftsman workshop shelf");
    client.activate();

    let snapshot = client.wait_terminal().await;
    assert_eq!(snapshot.request.status, RequestStatus::Succeeded);
    assert_eq!(snapshot.attempts_made(), 4);
    assert_eq!(
        snapshot.scheduled_delays,
        [1, 2, 4].map(Duration::from_secs).to_vec()
    );
    assert_eq!(snapshot.last_error, Some("transport"));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_retry_wait_is_final() {
    let service = Arc::new(ScriptedService::failing());
    let mut client = client(&service, "jeep wrangler sunset");
    client.activate();

    // Attempts at 0s and 1s fail; the next retry is due at 3s.
    sleep(Duration::from_millis(1500)).await;
    assert!(matches!(client.phase(), GenerationPhase::RetryWait { .. }));
    let frozen = client.snapshot();

    client.cancel();
    assert!(client.is_cancelled());
    sleep(Duration::from_secs(120)).await;

    assert_eq!(service.calls(), 2);
    let after = client.snapshot();
    assert_eq!(after.phase, frozen.phase);
    assert_eq!(after.request, frozen.request);
    assert_eq!(after.scheduled_delays, frozen.scheduled_delays);
    assert_eq!(client.status(), RequestStatus::Pending);

    // Re-activation after cancel is ignored.
    client.activate();
    assert!(!client.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_clients_for_same_prompt_are_independent() {
    let service = Arc::new(ScriptedService::flaky(1, "QQ=="));
    let mut first = client(&service, "custom hardware detail");
    let mut second = client(&service, "custom hardware detail");
    first.activate();
    second.activate();

    let (a, b) = tokio::join!(first.wait_terminal(), second.wait_terminal());
    assert_eq!(a.request.status, RequestStatus::Succeeded);
    assert_eq!(b.request.status, RequestStatus::Succeeded);
    assert_eq!(a.attempts_made() + b.attempts_made(), 3);
    assert_eq!(service.calls_for("custom hardware detail"), 3);
}
