//! Integration tests for the Imagen `:predict` client against a local endpoint

use crate::integration::test_utils::{spawn_fake_endpoint, CannedResponse};
use std::sync::Arc;
use vitrine::cell::{CellState, MediaCell, MediaPipeline, SharingMode};
use vitrine::error::MediaError;
use vitrine::generation::RetryPolicy;
use vitrine::provider::{ImageService, ImagenClient, ServiceConfig};

fn service_config(endpoint: &str) -> ServiceConfig {
    ServiceConfig {
        endpoint: endpoint.to_string(),
        model: "imagen-test".to_string(),
        api_key: Some("test-key".to_string()),
        ..ServiceConfig::default()
    }
}

#[tokio::test]
async fn test_predict_request_shape_and_payload() {
    let (endpoint, server) = spawn_fake_endpoint(vec![CannedResponse::ok_payload("QQ==")]).await;
    let client = ImagenClient::new(&service_config(&endpoint)).unwrap();

    let asset = client.generate("Jeep Wrangler sunset").await.unwrap();
    assert_eq!(asset.data_uri(), "data:image/png;base64,QQ==");
    assert_eq!(asset.decode().unwrap(), b"A".to_vec());

    let requests = server.await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0]
        .request_line
        .starts_with("POST /models/imagen-test:predict?key=test-key "));
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "instances": [{ "prompt": "Jeep Wrangler sunset" }],
            "parameters": { "sampleCount": 1 }
        })
    );
}

#[tokio::test]
async fn test_failure_responses_map_to_categories() {
    let (endpoint, server) = spawn_fake_endpoint(vec![
        CannedResponse::status(500, r#"{"error":"boom"}"#),
        CannedResponse::status(403, r#"{"error":"denied"}"#),
        CannedResponse::status(200, r#"{"predictions":[{}]}"#),
        CannedResponse::status(200, "not json"),
    ])
    .await;
    let client = ImagenClient::new(&service_config(&endpoint)).unwrap();

    let err = client.generate("p").await.unwrap_err();
    assert!(matches!(err, MediaError::ServiceRequestFailed(_)));
    let err = client.generate("p").await.unwrap_err();
    assert_eq!(err.category(), "auth");
    let err = client.generate("p").await.unwrap_err();
    assert!(matches!(err, MediaError::MissingPayload));
    let err = client.generate("p").await.unwrap_err();
    assert_eq!(err.category(), "malformed");

    server.await.unwrap();
}

#[tokio::test]
async fn test_cell_recovers_through_real_client() {
    let (endpoint, server) = spawn_fake_endpoint(vec![
        CannedResponse::status(503, "unavailable"),
        CannedResponse::status(200, r#"{"predictions":[]}"#),
        CannedResponse::ok_payload("QUJD"),
    ])
    .await;
    let service: Arc<dyn ImageService> =
        Arc::new(ImagenClient::new(&service_config(&endpoint)).unwrap());
    let policy = RetryPolicy {
        max_retries: 5,
        base_delay_ms: 10,
    };
    let pipeline = MediaPipeline::new(service, policy, SharingMode::Independent);

    let mut cell = MediaCell::mount("Craftsman workshop shelf", &pipeline);
    let state = cell.settle().await.clone();
    match state {
        CellState::Ready(asset) => assert_eq!(asset.encoded_payload, "QUJD"),
        other => panic!("expected ready cell, got {:?}", other),
    }
    assert_eq!(cell.attempts(), 3);
    assert_eq!(server.await.unwrap().len(), 3);
}
