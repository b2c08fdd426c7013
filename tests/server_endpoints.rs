//! HTTP endpoint behaviour

#![cfg(feature = "server")]

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use common::{style_png, FramedSynthesizer};
use serde_json::Value;
use std::sync::Arc;
use styletext_api::{
    server::{router, AppState},
    PipelineConfig, ProcessorState, StyleTextProcessor,
};
use tower::ServiceExt;

const BOUNDARY: &str = "styletext-test-boundary";
const UPLOAD_LIMIT: usize = 10 * 1024 * 1024;

enum Part<'a> {
    File(&'a str, &'a [u8]),
    Text(&'a str, &'a str),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File(name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"style.png\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            },
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            },
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn generate_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn ready_app(dir: &std::path::Path, synth: FramedSynthesizer) -> Router {
    let config = PipelineConfig::builder().output_dir(dir).build().unwrap();
    let processor = StyleTextProcessor::new(config, Arc::new(synth)).unwrap();
    router(
        AppState::new(ProcessorState::Ready(Arc::new(processor))),
        UPLOAD_LIMIT,
    )
}

fn unavailable_app() -> Router {
    router(
        AppState::new(ProcessorState::Unavailable("model file missing".into())),
        UPLOAD_LIMIT,
    )
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_generate_returns_png() {
    let dir = tempfile::tempdir().unwrap();
    let synth = FramedSynthesizer::new();
    let app = ready_app(dir.path(), synth.clone());
    let png = style_png(100, 50);

    let response = app
        .oneshot(generate_request(&[
            Part::File("image", &png),
            Part::Text("text", "Hello"),
            Part::Text("language", "ko"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(response.headers()["x-artifacts-persisted"], "true");
    let request_id = response.headers()["x-request-id"].to_str().unwrap().to_string();

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let image = image::load_from_memory(&bytes).unwrap();
    assert_eq!((image.width(), image.height()), (100, 50));

    assert_eq!(synth.calls()[0].language, "ko");
    assert!(dir.path().join(format!("{request_id}_text.png")).exists());
    assert!(dir.path().join(format!("{request_id}_mask.png")).exists());
}

#[tokio::test]
async fn test_language_defaults_to_english() {
    let dir = tempfile::tempdir().unwrap();
    let synth = FramedSynthesizer::new();
    let app = ready_app(dir.path(), synth.clone());
    let png = style_png(64, 32);

    let response = app
        .oneshot(generate_request(&[
            Part::File("image", &png),
            Part::Text("text", "  padded  "),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let calls = synth.calls();
    assert_eq!(calls[0].language, "en");
    assert_eq!(calls[0].text, "padded");
}

#[tokio::test]
async fn test_undecodable_image_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let synth = FramedSynthesizer::new();
    let app = ready_app(dir.path(), synth.clone());

    let response = app
        .oneshot(generate_request(&[
            Part::File("image", b"definitely not an image"),
            Part::Text("text", "Hello"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["detail"], "Could not decode image.");
    assert!(synth.calls().is_empty());
    assert!(common::files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_malformed_forms_are_bad_requests() {
    let dir = tempfile::tempdir().unwrap();
    let png = style_png(64, 32);

    let cases: Vec<Vec<Part<'_>>> = vec![
        vec![Part::Text("text", "no image")],
        vec![Part::File("image", &png)],
        vec![Part::File("image", &png), Part::Text("text", "   ")],
        vec![
            Part::File("image", &png),
            Part::Text("text", "Hello"),
            Part::Text("language", "fr"),
        ],
    ];

    for parts in &cases {
        let app = ready_app(dir.path(), FramedSynthesizer::new());
        let response = app.oneshot(generate_request(parts)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["detail"].is_string());
    }
}

#[tokio::test]
async fn test_oversized_upload_is_payload_too_large() {
    let dir = tempfile::tempdir().unwrap();
    let synth = FramedSynthesizer::new();
    let config = PipelineConfig::builder().output_dir(dir.path()).build().unwrap();
    let processor = StyleTextProcessor::new(config, Arc::new(synth.clone())).unwrap();
    let app = router(AppState::new(ProcessorState::Ready(Arc::new(processor))), 1024);
    let upload = vec![0x5a_u8; 64 * 1024];

    let response = app
        .oneshot(generate_request(&[
            Part::File("image", &upload),
            Part::Text("text", "Hello"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = json_body(response).await;
    assert!(body["detail"].is_string());
    assert!(synth.calls().is_empty());
}

#[tokio::test]
async fn test_synthesis_failure_is_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = ready_app(dir.path(), FramedSynthesizer::failing());
    let png = style_png(64, 32);

    let response = app
        .oneshot(generate_request(&[
            Part::File("image", &png),
            Part::Text("text", "Hello"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_unavailable_model_is_service_unavailable() {
    let png = style_png(64, 32);
    let response = unavailable_app()
        .oneshot(generate_request(&[
            Part::File("image", &png),
            Part::Text("text", "Hello"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["detail"], "Model is not available.");
}

#[tokio::test]
async fn test_unavailable_wins_over_bad_input() {
    let response = unavailable_app()
        .oneshot(generate_request(&[Part::File("image", b"garbage")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_root_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let response = ready_app(dir.path(), FramedSynthesizer::new())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "StyleText Image Generation API");
    assert_eq!(body["endpoints"][0], "/generate (POST)");
    assert_eq!(body["status"], "ready");
    assert_eq!(body["synthesizer"], "framed");

    let response = unavailable_app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["status"], "unavailable");
    assert!(body["synthesizer"].is_null());
}
