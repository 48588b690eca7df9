use super::*;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::{body, body::Body, http::Request};
use shared::{error::ErrorCode, protocol::CardPayload};
use tokio::sync::Mutex;
use tower::ServiceExt;

struct FakeModel {
    reply: Result<String, String>,
    inputs: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl CompletionModel for FakeModel {
    async fn complete(&self, input: &str) -> Result<String> {
        self.inputs.lock().await.push(input.to_string());
        self.reply.clone().map_err(|err| anyhow!(err))
    }
}

fn test_app(reply: Result<&str, &str>) -> (Router, Arc<Mutex<Vec<String>>>) {
    let inputs = Arc::new(Mutex::new(Vec::new()));
    let model = FakeModel {
        reply: reply.map(str::to_string).map_err(str::to_string),
        inputs: Arc::clone(&inputs),
    };
    let app = build_router(Arc::new(AppState {
        model: Arc::new(model),
    }));
    (app, inputs)
}

fn card(name: &str, position: &str, is_reversed: bool) -> CardPayload {
    CardPayload {
        name: name.to_string(),
        position: position.to_string(),
        is_reversed,
        upright_meaning: format!("{name} upright"),
        reversed_meaning: format!("{name} reversed"),
        suit: None,
        arcana: Some("Major".to_string()),
    }
}

fn interpret_request(request: &SpreadRequest) -> Request<Body> {
    Request::post("/interpret_spread")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(request).expect("json")))
        .expect("request")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let (app, _inputs) = test_app(Ok("unused"));
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn three_card_spread_returns_normalized_interpretation() {
    let (app, inputs) = test_app(Ok("Sure! Here is your reading.\n\n**Past — The Fool (Upright):**\nA leap."));
    let request = SpreadRequest {
        spread_type: "three_card".to_string(),
        cards: vec![
            card("The Fool", "Past", false),
            card("The Tower", "Present", true),
            card("The Star", "Future", false),
        ],
    };

    let response = app
        .oneshot(interpret_request(&request))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let dto: SpreadResponse = serde_json::from_slice(&body).expect("json");
    assert_eq!(dto.interpretation, "**Past — The Fool (Upright):**\nA leap.");

    let inputs = inputs.lock().await;
    assert_eq!(inputs.len(), 1);
    assert!(inputs[0].starts_with(prompt::READER_PREAMBLE));
    assert!(inputs[0].contains(
        "- Position: Present | Card: The Tower | Orientation: Reversed | MeaningRef: The Tower reversed"
    ));
}

#[tokio::test]
async fn empty_spread_is_rejected_without_calling_model() {
    let (app, inputs) = test_app(Ok("unused"));
    let request = SpreadRequest {
        spread_type: "daily".to_string(),
        cards: Vec::new(),
    };

    let response = app
        .oneshot(interpret_request(&request))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let err: ApiError = serde_json::from_slice(&body).expect("json");
    assert_eq!(err.code, ErrorCode::Validation);
    assert_eq!(err.message, "No cards provided");
    assert!(inputs.lock().await.is_empty());
}

#[tokio::test]
async fn model_failure_maps_to_internal_error() {
    let (app, _inputs) = test_app(Err("upstream timed out"));
    let request = SpreadRequest {
        spread_type: "daily".to_string(),
        cards: vec![card("The Moon", "Today", false)],
    };

    let response = app
        .oneshot(interpret_request(&request))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let err: ApiError = serde_json::from_slice(&body).expect("json");
    assert_eq!(err.code, ErrorCode::Internal);
    assert!(err.message.contains("upstream timed out"), "{}", err.message);
}

#[tokio::test]
async fn empty_model_output_falls_back_to_apology_with_daily_header() {
    let (app, _inputs) = test_app(Ok("   "));
    let request = SpreadRequest {
        spread_type: "daily".to_string(),
        cards: vec![card("The Sun", "Today", true)],
    };

    let response = app
        .oneshot(interpret_request(&request))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let dto: SpreadResponse = serde_json::from_slice(&body).expect("json");
    assert_eq!(
        dto.interpretation,
        format!("**Daily Card — The Sun (Reversed):**\n{FALLBACK_INTERPRETATION}")
    );
}

#[tokio::test]
async fn malformed_json_is_rejected_by_extractor() {
    let (app, inputs) = test_app(Ok("unused"));
    let request = Request::post("/interpret_spread")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"spread_type":"daily"}"#))
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert!(response.status().is_client_error());
    assert!(inputs.lock().await.is_empty());
}
