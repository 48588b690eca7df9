use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use shared::protocol::CardPayload;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::Mutex,
};

use super::*;

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: &'static str,
    seen: Arc<Mutex<Vec<(Option<String>, SpreadRequest)>>>,
}

async fn handle_interpret(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(request): Json<SpreadRequest>,
) -> (StatusCode, &'static str) {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.seen.lock().await.push((content_type, request));
    (state.status, state.body)
}

async fn spawn_interpret_server(
    status: StatusCode,
    body: &'static str,
) -> anyhow::Result<(String, Arc<Mutex<Vec<(Option<String>, SpreadRequest)>>>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        status,
        body,
        seen: Arc::clone(&seen),
    };
    let app = Router::new()
        .route("/interpret_spread", post(handle_interpret))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), seen))
}

fn sample_request() -> SpreadRequest {
    SpreadRequest {
        spread_type: "daily".to_string(),
        cards: vec![CardPayload {
            name: "The Fool".to_string(),
            position: "Today".to_string(),
            is_reversed: true,
            upright_meaning: "New beginnings".to_string(),
            reversed_meaning: "Recklessness".to_string(),
            suit: None,
            arcana: Some("Major".to_string()),
        }],
    }
}

#[tokio::test]
async fn successful_response_yields_interpretation_text() {
    let (server_url, seen) =
        spawn_interpret_server(StatusCode::OK, r#"{"interpretation":"A journey begins."}"#)
            .await
            .expect("spawn server");
    let client = InterpretationClient::new(&server_url).expect("client");

    let text = client.interpret(&sample_request()).await.expect("interpret");
    assert_eq!(text, "A journey begins.");

    let seen = seen.lock().await;
    assert_eq!(seen.len(), 1);
    let (content_type, request) = &seen[0];
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(request, &sample_request());
}

#[tokio::test]
async fn error_status_is_classified_as_server_error_with_raw_body() {
    let (server_url, _seen) =
        spawn_interpret_server(StatusCode::SERVICE_UNAVAILABLE, "service unavailable")
            .await
            .expect("spawn server");
    let client = InterpretationClient::new(&server_url).expect("client");

    let err = client
        .interpret(&sample_request())
        .await
        .expect_err("should fail");
    assert_eq!(
        err,
        InterpretationError::Server {
            status: 503,
            body: "service unavailable".to_string()
        }
    );
}

#[tokio::test]
async fn client_error_status_is_also_a_server_error() {
    let (server_url, _seen) =
        spawn_interpret_server(StatusCode::BAD_REQUEST, r#"{"detail":"No cards provided"}"#)
            .await
            .expect("spawn server");
    let client = InterpretationClient::new(&server_url).expect("client");

    match client.interpret(&sample_request()).await {
        Err(InterpretationError::Server { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("No cards provided"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_success_body_is_a_decoding_error() {
    let (server_url, _seen) = spawn_interpret_server(StatusCode::OK, r#"{"reading":"nope"}"#)
        .await
        .expect("spawn server");
    let client = InterpretationClient::new(&server_url).expect("client");

    let err = client
        .interpret(&sample_request())
        .await
        .expect_err("should fail");
    assert!(matches!(err, InterpretationError::Decoding(_)), "{err:?}");
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client =
        InterpretationClient::with_timeout(&format!("http://{addr}"), Duration::from_secs(5))
            .expect("client");
    let err = client
        .interpret(&sample_request())
        .await
        .expect_err("should fail");
    match err {
        InterpretationError::Network(message) => assert!(!message.is_empty()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn truncated_error_body_keeps_status_and_read_failure() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut buf = vec![0u8; 8192];
        let _ = socket.read(&mut buf).await;
        let response = concat!(
            "HTTP/1.1 502 Bad Gateway\r\n",
            "content-length: 200\r\n",
            "connection: close\r\n\r\n",
            "partial",
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    let client =
        InterpretationClient::with_timeout(&format!("http://{addr}"), Duration::from_secs(5))
            .expect("client");
    let err = client
        .interpret(&sample_request())
        .await
        .expect_err("should fail");
    match err {
        InterpretationError::Server { status, body } => {
            assert_eq!(status, 502);
            assert!(body.starts_with("<unreadable body:"), "{body}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn endpoint_is_resolved_against_base_url() {
    assert_eq!(
        interpret_endpoint("http://127.0.0.1:8000").expect("url").as_str(),
        "http://127.0.0.1:8000/interpret_spread"
    );
    assert_eq!(
        interpret_endpoint("https://tarot.example.com/api").expect("url").as_str(),
        "https://tarot.example.com/api/interpret_spread"
    );
    assert_eq!(
        interpret_endpoint(" https://tarot.example.com/api/ ").expect("url").as_str(),
        "https://tarot.example.com/api/interpret_spread"
    );
}

#[test]
fn endpoint_rejects_unusable_urls() {
    assert!(matches!(
        interpret_endpoint("not a url"),
        Err(ClientConfigError::InvalidUrl { .. })
    ));
    assert!(matches!(
        interpret_endpoint("ftp://tarot.example.com"),
        Err(ClientConfigError::InvalidUrl { .. })
    ));
}
