use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    error::ApiError,
    protocol::{SpreadRequest, SpreadResponse},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod model;
mod prompt;

use config::load_settings;
use model::{CompletionModel, ResponsesApiModel};
use prompt::{model_input, normalize_output, FALLBACK_INTERPRETATION};

#[derive(Clone)]
struct AppState {
    model: Arc<dyn CompletionModel>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let model = ResponsesApiModel::new(
        &settings.openai_base_url,
        settings.require_api_key()?,
        settings.model.clone(),
        settings.max_output_tokens,
    );
    let app = build_router(Arc::new(AppState {
        model: Arc::new(model),
    }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, model = %settings.model, "interpretation server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/interpret_spread", post(interpret_spread))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn interpret_spread(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpreadRequest>,
) -> Result<Json<SpreadResponse>, (StatusCode, Json<ApiError>)> {
    if req.cards.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::validation("No cards provided")),
        ));
    }

    let text = state
        .model
        .complete(&model_input(&req))
        .await
        .map_err(|err| {
            error!(spread_type = %req.spread_type, error = %format!("{err:#}"), "completion request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::internal(format!(
                    "Completion request failed: {err:#}"
                ))),
            )
        })?;

    let text = if text.trim().is_empty() {
        FALLBACK_INTERPRETATION
    } else {
        text.as_str()
    };
    let interpretation = normalize_output(&req, text);

    info!(
        spread_type = %req.spread_type,
        card_count = req.cards.len(),
        "spread interpreted"
    );
    Ok(Json(SpreadResponse { interpretation }))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
