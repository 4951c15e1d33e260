use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::client::PredictionService;
use crate::contact::{ContactForm, ContactOutcome, ContactService};
use crate::error::FailureKind;
use crate::form::FormData;
use crate::types::PredictionResponse;

#[derive(Clone)]
pub struct AppState {
    predictions: Arc<dyn PredictionService>,
    contact: Arc<dyn ContactService>,
}

impl AppState {
    pub fn new(predictions: Arc<dyn PredictionService>, contact: Arc<dyn ContactService>) -> Self {
        Self {
            predictions,
            contact,
        }
    }

    /// State backed by a single client serving both concerns.
    pub fn from_client<C>(client: C) -> Self
    where
        C: PredictionService + ContactService + 'static,
    {
        let client = Arc::new(client);
        Self::new(client.clone(), client)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthBody {
    pub healthy: bool,
}

/// API routes without the metrics layer.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/predict", post(predict_handler))
        .route("/api/health", get(health_handler))
        .route("/api/contact", post(contact_handler))
        .with_state(state)
}

pub async fn serve(address: &str, state: AppState) -> Result<()> {
    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = router(state)
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(prometheus_layer)
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(address).await?;
    tracing::info!("Gateway running on http://{}", address);

    axum::serve(listener, app).await?;
    Ok(())
}

type ApiError = (StatusCode, Json<ErrorBody>);

/// Keeps body rejections in the same JSON shape as prediction errors.
fn rejected(rejection: JsonRejection) -> ApiError {
    tracing::debug!(%rejection, "Rejected request body");
    (
        rejection.status(),
        Json(ErrorBody {
            error: rejection.body_text(),
        }),
    )
}

#[tracing::instrument(skip_all)]
async fn predict_handler(
    State(state): State<AppState>,
    form: Result<Json<FormData>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    counter!("gateway_requests_total", "route" => "predict").increment(1);
    let Json(form) = form.map_err(rejected)?;
    tracing::debug!(field_count = form.len(), "Prediction requested");

    state.predictions.predict(&form).await.map(Json).map_err(|err| {
        let status = match err.kind() {
            FailureKind::MalformedInput => StatusCode::UNPROCESSABLE_ENTITY,
            FailureKind::Transport | FailureKind::ServerLogic => StatusCode::BAD_GATEWAY,
        };
        (
            status,
            Json(ErrorBody {
                error: err.user_message(),
            }),
        )
    })
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthBody> {
    counter!("gateway_requests_total", "route" => "health").increment(1);
    Json(HealthBody {
        healthy: state.predictions.check_health().await,
    })
}

async fn contact_handler(
    State(state): State<AppState>,
    form: Result<Json<ContactForm>, JsonRejection>,
) -> Result<Json<ContactOutcome>, ApiError> {
    counter!("gateway_requests_total", "route" => "contact").increment(1);
    let Json(form) = form.map_err(rejected)?;
    Ok(Json(state.contact.submit_contact(&form).await))
}
