use anyhow::Result;
use async_trait::async_trait;
use metrics::counter;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::PredictionError;
use crate::form::FormData;
use crate::transform::{fallback_response, transform_api_response};
use crate::types::{ApiResponse, PredictionRequest, PredictionResponse};

#[async_trait]
pub trait PredictionService: Send + Sync {
    async fn predict(&self, form: &FormData) -> Result<PredictionResponse, PredictionError>;

    /// Never fails; an unreachable service reports `false`.
    async fn check_health(&self) -> bool;
}

/// What `predict` does when the remote service cannot produce an answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Return the error to the caller.
    #[default]
    Raise,
    /// Log the error and answer with the canned assessment.
    Fallback,
}

pub struct HttpPredictionClient {
    pub(crate) http: reqwest::Client,
    base_url: String,
    policy: FailurePolicy,
}

impl HttpPredictionClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            policy: config.on_failure,
        })
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    #[tracing::instrument(skip(self, request), fields(nanoparticle_id = %request.nanoparticle_id))]
    async fn request_prediction(
        &self,
        request: &PredictionRequest,
    ) -> Result<ApiResponse, PredictionError> {
        tracing::debug!(?request, "Sending prediction request");

        let response = self
            .http
            .post(self.endpoint("predict"))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(%status, "Prediction response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "Prediction API returned an error response");
            return Err(PredictionError::Status { status, body });
        }

        let body: Value = serde_json::from_str(&response.text().await?)?;
        if body.get("success").and_then(Value::as_bool) == Some(false) {
            let message = ["error", "message"]
                .iter()
                .find_map(|key| body.get(*key).and_then(Value::as_str))
                .map(str::to_string);
            return Err(PredictionError::Server { message });
        }

        let api_response: ApiResponse = serde_json::from_value(body)?;
        if !api_response.success {
            return Err(PredictionError::Server { message: None });
        }
        Ok(api_response)
    }
}

#[async_trait]
impl PredictionService for HttpPredictionClient {
    #[tracing::instrument(skip(self, form), fields(policy = ?self.policy))]
    async fn predict(&self, form: &FormData) -> Result<PredictionResponse, PredictionError> {
        counter!("prediction_requests_total").increment(1);

        let request = match PredictionRequest::from_form(form) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(error = %err, "Rejecting malformed prediction input");
                counter!("prediction_failures_total", "kind" => "malformed_input").increment(1);
                return Err(err.into());
            }
        };

        let err = match self.request_prediction(&request).await {
            Ok(api_response) => {
                tracing::info!(
                    toxicity = %api_response.stage2.toxicity_prediction,
                    confidence = api_response.stage2.confidence,
                    "Prediction completed"
                );
                return Ok(transform_api_response(api_response, form));
            }
            Err(err) => err,
        };

        let kind = err.kind();
        counter!("prediction_failures_total", "kind" => kind.as_str()).increment(1);

        match self.policy {
            FailurePolicy::Raise => {
                tracing::error!(error = %err, kind = kind.as_str(), "Prediction failed");
                Err(err)
            }
            FailurePolicy::Fallback => {
                tracing::warn!(
                    error = %err,
                    kind = kind.as_str(),
                    "Prediction failed, using fallback response"
                );
                counter!("prediction_fallbacks_total").increment(1);
                Ok(fallback_response(form))
            }
        }
    }

    async fn check_health(&self) -> bool {
        match self.http.get(self.endpoint("health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::error!(error = %err, "Health check failed");
                false
            }
        }
    }
}
