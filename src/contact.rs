use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::client::HttpPredictionClient;

pub const CONTACT_SENT_MESSAGE: &str = "Message sent successfully!";
pub const CONTACT_FAILED_MESSAGE: &str = "Failed to send message. Please try again.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
    /// Only the file name is transmitted, never the content.
    #[serde(default)]
    pub attachment: Option<PathBuf>,
}

impl ContactForm {
    pub fn attachment_name(&self) -> Option<String> {
        self.attachment
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
    }
}

#[derive(Debug, Serialize)]
struct ContactRequest<'a> {
    name: &'a str,
    email: &'a str,
    message: &'a str,
    attachment: Option<String>,
}

impl<'a> From<&'a ContactForm> for ContactRequest<'a> {
    fn from(form: &'a ContactForm) -> Self {
        Self {
            name: &form.name,
            email: &form.email,
            message: &form.message,
            attachment: form.attachment_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactOutcome {
    pub success: bool,
    pub message: String,
}

impl ContactOutcome {
    pub fn sent() -> Self {
        Self {
            success: true,
            message: CONTACT_SENT_MESSAGE.to_string(),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            message: CONTACT_FAILED_MESSAGE.to_string(),
        }
    }
}

#[async_trait]
pub trait ContactService: Send + Sync {
    /// Never fails; problems are reported through the outcome.
    async fn submit_contact(&self, form: &ContactForm) -> ContactOutcome;
}

impl HttpPredictionClient {
    async fn send_contact(&self, form: &ContactForm) -> Result<()> {
        let response = self
            .http
            .post(self.endpoint("contact"))
            .json(&ContactRequest::from(form))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            bail!("Contact submission failed: {status}");
        }

        response.json::<serde_json::Value>().await?;
        Ok(())
    }
}

#[async_trait]
impl ContactService for HttpPredictionClient {
    #[tracing::instrument(skip(self, form), fields(has_attachment = form.attachment.is_some()))]
    async fn submit_contact(&self, form: &ContactForm) -> ContactOutcome {
        match self.send_contact(form).await {
            Ok(()) => {
                counter!("contact_submissions_total", "outcome" => "sent").increment(1);
                tracing::info!("Contact message sent");
                ContactOutcome::sent()
            }
            Err(err) => {
                counter!("contact_submissions_total", "outcome" => "failed").increment(1);
                tracing::error!(error = %err, "Contact API error");
                ContactOutcome::failed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::{Value, json};

    use super::*;
    use crate::client::FailurePolicy;
    use crate::client::tests::{client, spawn_service};

    fn form(attachment: Option<&str>) -> ContactForm {
        ContactForm {
            name: "Ada".to_string(),
            email: "ada@example.org".to_string(),
            message: "Is ZnO covered?".to_string(),
            attachment: attachment.map(PathBuf::from),
        }
    }

    #[test]
    fn attachment_name_only() {
        assert_eq!(
            form(Some("/home/ada/reports/zno.pdf")).attachment_name().as_deref(),
            Some("zno.pdf")
        );
        assert_eq!(form(None).attachment_name(), None);
    }

    #[tokio::test]
    async fn posts_fields_and_reports_success() {
        let app = Router::new().route(
            "/contact",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["name"], "Ada");
                assert_eq!(body["email"], "ada@example.org");
                assert_eq!(body["attachment"], "zno.pdf");
                Json(json!({ "received": true }))
            }),
        );
        let base_url = spawn_service(app).await;

        let outcome = client(&base_url, FailurePolicy::Raise)
            .submit_contact(&form(Some("reports/zno.pdf")))
            .await;
        assert_eq!(outcome, ContactOutcome::sent());
        assert_eq!(outcome.message, "Message sent successfully!");
    }

    #[tokio::test]
    async fn missing_attachment_is_null() {
        let app = Router::new().route(
            "/contact",
            post(|Json(body): Json<Value>| async move {
                assert!(body["attachment"].is_null());
                Json(json!({}))
            }),
        );
        let base_url = spawn_service(app).await;

        let outcome = client(&base_url, FailurePolicy::Raise)
            .submit_contact(&form(None))
            .await;
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn failures_become_outcomes() {
        let app = Router::new().route("/contact", post(|| async { StatusCode::BAD_REQUEST }));
        let base_url = spawn_service(app).await;
        let outcome = client(&base_url, FailurePolicy::Raise)
            .submit_contact(&form(None))
            .await;
        assert_eq!(outcome, ContactOutcome::failed());

        let app = Router::new().route("/contact", post(|| async { "not json" }));
        let base_url = spawn_service(app).await;
        let outcome = client(&base_url, FailurePolicy::Raise)
            .submit_contact(&form(None))
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Failed to send message. Please try again.");
    }
}
