use reqwest::StatusCode;

use crate::form::FormError;

pub const PREDICTION_FAILED_MESSAGE: &str =
    "Failed to get prediction. Please check your connection and try again.";

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("invalid form input: {0}")]
    MalformedInput(#[from] FormError),

    #[error("prediction service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("prediction request failed: {status}")]
    Status { status: StatusCode, body: String },

    #[error("malformed prediction response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("prediction failed on server{}", server_detail(.message))]
    Server { message: Option<String> },
}

fn server_detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|message| format!(": {message}"))
        .unwrap_or_default()
}

/// Coarse failure classes surfaced to the display layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    MalformedInput,
    Transport,
    ServerLogic,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::MalformedInput => "malformed_input",
            FailureKind::Transport => "transport",
            FailureKind::ServerLogic => "server_logic",
        }
    }
}

impl PredictionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PredictionError::MalformedInput(_) => FailureKind::MalformedInput,
            PredictionError::Transport(_)
            | PredictionError::Status { .. }
            | PredictionError::Decode(_) => FailureKind::Transport,
            PredictionError::Server { .. } => FailureKind::ServerLogic,
        }
    }

    /// Message suitable for showing to the person who submitted the form.
    pub fn user_message(&self) -> String {
        match self {
            PredictionError::MalformedInput(err) => err.to_string(),
            _ => PREDICTION_FAILED_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_messages() {
        let err = PredictionError::from(FormError::MissingField("dosage"));
        assert_eq!(err.kind(), FailureKind::MalformedInput);
        assert_eq!(err.user_message(), "missing required field `dosage`");

        let err = PredictionError::Status {
            status: StatusCode::BAD_GATEWAY,
            body: "upstream down".to_string(),
        };
        assert_eq!(err.kind(), FailureKind::Transport);
        assert_eq!(err.user_message(), PREDICTION_FAILED_MESSAGE);

        let err = PredictionError::Server { message: None };
        assert_eq!(err.kind(), FailureKind::ServerLogic);
        assert_eq!(err.to_string(), "prediction failed on server");
        assert_eq!(err.user_message(), PREDICTION_FAILED_MESSAGE);

        let err = PredictionError::Server {
            message: Some("model offline".to_string()),
        };
        assert_eq!(err.to_string(), "prediction failed on server: model offline");
    }
}
