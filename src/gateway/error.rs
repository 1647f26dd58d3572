use reqwest::StatusCode;
use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway connect request missing required fields: {fields}")]
    MissingFields { fields: String },

    #[error("failed to login client: {message}")]
    Authentication { message: String },

    #[error("Gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected status: {0}")]
    UnexpectedStatus(StatusCode),
}

impl GatewayError {
    pub fn missing_fields(fields: &[&str]) -> Self {
        Self::MissingFields {
            fields: fields.join(", "),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }
}
