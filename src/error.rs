// Error types shared by the HTTP client, the provider proxy and the backend

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error: {status_code} - {message}")]
    ApiResponseError { status_code: u16, message: String },

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// The normalised message, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            ApiError::NetworkError(msg)
            | ApiError::DecodeError(msg)
            | ApiError::InvalidRequest(msg) => msg,
            ApiError::ApiResponseError { message, .. } => message,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::ApiResponseError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Build an `ApiResponseError` from a non-2xx response body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        ApiError::ApiResponseError {
            status_code: status.as_u16(),
            message: extract_error_message(status, body),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::DecodeError(err.to_string())
        } else {
            ApiError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::DecodeError(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

// Backend and proxy disagree on the error shape, so try each in turn:
// `message`, `error` (string or object), Square's `errors[].detail`,
// then the raw body, then the canonical reason.
pub fn extract_error_message(status: StatusCode, body: &str) -> String {
    let fallback = || {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    };

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return fallback();
    }

    let Ok(json) = serde_json::from_str::<Value>(trimmed) else {
        return trimmed.to_string();
    };

    if let Some(msg) = json.get("message").and_then(Value::as_str) {
        return msg.to_string();
    }

    match json.get("error") {
        Some(Value::String(msg)) => return msg.clone(),
        Some(Value::Object(obj)) => {
            if let Some(msg) = obj.get("message").and_then(Value::as_str) {
                return msg.to_string();
            }
        }
        _ => {}
    }

    if let Some(detail) = json
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
        .and_then(|first| first.get("detail").or_else(|| first.get("code")))
        .and_then(Value::as_str)
    {
        return detail.to_string();
    }

    fallback()
}
