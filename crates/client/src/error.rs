use api_types::envelope::ApiErrorBody;
use serde_json::{Map, Value};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

const GENERIC_CODE: &str = "Unknown";
const GENERIC_MESSAGE: &str = "Request failed";

/// Normalized failure reported by the API.
///
/// Built from the error envelope when the body matches it, otherwise from a
/// generic fallback so callers never see an untyped body.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("{message}")]
pub struct ApiError {
    /// HTTP status of the failed response, when one was received.
    pub status: Option<u16>,
    pub code: String,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    pub fn generic(status: Option<u16>) -> Self {
        Self::with_message(status, GENERIC_MESSAGE)
    }

    pub fn with_message(status: Option<u16>, message: &str) -> Self {
        Self {
            status,
            code: GENERIC_CODE.to_string(),
            message: message.to_string(),
            details: Value::Null,
        }
    }

    pub fn from_envelope(status: Option<u16>, body: ApiErrorBody) -> Self {
        Self {
            status,
            code: body.code,
            message: body.message,
            details: body.details,
        }
    }

    /// Reads the error object out of a failure body. Each field falls back
    /// on its own, so a partial error object still yields its message.
    pub fn from_body(status: Option<u16>, body: &[u8]) -> Self {
        let mut err = Self::generic(status);
        let Ok(Value::Object(envelope)) = serde_json::from_slice::<Value>(body) else {
            return err;
        };
        let Some(Value::Object(error)) = field(&envelope, "error", "Error") else {
            return err;
        };

        if let Some(Value::String(code)) = field(error, "code", "Code") {
            err.code = code.clone();
        }
        if let Some(Value::String(message)) = field(error, "message", "Message")
            && !message.is_empty()
        {
            err.message = message.clone();
        }
        if let Some(details) = field(error, "details", "Details") {
            err.details = details.clone();
        }
        err
    }
}

fn field<'a>(object: &'a Map<String, Value>, camel: &str, pascal: &str) -> Option<&'a Value> {
    object.get(camel).or_else(|| object.get(pascal))
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// Terminal API failure: any non-401, or a 401 on the login endpoint.
    #[error("{0}")]
    Api(ApiError),
    /// The authentication endpoint rejected the credentials.
    #[error("authentication failed: {0}")]
    Auth(ApiError),
    /// Refresh failed or the replay budget was spent; the session has been
    /// cleared and the user redirected.
    #[error("session expired")]
    SessionExpired,
    #[error("no refresh token")]
    NoRefreshToken,
    #[error("http error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("refresh task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ClientError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) | Self::Auth(err) => err.message.clone(),
            Self::SessionExpired | Self::NoRefreshToken => {
                "Session expired, please log in again".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) | Self::Auth(err) => Some(err),
            _ => None,
        }
    }
}
