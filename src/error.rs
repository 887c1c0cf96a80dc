use miette::{Diagnostic, Result};
use serde::Deserialize;
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(vacation_sync::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(vacation_sync::config))]
    Config(String),

    #[error("Authentication error: {0}")]
    #[diagnostic(
        code(vacation_sync::auth),
        help("check AZURE_CLIENT_ID / AZURE_TENANT_ID and complete the sign-in prompt")
    )]
    Auth(String),

    #[error("Graph API error (HTTP {status}, {code}): {message}")]
    #[diagnostic(code(vacation_sync::graph))]
    Graph {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Could not find group with name {0}")]
    #[diagnostic(code(vacation_sync::group_not_found))]
    GroupNotFound(String),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(vacation_sync::http))]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    #[diagnostic(code(vacation_sync::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(vacation_sync::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(vacation_sync::other))]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(format!("Invalid URL: {}", err))
    }
}

/// Type alias for Result with our Error type
pub type SyncResult<T> = Result<T, Error>;

/// OData error envelope returned by Graph: `{"error": {"code": .., "message": ..}}`
#[derive(Debug, Deserialize)]
struct ODataErrorEnvelope {
    error: ODataErrorBody,
}

#[derive(Debug, Deserialize)]
struct ODataErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(rename = "innerError", alias = "innererror")]
    inner_error: Option<ODataInnerError>,
}

#[derive(Debug, Deserialize)]
struct ODataInnerError {
    #[serde(rename = "request-id")]
    request_id: Option<String>,
}

impl Error {
    /// Build a Graph error from a failed response body.
    ///
    /// The nested OData message is extracted when the body is an error
    /// envelope; otherwise the raw body is kept as the message.
    pub fn from_graph_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ODataErrorEnvelope>(body) {
            Ok(envelope) => {
                let mut message = envelope.error.message;
                if let Some(request_id) = envelope.error.inner_error.and_then(|i| i.request_id) {
                    message = format!("{} (request-id {})", message, request_id);
                }
                Error::Graph {
                    status,
                    code: envelope.error.code,
                    message,
                }
            }
            Err(_) => Error::Graph {
                status,
                code: "unknown".to_string(),
                message: body.trim().to_string(),
            },
        }
    }
}

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Invalid environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create authentication errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
