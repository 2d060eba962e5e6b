//! Error types for the TestRail client.

/// TestRail client errors.
#[derive(Debug, thiserror::Error)]
pub enum TestRailError {
    /// The request never produced an HTTP response.
    #[error("network error: {message}")]
    Network { message: String },

    /// Credentials were rejected (401).
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// The requested run, plan or user does not exist.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Any other non-success status returned by the API.
    #[error("TestRail returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The body could not be decoded into the expected shape.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Missing URL, user or API key.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl From<reqwest::Error> for TestRailError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TestRailError::InvalidResponse {
                message: err.to_string(),
            }
        } else {
            TestRailError::Network {
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for TestRailError {
    fn from(err: serde_json::Error) -> Self {
        TestRailError::InvalidResponse {
            message: err.to_string(),
        }
    }
}

/// Result type for TestRail operations.
pub type TestRailResult<T> = Result<T, TestRailError>;
