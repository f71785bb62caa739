//! Error types for the OAuth flow.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors that can occur while exchanging, refreshing, or persisting tokens.
///
/// Every variant maps to an HTTP status via [`OAuthError::status_code`].
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// The token endpoint could not be reached.
    #[error("Failed to reach Yahoo OAuth service: {0}")]
    Network(String),

    /// The token endpoint answered with an error status.
    #[error("Yahoo rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The token endpoint answered 2xx with a body we could not use.
    #[error("Yahoo returned an invalid OAuth response: {0}")]
    InvalidResponse(String),

    /// The caller supplied bad input (e.g. a blank authorization code).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Credentials or the credential file are misconfigured.
    #[error("Config error: {0}")]
    Config(String),

    /// The credential file could not be written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// No usable refresh token; the user must run the authorization flow again.
    #[error("Reauthorization required: {0}")]
    ReauthorizationRequired(String),
}

impl OAuthError {
    /// HTTP status this error should surface as.
    pub fn status_code(&self) -> u16 {
        match self {
            OAuthError::Network(_) | OAuthError::InvalidResponse(_) => 502,
            OAuthError::Rejected { status, .. } => *status,
            OAuthError::InvalidRequest(_) => 400,
            OAuthError::Config(_) | OAuthError::Storage(_) => 500,
            OAuthError::ReauthorizationRequired(_) => 503,
        }
    }
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        OAuthError::Network(e.to_string())
    }
}
