//! Error types for the Yahoo adapter.

use huddle_oauth::OAuthError;

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, YahooError>;

/// Adapter error type.
#[derive(Debug, thiserror::Error)]
pub enum YahooError {
    /// No usable access token.
    #[error(transparent)]
    OAuth(#[from] OAuthError),

    /// Yahoo answered with a non-success status.
    #[error("Yahoo API error ({status}): {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response (DNS, connect, timeout).
    #[error("Request to Yahoo failed: {0}")]
    Request(String),

    /// The response body was not the JSON we expected.
    #[error("Unexpected Yahoo response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for YahooError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            YahooError::Decode(e.to_string())
        } else {
            YahooError::Request(e.to_string())
        }
    }
}
