//! Yahoo OAuth 2.0 authorization-code flow.
//!
//! # Components
//!
//! - [`store`] : JSON credential file with atomic replace-on-write
//! - [`oauth`] : endpoint config, authorization URL, token response parsing
//! - [`session`] : credential resolution, code exchange, refresh-on-demand,
//!   authenticated HTTP clients

pub mod error;
pub mod oauth;
pub mod session;
pub mod store;

pub use error::{OAuthError, Result};
pub use oauth::{AuthorizationUrl, OAuthConfig, build_authorization_url};
pub use session::{
    ExchangeOutcome, SessionManager, SharedTokenSource, StaticTokenSource, TokenSource,
};
pub use store::{CredentialRecord, TokenStore};
