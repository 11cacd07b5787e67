use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::{CookieConfig, CsrfProtection};
use crate::error::SessionError;

/// Session payload decoded from a verified token.
///
/// Only `data` matters on the read path; the remaining fields are the
/// parameters needed to silently reissue the token when it expires.
#[derive(Debug, Clone)]
pub struct TokenPayload<P, D> {
    pub data: D,
    pub data_params: P,
    /// Original issued-at, preserved across reissues
    pub oiat: DateTime<Utc>,
    /// Lifetime of the session window in seconds
    pub max_age: u64,
}

/// A freshly minted token together with its payload.
#[derive(Debug, Clone)]
pub struct IssuedToken<P, D> {
    pub payload: TokenPayload<P, D>,
    pub token: String,
}

/// Options forwarded to the engine's generate operation. On the reissue
/// path these carry the expired token's original window so the new token
/// preserves it.
#[derive(Debug, Clone, Default)]
pub struct TokenOptions {
    pub oiat: Option<DateTime<Utc>>,
    pub max_age: Option<u64>,
}

/// Issue parameters recovered from an expired token.
#[derive(Debug, Clone)]
pub struct ReissueParams<P> {
    pub data_params: P,
    pub oiat: DateTime<Utc>,
    pub max_age: u64,
}

/// Outcome of a failed verification.
///
/// Expiry is its own variant so the recovery branch is a pattern match:
/// the facade reissues on `Expired` and degrades to an anonymous session
/// on `Invalid`.
#[derive(Debug, Error)]
pub enum VerifyError<P: std::fmt::Debug> {
    #[error("Token expired")]
    Expired(ReissueParams<P>),

    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Session data stored in token payloads.
///
/// `csrf_token` is the default session-side lookup for the double-submit
/// check; types that keep their CSRF token elsewhere can leave the default
/// and configure a lookup override on the middleware instead.
pub trait SessionData: Clone + Send + Sync + 'static {
    fn csrf_token(&self) -> Option<&str> {
        None
    }
}

/// Contract for the external token signing and verification engine.
///
/// The facade treats this as an opaque service: it never inspects tokens
/// itself, and the engine's static configuration (cookie behavior, CSRF
/// policy) is read through the two accessors.
#[async_trait]
pub trait TokenEngine: Send + Sync + 'static {
    type DataParams: std::fmt::Debug + Send + Sync + 'static;
    type Data: SessionData;

    /// Verify a token and return its payload.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::Expired` with the original issue parameters
    /// when the token's window has passed, and `VerifyError::Invalid` for
    /// any other failure (malformed, tampered, wrong key).
    async fn verify(
        &self,
        token: &str,
        force_refresh: bool,
    ) -> Result<TokenPayload<Self::DataParams, Self::Data>, VerifyError<Self::DataParams>>;

    /// Mint a new token for the given parameters.
    async fn generate(
        &self,
        params: Self::DataParams,
        options: Option<TokenOptions>,
    ) -> Result<IssuedToken<Self::DataParams, Self::Data>, SessionError>;

    fn cookie_config(&self) -> &CookieConfig;

    fn csrf_protection(&self) -> &CsrfProtection;
}
