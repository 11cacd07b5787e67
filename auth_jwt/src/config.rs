use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::Method;

use crate::error::SessionError;

/// Default name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "Authorization";

/// SameSite attribute written into the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// Attributes rendered into Set-Cookie headers written by the facade.
#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    pub domain: Option<String>,
    /// Max-Age in seconds; None leaves the cookie session-scoped
    pub max_age: Option<i64>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            domain: None,
            max_age: None,
        }
    }
}

/// Whether and how session tokens are mirrored into a cookie.
///
/// Exposed by the token engine as static configuration; the facade only
/// reads it.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub use_cookie: bool,
    pub name: String,
    pub options: CookieOptions,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            use_cookie: true,
            name: SESSION_COOKIE_NAME.to_string(),
            options: CookieOptions::default(),
        }
    }
}

/// Requires the named header to be present on matching methods.
#[derive(Debug, Clone)]
pub struct CustomHeaderCheck {
    pub header_name: String,
    pub methods: Vec<Method>,
}

impl CustomHeaderCheck {
    pub fn new(header_name: impl Into<String>, methods: Vec<Method>) -> Self {
        Self {
            header_name: header_name.into(),
            methods,
        }
    }
}

/// Requires the request origin (Origin header, or one derived from the
/// Referer) to match the allow-list exactly on matching methods.
#[derive(Debug, Clone)]
pub struct OriginCheck {
    pub origins: Vec<String>,
    pub methods: Vec<Method>,
    /// Permit requests that carry neither an Origin nor a parseable Referer
    pub allow_without_origin: bool,
}

impl OriginCheck {
    pub fn new(origins: Vec<String>, methods: Vec<Method>) -> Self {
        Self {
            origins,
            methods,
            allow_without_origin: false,
        }
    }
}

/// Double-submit token comparison on matching methods.
#[derive(Debug, Clone)]
pub struct TokenCheck {
    pub methods: Vec<Method>,
}

impl TokenCheck {
    pub fn new(methods: Vec<Method>) -> Self {
        Self { methods }
    }
}

/// The three optional CSRF sub-policies. An absent sub-policy disables
/// that check entirely. Configured once at setup and never mutated.
#[derive(Debug, Clone, Default)]
pub struct CsrfProtection {
    pub custom_header: Option<CustomHeaderCheck>,
    pub origin_check: Option<OriginCheck>,
    pub token: Option<TokenCheck>,
}

/// Deployment mode passed explicitly at middleware construction.
///
/// Production enforces the origin check and keeps rejection responses
/// opaque; Development skips origin enforcement (Origin and Referer are
/// unreliable outside browsers) and surfaces full diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeployMode {
    Production,
    #[default]
    Development,
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Hook applied to session data after verification or generation,
/// before memoization.
pub type ExpandSessionFn<D> =
    Arc<dyn Fn(D) -> BoxFuture<'static, Result<D, SessionError>> + Send + Sync>;

/// Override for the session-side half of the double-submit comparison.
pub type SessionTokenFn<D> = Arc<dyn Fn(&D) -> Option<String> + Send + Sync>;

/// Per-middleware option bundle handed to each request's facade.
pub struct SessionOptions<D> {
    pub deploy_mode: DeployMode,
    pub expand_session: Option<ExpandSessionFn<D>>,
    pub csrf_token_from_session: Option<SessionTokenFn<D>>,
}

impl<D> Default for SessionOptions<D> {
    fn default() -> Self {
        Self {
            deploy_mode: DeployMode::default(),
            expand_session: None,
            csrf_token_from_session: None,
        }
    }
}

impl<D> Clone for SessionOptions<D> {
    fn clone(&self) -> Self {
        Self {
            deploy_mode: self.deploy_mode,
            expand_session: self.expand_session.clone(),
            csrf_token_from_session: self.csrf_token_from_session.clone(),
        }
    }
}
