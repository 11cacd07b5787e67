//! Axum integration for the auth-jwt session and CSRF middleware.
//!
//! [`AuthJwt`] carries the token engine and all middleware configuration;
//! [`authenticate`] is the per-request middleware that attaches a
//! [`Session`] facade, enforces the engine's CSRF policy and mirrors
//! queued session cookies onto the response.

mod error;
mod middleware;
mod session;

pub use middleware::{
    AuthJwt, CSRF_TOKEN_FIELD, CsrfRequestTokenFn, authenticate, default_request_token,
};
pub use session::Session;

// Re-export the core surface handlers and engine implementations need.
pub use auth_jwt::{
    CookieConfig, CookieOptions, CsrfProtection, CsrfViolation, CustomHeaderCheck, DeployMode,
    IssuedSession, IssuedToken, OriginCheck, ReissueParams, SameSite, SessionData, SessionError,
    SessionFacade, TokenCheck, TokenEngine, TokenOptions, TokenPayload, VerifyError,
};
