//! auth-jwt - request-scoped JWT session facade with CSRF protection.
//!
//! This crate mediates session state between an opaque token engine and a
//! web framework: a per-request [`SessionFacade`] offers memoized session
//! reads with transparent refresh of expired tokens, write-through cookie
//! issuance and local invalidation, while the CSRF policy engine enforces
//! header-presence, origin allow-list and double-submit token checks.
//!
//! The token engine is an external collaborator implementing
//! [`TokenEngine`]; this crate never signs or verifies tokens itself.
//! Framework glue (middleware wiring, request-body token extraction)
//! lives in companion crates such as `auth-jwt-axum`.

mod config;
mod csrf;
mod engine;
mod error;
mod session;
mod utils;

#[cfg(test)]
mod test_utils;

pub use config::{
    BoxFuture, CookieConfig, CookieOptions, CsrfProtection, CustomHeaderCheck, DeployMode,
    ExpandSessionFn, OriginCheck, SESSION_COOKIE_NAME, SameSite, SessionOptions, SessionTokenFn,
    TokenCheck,
};
pub use csrf::{CsrfViolation, method_matches};
pub use engine::{
    IssuedToken, ReissueParams, SessionData, TokenEngine, TokenOptions, TokenPayload, VerifyError,
};
pub use error::SessionError;
pub use session::{IssuedSession, SessionFacade};
