use thiserror::Error;

/// Failures surfaced by the session facade.
///
/// Expected runtime conditions (missing cookie, expired token, invalid
/// token) are handled inside the facade and never appear here; these
/// variants cover engine and configuration faults the caller must handle.
#[derive(Debug, Error, Clone)]
pub enum SessionError {
    /// Error from the token engine's generate operation
    #[error("Token engine error: {0}")]
    Engine(String),

    /// Error from the configured session expansion hook
    #[error("Session expansion error: {0}")]
    Expand(String),

    #[error("Cookie error: {0}")]
    Cookie(String),
}
