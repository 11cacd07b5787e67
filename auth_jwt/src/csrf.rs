use http::header::{ORIGIN, REFERER};
use http::{HeaderMap, Method};
use subtle::ConstantTimeEq;
use thiserror::Error;
use url::Url;

use crate::config::DeployMode;
use crate::engine::TokenEngine;
use crate::error::SessionError;
use crate::session::SessionFacade;

/// One failed CSRF check. The full list is always computed so every
/// reason is available; how much of it reaches the client is decided by
/// the middleware based on deploy mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsrfViolation {
    #[error("Missing anti-CSRF header: {0}")]
    MissingHeader(String),

    #[error(
        "Request carries no Origin or Referer; set allow_without_origin to permit originless requests"
    )]
    MissingOrigin,

    #[error("Origin {0} is not in the list of allowed origins")]
    OriginNotAllowed(String),

    #[error("CSRF token mismatch")]
    TokenMismatch,
}

/// Does the request method belong to a check's method list.
pub fn method_matches(method: &Method, methods: &[Method]) -> bool {
    methods.iter().any(|m| m == method)
}

/// Resolve the request's origin: the Origin header when present, else the
/// scheme+host+port of a parseable Referer. Unparseable or opaque values
/// resolve to no origin at all.
fn resolve_origin(headers: &HeaderMap) -> Option<String> {
    if let Some(origin) = headers.get(ORIGIN).and_then(|v| v.to_str().ok()) {
        return Some(origin.to_string());
    }
    let referer = headers.get(REFERER)?.to_str().ok()?;
    let url = Url::parse(referer).ok()?;
    match url.origin() {
        origin @ url::Origin::Tuple(..) => Some(origin.ascii_serialization()),
        url::Origin::Opaque(_) => None,
    }
}

/// Evaluate every configured CSRF check against the request bound to the
/// facade. The checks are independent; violations accumulate rather than
/// short-circuiting.
pub(crate) async fn evaluate<E: TokenEngine>(
    session: &SessionFacade<E>,
) -> Result<Vec<CsrfViolation>, SessionError> {
    let protection = session.engine().csrf_protection();
    let mut violations = Vec::new();

    if let Some(check) = &protection.custom_header {
        if method_matches(session.method(), &check.methods)
            && !session.headers().contains_key(check.header_name.as_str())
        {
            violations.push(CsrfViolation::MissingHeader(check.header_name.clone()));
        }
    }

    // Origin and Referer are unreliable outside browsers, so this check
    // only runs in production deployments.
    if let Some(check) = &protection.origin_check {
        if session.options().deploy_mode == DeployMode::Production
            && method_matches(session.method(), &check.methods)
        {
            match resolve_origin(session.headers()) {
                Some(origin) => {
                    if !check.origins.iter().any(|allowed| allowed == &origin) {
                        violations.push(CsrfViolation::OriginNotAllowed(origin));
                    }
                }
                None if check.allow_without_origin => {}
                None => violations.push(CsrfViolation::MissingOrigin),
            }
        }
    }

    if let Some(check) = &protection.token {
        if method_matches(session.method(), &check.methods) {
            let session_token = session.session_csrf_token().await?;
            let matches = match (session.request_csrf_token(), session_token.as_deref()) {
                (Some(req), Some(sess)) => bool::from(req.as_bytes().ct_eq(sess.as_bytes())),
                // either side absent is a mismatch
                _ => false,
            };
            if !matches {
                tracing::debug!("Double-submit CSRF token comparison failed");
                violations.push(CsrfViolation::TokenMismatch);
            }
        }
    }

    Ok(violations)
}
