use http::HeaderValue;
use http::header::{COOKIE, HeaderMap};

use crate::config::CookieOptions;
use crate::error::SessionError;

/// Render a Set-Cookie value for the session cookie. The value is
/// percent-encoded (Bearer-prefixed tokens contain a space, which cookie
/// values may not carry raw).
pub(crate) fn set_cookie_value(
    name: &str,
    value: &str,
    options: &CookieOptions,
) -> Result<HeaderValue, SessionError> {
    render_cookie(name, &urlencoding::encode(value), options, options.max_age)
}

/// Render a Set-Cookie value that expires the session cookie.
pub(crate) fn clear_cookie_value(
    name: &str,
    options: &CookieOptions,
) -> Result<HeaderValue, SessionError> {
    render_cookie(name, "", options, Some(0))
}

fn render_cookie(
    name: &str,
    value: &str,
    options: &CookieOptions,
    max_age: Option<i64>,
) -> Result<HeaderValue, SessionError> {
    let mut cookie = format!("{name}={value}; SameSite={}", options.same_site);
    if options.secure {
        cookie.push_str("; Secure");
    }
    if options.http_only {
        cookie.push_str("; HttpOnly");
    }
    cookie.push_str(&format!("; Path={}", options.path));
    if let Some(domain) = &options.domain {
        cookie.push_str(&format!("; Domain={domain}"));
    }
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    cookie
        .parse()
        .map_err(|_| SessionError::Cookie("Failed to build Set-Cookie header".to_string()))
}

/// Find a cookie by name in the request's Cookie header.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_str = headers.get(COOKIE)?.to_str().ok()?;
    cookie_str.split(';').map(|s| s.trim()).find_map(|s| {
        let mut parts = s.splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some(k), Some(v)) if k == name => Some(v.to_string()),
            _ => None,
        }
    })
}

/// Decode a session cookie value into the bare token the engine expects.
/// Accepts both `Bearer <token>` values written by the facade and bare
/// tokens set by other clients.
pub(crate) fn session_token_from_cookie(raw: &str) -> Option<String> {
    let decoded = urlencoding::decode(raw).ok()?;
    let token = decoded.strip_prefix("Bearer ").unwrap_or(&decoded);
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
