use std::future::Future;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http::header::{CONTENT_TYPE, SET_COOKIE};
use http::request::Parts;
use http::{HeaderMap, Method};

use auth_jwt::{
    DeployMode, ExpandSessionFn, SessionError, SessionFacade, SessionOptions, TokenEngine,
    method_matches,
};

use crate::error::{csrf_rejection, session_error_response};

/// Field holding the request-side CSRF token in form and JSON bodies.
pub const CSRF_TOKEN_FIELD: &str = "CSRFToken";

const DEFAULT_CSRF_BODY_LIMIT: usize = 256 * 1024;

/// Extracts the request-side CSRF token from the request head and, when
/// the middleware buffered one, the request body.
pub type CsrfRequestTokenFn = Arc<dyn Fn(&Parts, Option<&Bytes>) -> Option<String> + Send + Sync>;

/// Middleware state wiring a token engine into a router.
///
/// Built once at setup and cloned per request by axum. All behavior is
/// explicit configuration on this value; nothing is read from the
/// environment.
///
/// # Example
///
/// ```no_run
/// use auth_jwt::DeployMode;
/// use auth_jwt_axum::{AuthJwt, authenticate};
/// use axum::{Router, middleware, routing::get};
/// # use auth_jwt::TokenEngine;
/// # fn wire<E: TokenEngine>(engine: E) -> Router {
/// let auth = AuthJwt::new(engine).deploy_mode(DeployMode::Production);
/// Router::new()
///     .route("/", get(|| async { "hello" }))
///     .layer(middleware::from_fn_with_state(auth, authenticate::<E>))
/// # }
/// ```
pub struct AuthJwt<E: TokenEngine> {
    engine: Arc<E>,
    options: SessionOptions<E::Data>,
    disable_request_verification: bool,
    csrf_token_from_request: CsrfRequestTokenFn,
    csrf_body_limit: usize,
}

impl<E: TokenEngine> Clone for AuthJwt<E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            options: self.options.clone(),
            disable_request_verification: self.disable_request_verification,
            csrf_token_from_request: self.csrf_token_from_request.clone(),
            csrf_body_limit: self.csrf_body_limit,
        }
    }
}

impl<E: TokenEngine> AuthJwt<E> {
    pub fn new(engine: impl Into<Arc<E>>) -> Self {
        Self {
            engine: engine.into(),
            options: SessionOptions::default(),
            disable_request_verification: false,
            csrf_token_from_request: Arc::new(default_request_token),
            csrf_body_limit: DEFAULT_CSRF_BODY_LIMIT,
        }
    }

    /// Select production or development behavior for origin enforcement
    /// and rejection verbosity.
    pub fn deploy_mode(mut self, mode: DeployMode) -> Self {
        self.options.deploy_mode = mode;
        self
    }

    /// Skip the CSRF verdict entirely; the facade is still attached so
    /// handlers can verify on their own terms.
    pub fn disable_request_verification(mut self, disable: bool) -> Self {
        self.disable_request_verification = disable;
        self
    }

    /// Transform raw payload data into an enriched shape before it is
    /// memoized, on both the read and the generate path.
    pub fn expand_session<F, Fut>(mut self, expand: F) -> Self
    where
        F: Fn(E::Data) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<E::Data, SessionError>> + Send + 'static,
    {
        let hook: ExpandSessionFn<E::Data> = Arc::new(move |data| Box::pin(expand(data)));
        self.options.expand_session = Some(hook);
        self
    }

    /// Override the session-side half of the double-submit lookup.
    pub fn csrf_token_from_session<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&E::Data) -> Option<String> + Send + Sync + 'static,
    {
        self.options.csrf_token_from_session = Some(Arc::new(lookup));
        self
    }

    /// Override the request-side half of the double-submit lookup. The
    /// default reads the `CSRFToken` field of a form or JSON body.
    pub fn csrf_token_from_request<F>(mut self, extract: F) -> Self
    where
        F: Fn(&Parts, Option<&Bytes>) -> Option<String> + Send + Sync + 'static,
    {
        self.csrf_token_from_request = Arc::new(extract);
        self
    }

    /// Cap on how much of a form or JSON body is buffered for the
    /// double-submit check.
    pub fn csrf_body_limit(mut self, limit: usize) -> Self {
        self.csrf_body_limit = limit;
        self
    }

    fn token_check_applies(&self, method: &Method) -> bool {
        !self.disable_request_verification
            && self
                .engine
                .csrf_protection()
                .token
                .as_ref()
                .is_some_and(|check| method_matches(method, &check.methods))
    }
}

/// Per-request middleware: attaches a fresh [`SessionFacade`] to the
/// request, runs the CSRF verdict unless disabled, and mirrors the
/// facade's queued Set-Cookie values onto the outgoing response.
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn authenticate<E: TokenEngine>(
    State(auth): State<AuthJwt<E>>,
    req: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();

    let (request_token, body) = if auth.token_check_applies(&parts.method) {
        match buffer_csrf_body(&parts.headers, body, auth.csrf_body_limit).await {
            BufferedBody::Buffered(bytes) => {
                let token = (auth.csrf_token_from_request.as_ref())(&parts, Some(&bytes));
                (token, Body::from(bytes))
            }
            BufferedBody::Untouched(body) => {
                let token = (auth.csrf_token_from_request.as_ref())(&parts, None);
                (token, body)
            }
        }
    } else {
        (None, body)
    };

    let session = SessionFacade::new(
        auth.engine.clone(),
        Arc::new(auth.options.clone()),
        parts.method.clone(),
        parts.headers.clone(),
        request_token,
    );
    parts.extensions.insert(session.clone());
    let req = Request::from_parts(parts, body);

    if !auth.disable_request_verification {
        match session.check_csrf().await {
            Ok(violations) if violations.is_empty() => {}
            Ok(violations) => {
                tracing::debug!("Rejecting request with {} CSRF violation(s)", violations.len());
                let mut response = csrf_rejection(&violations, auth.options.deploy_mode);
                apply_set_cookies(&session, &mut response).await;
                return response;
            }
            Err(e) => {
                tracing::error!("Session failure during CSRF verification: {e}");
                let mut response = session_error_response(&e, auth.options.deploy_mode);
                apply_set_cookies(&session, &mut response).await;
                return response;
            }
        }
    }

    let mut response = next.run(req).await;
    apply_set_cookies(&session, &mut response).await;
    response
}

/// Cookies queued during the request (silent reissue, handler-side
/// generate or remove) are applied even to rejection responses.
async fn apply_set_cookies<E: TokenEngine>(session: &SessionFacade<E>, response: &mut Response) {
    for value in session.take_set_cookies().await {
        response.headers_mut().append(SET_COOKIE, value);
    }
}

enum BufferedBody {
    Buffered(Bytes),
    Untouched(Body),
}

/// Buffer form and JSON bodies so the double-submit token can be read
/// without losing the body for downstream extractors. Other content
/// types pass through untouched.
async fn buffer_csrf_body(headers: &HeaderMap, body: Body, limit: usize) -> BufferedBody {
    if !is_form_or_json(headers) {
        return BufferedBody::Untouched(body);
    }
    match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => BufferedBody::Buffered(bytes),
        Err(e) => {
            tracing::warn!("Failed to buffer request body for CSRF verification: {e}");
            BufferedBody::Buffered(Bytes::new())
        }
    }
}

fn is_form_or_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| {
            ct.starts_with("application/x-www-form-urlencoded")
                || ct.starts_with("application/json")
        })
}

/// Default request-side token extraction: the `CSRFToken` field of an
/// urlencoded form or top-level JSON object body.
pub fn default_request_token(parts: &Parts, body: Option<&Bytes>) -> Option<String> {
    let body = body?;
    let content_type = parts.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())?;
    if content_type.starts_with("application/x-www-form-urlencoded") {
        url::form_urlencoded::parse(body)
            .find(|(key, _)| key == CSRF_TOKEN_FIELD)
            .map(|(_, value)| value.into_owned())
    } else if content_type.starts_with("application/json") {
        serde_json::from_slice::<serde_json::Value>(body)
            .ok()?
            .get(CSRF_TOKEN_FIELD)?
            .as_str()
            .map(str::to_owned)
    } else {
        None
    }
}
