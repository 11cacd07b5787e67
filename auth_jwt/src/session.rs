use std::sync::Arc;

use http::{HeaderMap, HeaderValue, Method};
use tokio::sync::Mutex;

use crate::config::SessionOptions;
use crate::csrf::{self, CsrfViolation};
use crate::engine::{SessionData, TokenEngine, TokenOptions, TokenPayload, VerifyError};
use crate::error::SessionError;
use crate::utils::{clear_cookie_value, cookie_value, session_token_from_cookie, set_cookie_value};

/// Result of minting a session token through the facade: the raw payload,
/// the resolved (expanded) data and the token itself.
#[derive(Debug, Clone)]
pub struct IssuedSession<P, D> {
    pub payload: TokenPayload<P, D>,
    pub data: D,
    pub token: String,
}

/// The memoized-data slot. Once resolved (to data or to an anonymous
/// `None`) the resolution is reused for the lifetime of the request
/// unless a forced refresh re-enters resolution.
enum Memo<D> {
    Unset,
    Resolved(Option<D>),
}

struct FacadeState<D> {
    memo: Memo<D>,
    set_cookies: Vec<HeaderValue>,
}

/// Per-request session access facade.
///
/// One facade is constructed per request and attached to it; clones share
/// the same memo slot, so the middleware and downstream handlers observe
/// a single resolution. Never share a facade across requests.
///
/// # Example
///
/// ```no_run
/// # use auth_jwt::{SessionFacade, TokenEngine};
/// # async fn handler<E: TokenEngine>(session: SessionFacade<E>) {
/// match session.get_data(false).await {
///     Ok(Some(data)) => { /* authenticated */ }
///     Ok(None) => { /* anonymous */ }
///     Err(e) => { /* engine or expansion fault */ }
/// }
/// # }
/// ```
pub struct SessionFacade<E: TokenEngine> {
    engine: Arc<E>,
    options: Arc<SessionOptions<E::Data>>,
    method: Method,
    headers: Arc<HeaderMap>,
    session_cookie: Option<String>,
    request_csrf_token: Option<String>,
    state: Arc<Mutex<FacadeState<E::Data>>>,
}

impl<E: TokenEngine> Clone for SessionFacade<E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            options: self.options.clone(),
            method: self.method.clone(),
            headers: self.headers.clone(),
            session_cookie: self.session_cookie.clone(),
            request_csrf_token: self.request_csrf_token.clone(),
            state: self.state.clone(),
        }
    }
}

impl<E: TokenEngine> SessionFacade<E> {
    /// Bind a facade to one request. `request_csrf_token` is the
    /// request-side half of the double-submit comparison, extracted by the
    /// surrounding middleware before the body is handed downstream.
    pub fn new(
        engine: Arc<E>,
        options: Arc<SessionOptions<E::Data>>,
        method: Method,
        headers: HeaderMap,
        request_csrf_token: Option<String>,
    ) -> Self {
        let session_cookie = cookie_value(&headers, &engine.cookie_config().name);
        Self {
            engine,
            options,
            method,
            headers: Arc::new(headers),
            session_cookie,
            request_csrf_token,
            state: Arc::new(Mutex::new(FacadeState {
                memo: Memo::Unset,
                set_cookies: Vec::new(),
            })),
        }
    }

    /// Resolve the session data for this request.
    ///
    /// Resolutions are memoized: repeated calls return the cached value
    /// (even an anonymous `None`) without touching the token engine, until
    /// `force_refresh` re-enters resolution.
    ///
    /// An expired token is reissued transparently with its original issue
    /// parameters; any other verification failure degrades to an anonymous
    /// session and clears the cookie.
    ///
    /// # Errors
    ///
    /// Only engine generate failures (on the reissue path) and expansion
    /// hook failures surface here.
    pub async fn get_data(&self, force_refresh: bool) -> Result<Option<E::Data>, SessionError> {
        {
            let state = self.state.lock().await;
            if let Memo::Resolved(data) = &state.memo {
                if !force_refresh {
                    tracing::trace!("Session data memo hit");
                    return Ok(data.clone());
                }
            }
        }

        let mut data = None;
        if let Some(token) = self.session_cookie.as_deref().and_then(session_token_from_cookie) {
            match self.engine.verify(&token, force_refresh).await {
                Ok(payload) => data = Some(payload.data),
                Err(VerifyError::Expired(reissue)) => {
                    tracing::debug!("Session token expired, reissuing with original window");
                    let issued = self
                        .generate(
                            reissue.data_params,
                            Some(TokenOptions {
                                oiat: Some(reissue.oiat),
                                max_age: Some(reissue.max_age),
                            }),
                        )
                        .await?;
                    return Ok(Some(issued.data));
                }
                Err(VerifyError::Invalid(reason)) => {
                    tracing::debug!("Invalid session token, degrading to anonymous: {reason}");
                    self.remove().await;
                    return Ok(None);
                }
            }
        } else {
            tracing::trace!("No session cookie on request");
        }

        let data = match (data, &self.options.expand_session) {
            (Some(data), Some(expand)) => Some((expand.as_ref())(data).await?),
            (data, _) => data,
        };

        let mut state = self.state.lock().await;
        state.memo = Memo::Resolved(data.clone());
        Ok(data)
    }

    /// Mint a new session token, memoize its (expanded) data and, when
    /// cookie-backed sessions are enabled, queue a Set-Cookie carrying the
    /// Bearer-prefixed token.
    ///
    /// # Errors
    ///
    /// Engine and expansion failures propagate to the caller.
    pub async fn generate(
        &self,
        params: E::DataParams,
        options: Option<TokenOptions>,
    ) -> Result<IssuedSession<E::DataParams, E::Data>, SessionError> {
        let issued = self.engine.generate(params, options).await?;
        let data = match &self.options.expand_session {
            Some(expand) => (expand.as_ref())(issued.payload.data.clone()).await?,
            None => issued.payload.data.clone(),
        };

        let cookie_config = self.engine.cookie_config();
        let mut state = self.state.lock().await;
        state.memo = Memo::Resolved(Some(data.clone()));
        if cookie_config.use_cookie {
            let value = format!("Bearer {}", issued.token);
            state.set_cookies.push(set_cookie_value(
                &cookie_config.name,
                &value,
                &cookie_config.options,
            )?);
        }
        drop(state);

        Ok(IssuedSession {
            payload: issued.payload,
            data,
            token: issued.token,
        })
    }

    /// Force a fresh resolution, bypassing the memoized value.
    pub async fn refresh_data(&self) -> Result<Option<E::Data>, SessionError> {
        self.get_data(true).await
    }

    /// Invalidate the session locally: memoize an anonymous resolution and
    /// queue a cookie clear. No token engine call is made.
    pub async fn remove(&self) {
        let cookie_config = self.engine.cookie_config();
        let mut state = self.state.lock().await;
        state.memo = Memo::Resolved(None);
        match clear_cookie_value(&cookie_config.name, &cookie_config.options) {
            Ok(value) => state.set_cookies.push(value),
            Err(e) => tracing::error!("Failed to build session-clearing cookie: {e}"),
        }
    }

    /// Run the configured CSRF checks against this request. Returns every
    /// violation found; an empty list means the request passed.
    pub async fn check_csrf(&self) -> Result<Vec<CsrfViolation>, SessionError> {
        csrf::evaluate(self).await
    }

    /// Drain the Set-Cookie values queued by `generate` and `remove` so
    /// the middleware can apply them to the outgoing response.
    pub async fn take_set_cookies(&self) -> Vec<HeaderValue> {
        let mut state = self.state.lock().await;
        std::mem::take(&mut state.set_cookies)
    }

    /// Session-side half of the double-submit comparison: the configured
    /// lookup override, or the data's own `csrf_token`, applied to the
    /// memoized resolution.
    pub(crate) async fn session_csrf_token(&self) -> Result<Option<String>, SessionError> {
        let data = self.get_data(false).await?;
        Ok(match (&data, &self.options.csrf_token_from_session) {
            (Some(data), Some(lookup)) => (lookup.as_ref())(data),
            (Some(data), None) => data.csrf_token().map(str::to_owned),
            (None, _) => None,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub(crate) fn engine(&self) -> &E {
        &self.engine
    }

    pub(crate) fn options(&self) -> &SessionOptions<E::Data> {
        &self.options
    }

    pub(crate) fn request_csrf_token(&self) -> Option<&str> {
        self.request_csrf_token.as_deref()
    }
}
