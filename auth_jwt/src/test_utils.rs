//! Shared test fixtures: a scriptable token engine and request builders.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::HeaderMap;
use http::header::COOKIE;

use crate::config::{CookieConfig, CsrfProtection};
use crate::engine::{
    IssuedToken, ReissueParams, SessionData, TokenEngine, TokenOptions, TokenPayload, VerifyError,
};
use crate::error::SessionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TestData {
    pub(crate) user: String,
    pub(crate) csrf_token: Option<String>,
    pub(crate) expanded: bool,
}

impl SessionData for TestData {
    fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TestParams {
    pub(crate) user: String,
}

/// What the mock's verify should do, regardless of the token it is given.
pub(crate) enum VerifyOutcome {
    Valid,
    Expired,
    Invalid,
}

pub(crate) struct MockEngine {
    pub(crate) outcome: VerifyOutcome,
    pub(crate) data: TestData,
    pub(crate) cookie_config: CookieConfig,
    pub(crate) csrf_protection: CsrfProtection,
    pub(crate) verify_calls: AtomicUsize,
    pub(crate) generate_calls: AtomicUsize,
    pub(crate) last_generate: Mutex<Option<(TestParams, Option<TokenOptions>)>>,
}

const ORIGINAL_WINDOW: u64 = 3600;

impl MockEngine {
    pub(crate) fn new(outcome: VerifyOutcome) -> Self {
        Self {
            outcome,
            data: TestData {
                user: "alice".to_string(),
                csrf_token: Some("session-secret".to_string()),
                expanded: false,
            },
            cookie_config: CookieConfig::default(),
            csrf_protection: CsrfProtection::default(),
            verify_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
            last_generate: Mutex::new(None),
        }
    }
}

#[async_trait]
impl TokenEngine for MockEngine {
    type DataParams = TestParams;
    type Data = TestData;

    async fn verify(
        &self,
        _token: &str,
        _force_refresh: bool,
    ) -> Result<TokenPayload<TestParams, TestData>, VerifyError<TestParams>> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            VerifyOutcome::Valid => Ok(TokenPayload {
                data: self.data.clone(),
                data_params: TestParams {
                    user: self.data.user.clone(),
                },
                oiat: original_oiat(),
                max_age: ORIGINAL_WINDOW,
            }),
            VerifyOutcome::Expired => Err(VerifyError::Expired(ReissueParams {
                data_params: TestParams {
                    user: self.data.user.clone(),
                },
                oiat: original_oiat(),
                max_age: ORIGINAL_WINDOW,
            })),
            VerifyOutcome::Invalid => Err(VerifyError::Invalid("signature mismatch".to_string())),
        }
    }

    async fn generate(
        &self,
        params: TestParams,
        options: Option<TokenOptions>,
    ) -> Result<IssuedToken<TestParams, TestData>, SessionError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        let oiat = options
            .as_ref()
            .and_then(|o| o.oiat)
            .unwrap_or_else(original_oiat);
        let max_age = options
            .as_ref()
            .and_then(|o| o.max_age)
            .unwrap_or(ORIGINAL_WINDOW);
        *self.last_generate.lock().unwrap() = Some((params.clone(), options));
        Ok(IssuedToken {
            payload: TokenPayload {
                data: TestData {
                    user: params.user.clone(),
                    csrf_token: self.data.csrf_token.clone(),
                    expanded: false,
                },
                data_params: params,
                oiat,
                max_age,
            },
            token: "fresh-token".to_string(),
        })
    }

    fn cookie_config(&self) -> &CookieConfig {
        &self.cookie_config
    }

    fn csrf_protection(&self) -> &CsrfProtection {
        &self.csrf_protection
    }
}

/// The fixed issued-at used by the mock's expired tokens.
pub(crate) fn original_oiat() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Headers carrying a session cookie the mock engine will accept.
pub(crate) fn session_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, "Authorization=Bearer%20abc123".parse().unwrap());
    headers
}
