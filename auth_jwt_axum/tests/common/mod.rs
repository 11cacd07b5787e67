//! Shared fixtures for the middleware tests: a scriptable token engine
//! driven entirely by its constructor, so each test declares the session
//! state it runs against.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use auth_jwt::{
    CookieConfig, CsrfProtection, IssuedToken, ReissueParams, SessionData, SessionError,
    TokenEngine, TokenOptions, TokenPayload, VerifyError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestData {
    pub user: String,
    pub csrf_token: Option<String>,
    pub expanded: bool,
}

impl SessionData for TestData {
    fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestParams {
    pub user: String,
}

pub enum VerifyOutcome {
    Valid,
    Expired,
    Invalid,
}

pub struct MockEngine {
    pub outcome: VerifyOutcome,
    pub cookie_config: CookieConfig,
    pub csrf_protection: CsrfProtection,
    pub verify_calls: AtomicUsize,
    pub generate_calls: AtomicUsize,
}

pub const ORIGINAL_WINDOW: u64 = 3600;

impl MockEngine {
    pub fn new(outcome: VerifyOutcome) -> Self {
        Self {
            outcome,
            cookie_config: CookieConfig::default(),
            csrf_protection: CsrfProtection::default(),
            verify_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_protection(outcome: VerifyOutcome, protection: CsrfProtection) -> Self {
        let mut engine = Self::new(outcome);
        engine.csrf_protection = protection;
        engine
    }

    fn session_data(&self) -> TestData {
        TestData {
            user: "alice".to_string(),
            csrf_token: Some("session-secret".to_string()),
            expanded: false,
        }
    }
}

pub fn original_oiat() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
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
                data: self.session_data(),
                data_params: TestParams {
                    user: "alice".to_string(),
                },
                oiat: original_oiat(),
                max_age: ORIGINAL_WINDOW,
            }),
            VerifyOutcome::Expired => Err(VerifyError::Expired(ReissueParams {
                data_params: TestParams {
                    user: "alice".to_string(),
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
        Ok(IssuedToken {
            payload: TokenPayload {
                data: TestData {
                    user: params.user.clone(),
                    csrf_token: Some("session-secret".to_string()),
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
