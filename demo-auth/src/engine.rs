//! An HS256 token engine backed by `jsonwebtoken`.
//!
//! The session core treats the engine as opaque; this one packs the
//! session data, its issue parameters and the original-issued-at into the
//! JWT claims so expired tokens can be reissued with their original
//! window.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use http::Method;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use auth_jwt::{
    CookieConfig, CsrfProtection, CustomHeaderCheck, IssuedToken, ReissueParams, SessionData,
    SessionError, TokenCheck, TokenEngine, TokenOptions, TokenPayload, VerifyError,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
    pub csrf_token: String,
}

impl SessionData for Profile {
    fn csrf_token(&self) -> Option<&str> {
        Some(&self.csrf_token)
    }
}

/// Issue parameters. The CSRF token lives here so it survives silent
/// reissues of an expired session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileParams {
    pub user_id: String,
    pub csrf_token: String,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    data: Profile,
    data_params: ProfileParams,
    oiat: i64,
    max_age: u64,
    exp: i64,
}

pub struct HsTokenEngine {
    encoding: EncodingKey,
    decoding: DecodingKey,
    cookie_config: CookieConfig,
    csrf_protection: CsrfProtection,
    default_max_age: u64,
}

impl HsTokenEngine {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            cookie_config: CookieConfig::default(),
            csrf_protection: CsrfProtection {
                custom_header: Some(CustomHeaderCheck::new(
                    "X-Requested-With",
                    vec![Method::POST],
                )),
                origin_check: None,
                token: Some(TokenCheck::new(vec![Method::POST])),
            },
            default_max_age: 3600,
        }
    }
}

#[async_trait]
impl TokenEngine for HsTokenEngine {
    type DataParams = ProfileParams;
    type Data = Profile;

    async fn verify(
        &self,
        token: &str,
        _force_refresh: bool,
    ) -> Result<TokenPayload<ProfileParams, Profile>, VerifyError<ProfileParams>> {
        match decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256)) {
            Ok(decoded) => {
                let claims = decoded.claims;
                Ok(TokenPayload {
                    data: claims.data,
                    data_params: claims.data_params,
                    oiat: Utc
                        .timestamp_opt(claims.oiat, 0)
                        .single()
                        .unwrap_or_else(Utc::now),
                    max_age: claims.max_age,
                })
            }
            Err(err) if matches!(err.kind(), ErrorKind::ExpiredSignature) => {
                // Recover the original issue parameters from the expired
                // token; the signature is still checked.
                let mut validation = Validation::new(Algorithm::HS256);
                validation.validate_exp = false;
                let decoded = decode::<Claims>(token, &self.decoding, &validation)
                    .map_err(|e| VerifyError::Invalid(e.to_string()))?;
                let claims = decoded.claims;
                Err(VerifyError::Expired(ReissueParams {
                    data_params: claims.data_params,
                    oiat: Utc
                        .timestamp_opt(claims.oiat, 0)
                        .single()
                        .unwrap_or_else(Utc::now),
                    max_age: claims.max_age,
                }))
            }
            Err(err) => Err(VerifyError::Invalid(err.to_string())),
        }
    }

    async fn generate(
        &self,
        params: ProfileParams,
        options: Option<TokenOptions>,
    ) -> Result<IssuedToken<ProfileParams, Profile>, SessionError> {
        let options = options.unwrap_or_default();
        let oiat = options.oiat.unwrap_or_else(Utc::now);
        let max_age = options.max_age.unwrap_or(self.default_max_age);

        // A real deployment would load the profile from its user store;
        // the demo derives it from the parameters.
        let data = Profile {
            user_id: params.user_id.clone(),
            display_name: format!("user {}", params.user_id),
            csrf_token: params.csrf_token.clone(),
        };
        let claims = Claims {
            data: data.clone(),
            data_params: params.clone(),
            oiat: oiat.timestamp(),
            max_age,
            exp: (Utc::now() + Duration::seconds(max_age as i64)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| SessionError::Engine(e.to_string()))?;

        Ok(IssuedToken {
            payload: TokenPayload {
                data,
                data_params: params,
                oiat,
                max_age,
            },
            token,
        })
    }

    fn cookie_config(&self) -> &CookieConfig {
        &self.cookie_config
    }

    fn csrf_protection(&self) -> &CsrfProtection {
        &self.csrf_protection
    }
}
