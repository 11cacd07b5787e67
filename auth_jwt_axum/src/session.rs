use std::ops::Deref;

use axum::extract::FromRequestParts;
use http::StatusCode;
use http::request::Parts;

use auth_jwt::{SessionFacade, TokenEngine};

/// The request's session facade, available as an axum extractor.
///
/// The facade is attached by the [`authenticate`](crate::authenticate)
/// middleware; extracting it on a route outside that middleware is a
/// wiring mistake and answers with a server error.
///
/// # Example
///
/// ```no_run
/// use auth_jwt::TokenEngine;
/// use auth_jwt_axum::Session;
///
/// async fn profile<E: TokenEngine>(session: Session<E>) -> String {
///     match session.get_data(false).await {
///         Ok(Some(_data)) => "authenticated".to_string(),
///         Ok(None) => "anonymous".to_string(),
///         Err(e) => format!("session failure: {e}"),
///     }
/// }
/// ```
pub struct Session<E: TokenEngine>(pub SessionFacade<E>);

impl<E: TokenEngine> Clone for Session<E> {
    fn clone(&self) -> Self {
        Session(self.0.clone())
    }
}

impl<E: TokenEngine> Deref for Session<E> {
    type Target = SessionFacade<E>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, E> FromRequestParts<S> for Session<E>
where
    S: Send + Sync,
    E: TokenEngine,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionFacade<E>>()
            .cloned()
            .map(Session)
            .ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "auth-jwt middleware is not installed on this route",
            ))
    }
}
