use axum::Json;
use axum::extract::Form;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use auth_jwt_axum::Session;

use crate::engine::{HsTokenEngine, ProfileParams};

type AuthSession = Session<HsTokenEngine>;

fn internal_error(e: impl std::fmt::Display) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
}

pub async fn index(session: AuthSession) -> Response {
    match session.get_data(false).await {
        Ok(Some(profile)) => format!("Hello, {}!", profile.display_name).into_response(),
        Ok(None) => "Hello, guest!".into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Deserialize)]
pub struct LoginForm {
    user_id: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    user_id: String,
    /// Echo the minted CSRF token so the client can replay it in
    /// subsequent form posts.
    csrf_token: String,
}

pub async fn login(session: AuthSession, Form(form): Form<LoginForm>) -> Response {
    let params = ProfileParams {
        user_id: form.user_id,
        csrf_token: Uuid::new_v4().to_string(),
    };
    match session.generate(params, None).await {
        Ok(issued) => Json(LoginResponse {
            user_id: issued.data.user_id,
            csrf_token: issued.data.csrf_token,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn logout(session: AuthSession) -> &'static str {
    session.remove().await;
    "Logged out"
}

pub async fn profile(session: AuthSession) -> Response {
    match session.get_data(false).await {
        Ok(Some(profile)) => Json(profile).into_response(),
        Ok(None) => (StatusCode::UNAUTHORIZED, "Not logged in").into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Deserialize)]
pub struct UpdateForm {
    display_name: String,
}

/// A state-changing route; the middleware has already enforced the
/// custom-header and double-submit checks before this runs.
pub async fn update(session: AuthSession, Form(form): Form<UpdateForm>) -> Response {
    match session.get_data(false).await {
        Ok(Some(profile)) => format!(
            "Updated display name of {} to {}",
            profile.user_id, form.display_name
        )
        .into_response(),
        Ok(None) => (StatusCode::UNAUTHORIZED, "Not logged in").into_response(),
        Err(e) => internal_error(e),
    }
}
