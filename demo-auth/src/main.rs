use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Router, middleware};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth_jwt::DeployMode;
use auth_jwt_axum::{AuthJwt, authenticate};

mod engine;
mod handlers;

use crate::engine::HsTokenEngine;
use crate::handlers::{index, login, logout, profile, update};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let secret =
        std::env::var("AUTH_JWT_SECRET").unwrap_or_else(|_| "demo-secret-change-me".to_string());
    let deploy_mode = match std::env::var("APP_ENV").as_deref() {
        Ok("production") => DeployMode::Production,
        _ => DeployMode::Development,
    };

    let engine = Arc::new(HsTokenEngine::new(secret.as_bytes()));

    // Auth routes run with verification disabled: login happens before a
    // session exists, so the double-submit check cannot apply to it.
    let auth = AuthJwt::new(engine.clone()).deploy_mode(deploy_mode);
    let auth_open = AuthJwt::new(engine)
        .deploy_mode(deploy_mode)
        .disable_request_verification(true);

    let app = Router::new()
        .route("/", get(index))
        .route("/profile", get(profile))
        .route("/update", post(update))
        .layer(middleware::from_fn_with_state(
            auth,
            authenticate::<HsTokenEngine>,
        ))
        .merge(
            Router::new()
                .route("/login", post(login))
                .route("/logout", post(logout))
                .layer(middleware::from_fn_with_state(
                    auth_open,
                    authenticate::<HsTokenEngine>,
                )),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("demo-auth listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
