use authlab_core::{Config, Error};
use axum::{
    http::{StatusCode, Uri},
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::{middlewares::trace_layer, AppState};

pub mod meta;
pub mod well_known;

pub mod authorize;
pub mod entry;
pub mod provider;
pub mod token;
pub mod userinfo;

pub async fn router(cancel: CancellationToken, config: Config) -> Result<Router, Error> {
    let state = AppState::new(cancel, config).await?;
    Ok(router_with_state(state))
}

pub fn router_with_state(state: AppState) -> Router {
    let config = state.config.clone();
    Router::new()
        .route("/", get(entry::root))
        .route("/callback", get(entry::callback))
        .route("/authorize", get(authorize::handler))
        .route("/token", post(token::handler))
        .route("/userinfo", get(userinfo::handler))
        .route(
            "/{provider}/authorize",
            get(provider::authorize).post(provider::submit),
        )
        .route("/{provider}/callback", get(provider::callback))
        .nest("/.well-known", well_known::router(&config))
        .nest("/.meta", meta::router(&config))
        .fallback(fallback)
        .layer(trace_layer())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn fallback(uri: Uri) -> (StatusCode, String) {
    tracing::debug!(%uri, "no route");
    (StatusCode::NOT_FOUND, format!("No route for {}", uri.path()))
}
