pub mod oauth_authorization_server;

use authlab_core::Config;
use axum::{routing::get, Router};

use crate::AppState;

pub fn router(_config: &Config) -> Router<AppState> {
    Router::new().route(
        "/oauth-authorization-server",
        get(oauth_authorization_server::handler),
    )
}
