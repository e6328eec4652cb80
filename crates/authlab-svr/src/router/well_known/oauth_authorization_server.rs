use std::sync::Arc;

use authlab_core::Config;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// RFC 8414 metadata.
#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    pub response_types_supported: Vec<String>,
    pub code_challenge_methods_supported: Vec<String>,
    pub token_endpoint_auth_methods_supported: Vec<String>,
    pub grant_types_supported: Vec<String>,
}

pub(crate) async fn handler(State(config): State<Arc<Config>>) -> Json<Response> {
    let server = &config.server;
    Json(Response {
        issuer: server.issuer(),
        authorization_endpoint: server.endpoint("/authorize").to_string(),
        token_endpoint: server.endpoint("/token").to_string(),
        userinfo_endpoint: server.endpoint("/userinfo").to_string(),
        response_types_supported: vec!["code".to_string()],
        code_challenge_methods_supported: vec!["S256".to_string(), "plain".to_string()],
        token_endpoint_auth_methods_supported: vec!["none".to_string()],
        grant_types_supported: vec![
            "authorization_code".to_string(),
            "refresh_token".to_string(),
        ],
    })
}
