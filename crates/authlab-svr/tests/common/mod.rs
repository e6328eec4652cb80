#![allow(dead_code)]

use authlab_core::{Config, PasswordProviderConfig};
use authlab_provider::{PasswordProvider, Provider, Providers};
use authlab_storage::{connect, MemoryStorage, Storage, UserRepository};
use authlab_svr::{router::router_with_state, AppState};
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

pub const CLIENT_ID: &str = "app";
pub const REDIRECT_URI: &str = "https://app.example.com/cb";

pub fn config() -> Config {
    serde_json::from_value(serde_json::json!({
        "server": { "addr": "127.0.0.1:9090", "hostname": "https://auth.example.com" },
        "entry": { "client_id": "authlab-demo", "scopes": ["openid", "email"] },
        "database": { "url": "sqlite::memory:" },
        "issuer": {
            "signing_secret": "integration-secret",
            "allowed_redirect_hosts": ["partner.test"],
        },
        "providers": { "password": { "type": "password" } },
    }))
    .unwrap()
}

pub async fn app() -> (Router, AppState) {
    let config = config();
    let pool = connect(&config.database).await.unwrap();
    let users = UserRepository::new(pool);
    users.migrate().await.unwrap();
    let providers = Providers::from_providers([Provider::Password(PasswordProvider::new(
        "password",
        PasswordProviderConfig::default(),
        config.issuer.theme.clone(),
        config.issuer.ttl.authorization,
    ))]);
    let state = AppState::from_parts(
        config,
        Storage::Memory(MemoryStorage::new()),
        users,
        providers,
    );
    (router_with_state(state.clone()), state)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, cookie: Option<&str>, pairs: &[(&str, &str)]) -> Request<Body> {
    let body = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

/// `name=value` of the first `Set-Cookie` header.
pub fn cookie(response: &Response<Body>) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

pub async fn json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn assert_status(response: &Response<Body>, status: StatusCode) {
    assert_eq!(response.status(), status, "unexpected status");
}
