mod common;

use axum::http::StatusCode;
use common::*;
use url::Url;

#[tokio::test]
async fn root_redirects_to_authorize_with_forced_params() {
    let (app, _) = app().await;
    let response = send(&app, get("/?scope=admin&response_type=token&foo=bar")).await;
    assert_status(&response, StatusCode::FOUND);

    let target = Url::parse(&location(&response)).unwrap();
    assert_eq!(target.origin().ascii_serialization(), "https://auth.example.com");
    assert_eq!(target.path(), "/authorize");
    let pairs: Vec<(String, String)> = target.query_pairs().into_owned().collect();
    assert!(pairs.contains(&("foo".to_string(), "bar".to_string())));
    assert!(pairs.contains(&("response_type".to_string(), "code".to_string())));
    assert!(pairs.contains(&("scope".to_string(), "openid email".to_string())));
    assert!(pairs.contains(&("client_id".to_string(), "authlab-demo".to_string())));
    assert!(pairs.contains(&(
        "redirect_uri".to_string(),
        "https://auth.example.com/callback".to_string()
    )));
    assert_eq!(pairs.iter().filter(|(key, _)| key == "scope").count(), 1);
}

#[tokio::test]
async fn callback_echoes_every_param() {
    let (app, _) = app().await;
    let response = send(&app, get("/callback?code=abc&state=xyz&extra=%20space")).await;
    assert_status(&response, StatusCode::OK);

    let body = json(response).await;
    assert_eq!(
        body,
        serde_json::json!({
            "message": "OAuth flow complete!",
            "params": { "code": "abc", "state": "xyz", "extra": " space" }
        })
    );
}

#[tokio::test]
async fn callback_without_query_returns_empty_params() {
    let (app, _) = app().await;
    let body = json(send(&app, get("/callback")).await).await;
    assert_eq!(body["params"], serde_json::json!({}));
}

#[tokio::test]
async fn well_known_metadata_uses_hostname() {
    let (app, _) = app().await;
    let response = send(&app, get("/.well-known/oauth-authorization-server")).await;
    assert_status(&response, StatusCode::OK);

    let body = json(response).await;
    assert_eq!(body["issuer"], "https://auth.example.com");
    assert_eq!(body["authorization_endpoint"], "https://auth.example.com/authorize");
    assert_eq!(body["token_endpoint"], "https://auth.example.com/token");
    assert_eq!(body["code_challenge_methods_supported"], serde_json::json!(["S256", "plain"]));
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let (app, _) = app().await;
    let response = send(&app, get("/nothing/here/at/all")).await;
    assert_status(&response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_check_is_served_under_meta() {
    let (app, _) = app().await;
    let response = send(&app, get("/.meta/health")).await;
    assert_status(&response, StatusCode::OK);
}
