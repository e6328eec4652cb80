use std::{collections::BTreeMap, sync::Arc};

use authlab_core::Config;
use axum::{
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use url::Url;

/// Parameters of `GET /` that are always replaced from configuration.
const FORCED_PARAMS: [&str; 4] = ["client_id", "redirect_uri", "response_type", "scope"];

fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|query| form_urlencoded::parse(query.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Builds the `/authorize` url `GET /` sends the browser to.
pub fn entry_redirect(config: &Config, params: &[(String, String)]) -> Url {
    let redirect_uri = config
        .entry
        .redirect_uri
        .clone()
        .unwrap_or_else(|| config.server.endpoint("/callback"));
    let mut url = config.server.endpoint("/authorize");
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params
            .iter()
            .filter(|(key, _)| !FORCED_PARAMS.contains(&key.as_str()))
        {
            pairs.append_pair(key, value);
        }
        pairs
            .append_pair("client_id", &config.entry.client_id)
            .append_pair("redirect_uri", redirect_uri.as_str())
            .append_pair("response_type", "code")
            .append_pair("scope", &config.entry.scope());
    }
    url
}

pub async fn root(
    State(config): State<Arc<Config>>,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    let params = parse_query(query.as_deref());
    tracing::info!("Incoming request: /?{}", query.as_deref().unwrap_or_default());
    let target = entry_redirect(&config, &params);
    tracing::info!("Redirecting to: {}", target);
    (StatusCode::FOUND, [(header::LOCATION, target.to_string())])
}

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub message: &'static str,
    pub params: BTreeMap<String, String>,
}

pub async fn callback(RawQuery(query): RawQuery) -> Json<CallbackResponse> {
    let params: BTreeMap<String, String> = parse_query(query.as_deref()).into_iter().collect();
    tracing::info!("Callback params: {:?}", params);
    Json(CallbackResponse {
        message: "OAuth flow complete!",
        params,
    })
}
