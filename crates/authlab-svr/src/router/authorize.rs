use authlab_core::{
    authorization_key, AuthorizationRequest, Error, Error400, GeneralStorage, OAuthErrorCode,
};
use authlab_provider::ui;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use serde::Deserialize;
use url::Url;

use crate::{
    issuer::{random_token, redirect_allowed, PkceMethod, AUTHORIZATION_COOKIE},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct Params {
    client_id: Option<String>,
    redirect_uri: Option<String>,
    response_type: Option<String>,
    state: Option<String>,
    scope: Option<String>,
    code_challenge: Option<String>,
    code_challenge_method: Option<String>,
    provider: Option<String>,
}

/// Error redirect of RFC 6749 section 4.1.2.1.
fn redirect_error(
    mut redirect_uri: Url,
    error: OAuthErrorCode,
    description: &str,
    state: Option<&str>,
) -> Response {
    {
        let mut pairs = redirect_uri.query_pairs_mut();
        pairs
            .append_pair("error", error.as_str())
            .append_pair("error_description", description);
        if let Some(state) = state {
            pairs.append_pair("state", state);
        }
    }
    Redirect::to(redirect_uri.as_str()).into_response()
}

pub async fn handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<Params>,
) -> Result<Response, Error> {
    let client_id = params
        .client_id
        .ok_or(Error400::MissingParameter("client_id"))?;
    let redirect_uri = params
        .redirect_uri
        .ok_or(Error400::MissingParameter("redirect_uri"))?;
    let redirect_url = Url::parse(&redirect_uri).map_err(Error400::InvalidUrl)?;
    if !redirect_allowed(&state.config, &redirect_url) {
        tracing::warn!(%client_id, %redirect_uri, "redirect_uri rejected");
        return Err(Error400::RedirectUriNotAllowed(redirect_uri).into());
    }

    let response_type = match params.response_type.as_deref() {
        Some("code") => "code".to_string(),
        _ => {
            return Ok(redirect_error(
                redirect_url,
                OAuthErrorCode::UnsupportedResponseType,
                "only response_type=code is supported",
                params.state.as_deref(),
            ))
        }
    };
    if params.code_challenge.is_none() && params.code_challenge_method.is_some() {
        return Ok(redirect_error(
            redirect_url,
            OAuthErrorCode::InvalidRequest,
            "code_challenge_method without code_challenge",
            params.state.as_deref(),
        ));
    }
    if params.code_challenge.is_some()
        && PkceMethod::from_request(params.code_challenge_method.as_deref()).is_none()
    {
        return Ok(redirect_error(
            redirect_url,
            OAuthErrorCode::InvalidRequest,
            "unsupported code_challenge_method",
            params.state.as_deref(),
        ));
    }
    if let Some(name) = &params.provider {
        state.providers.get(name)?;
    }

    let authorization_id = random_token();
    let request = AuthorizationRequest {
        client_id,
        redirect_uri,
        response_type,
        state: params.state,
        scope: params.scope,
        code_challenge: params.code_challenge,
        code_challenge_method: params.code_challenge_method,
    };
    state
        .storage
        .set_json(
            &authorization_key(&authorization_id),
            &request,
            Some(state.config.issuer.ttl.authorization),
        )
        .await?;
    tracing::info!(client_id = %request.client_id, "authorization started");

    let cookie = Cookie::build((AUTHORIZATION_COOKIE, authorization_id))
        .path("/")
        .http_only(true)
        .secure(state.config.server.hostname.scheme() == "https")
        .same_site(SameSite::Lax);
    let jar = jar.add(cookie);

    let target = match params.provider {
        Some(name) => Some(name),
        None if state.providers.len() == 1 => state.providers.names().next().map(str::to_string),
        None => None,
    };
    match target {
        Some(name) => Ok((jar, Redirect::to(&format!("/{name}/authorize"))).into_response()),
        None => Ok((
            jar,
            ui::select_page(&state.config.issuer.theme, state.providers.names()),
        )
            .into_response()),
    }
}
