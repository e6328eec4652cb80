use authlab_core::{
    code_key, refresh_key, AuthorizationCode, Error, GeneralStorage, OAuthError, RefreshToken,
};
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;

use crate::{issuer, AppState};

#[derive(Debug, Deserialize)]
pub struct Body {
    grant_type: Option<String>,
    code: Option<String>,
    redirect_uri: Option<String>,
    client_id: Option<String>,
    code_verifier: Option<String>,
    refresh_token: Option<String>,
}

pub async fn handler(State(state): State<AppState>, Form(body): Form<Body>) -> Result<Response, Error> {
    let response = match body.grant_type.as_deref() {
        Some("authorization_code") => authorization_code(&state, body).await?,
        Some("refresh_token") => refresh_token(&state, body).await?,
        Some(other) => {
            return Err(OAuthError::unsupported_grant_type(format!(
                "grant_type `{other}` is not supported"
            ))
            .into())
        }
        None => return Err(OAuthError::invalid_request("missing grant_type").into()),
    };
    Ok(([(header::CACHE_CONTROL, "no-store")], Json(response)).into_response())
}

async fn authorization_code(
    state: &AppState,
    body: Body,
) -> Result<issuer::TokenResponse, Error> {
    let code = body
        .code
        .ok_or_else(|| OAuthError::invalid_request("missing code"))?;
    let client_id = body
        .client_id
        .ok_or_else(|| OAuthError::invalid_request("missing client_id"))?;
    let redirect_uri = body
        .redirect_uri
        .ok_or_else(|| OAuthError::invalid_request("missing redirect_uri"))?;

    // consumed before any check, a failed exchange burns the code
    let stored = state
        .storage
        .take_json::<AuthorizationCode>(&code_key(&code))
        .await?
        .ok_or_else(|| OAuthError::invalid_grant("authorization code is invalid or expired"))?;

    if stored.client_id != client_id {
        return Err(OAuthError::invalid_grant("client_id does not match the authorization code").into());
    }
    if stored.redirect_uri != redirect_uri {
        return Err(OAuthError::invalid_grant("redirect_uri does not match the authorization code").into());
    }
    if let Some(challenge) = &stored.code_challenge {
        let verifier = body
            .code_verifier
            .ok_or_else(|| OAuthError::invalid_grant("missing code_verifier"))?;
        if !issuer::verify(challenge, stored.code_challenge_method.as_deref(), &verifier) {
            return Err(OAuthError::invalid_grant("PKCE verification failed").into());
        }
    }

    tracing::info!(client_id = %stored.client_id, sub = %stored.subject.subject_id(), "authorization code exchanged");
    state
        .tokens
        .issue(&state.storage, &stored.client_id, &stored.subject, stored.scope)
        .await
}

async fn refresh_token(state: &AppState, body: Body) -> Result<issuer::TokenResponse, Error> {
    let token = body
        .refresh_token
        .ok_or_else(|| OAuthError::invalid_request("missing refresh_token"))?;
    let stored = state
        .storage
        .take_json::<RefreshToken>(&refresh_key(&token))
        .await?
        .ok_or_else(|| OAuthError::invalid_grant("refresh token is invalid or expired"))?;

    if let Some(client_id) = body.client_id {
        if client_id != stored.client_id {
            return Err(OAuthError::invalid_grant("client_id does not match the refresh token").into());
        }
    }

    tracing::info!(client_id = %stored.client_id, sub = %stored.subject.subject_id(), "refresh token rotated");
    state
        .tokens
        .issue(&state.storage, &stored.client_id, &stored.subject, stored.scope)
        .await
}
