//! Authorization-server side shared by every provider: code issuance,
//! PKCE checks and token signing.

mod pkce;
mod redirect;
mod tokens;

pub use pkce::*;
pub use redirect::*;
pub use tokens::*;

use authlab_core::{
    authorization_key, code_key, AuthorizationCode, AuthorizationRequest, Error, Error404,
    GeneralStorage, Identity, Subject,
};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::{cookie::Cookie, CookieJar};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use url::Url;

use crate::AppState;

/// Cookie binding the browser to its pending authorization request.
pub const AUTHORIZATION_COOKIE: &str = "authorization";

/// 256 bits of randomness, url-safe.
pub fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn authorization_id(jar: &CookieJar) -> Option<String> {
    jar.get(AUTHORIZATION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// Ends a provider flow: resolves the user, issues a one-time code and sends
/// the browser back to the client.
pub async fn complete(
    state: &AppState,
    jar: CookieJar,
    authorization_id: &str,
    identity: Identity,
) -> Result<Response, Error> {
    let request = state
        .storage
        .take_json::<AuthorizationRequest>(&authorization_key(authorization_id))
        .await?
        .ok_or_else(|| Error404::AuthorizationNotFound {
            authorization_id: authorization_id.to_string(),
        })?;

    let user_id = state.users.find_or_create_user(&identity.email).await?;
    let subject = Subject::user(user_id);

    let code = random_token();
    let record = AuthorizationCode {
        client_id: request.client_id.clone(),
        redirect_uri: request.redirect_uri.clone(),
        subject,
        scope: request.scope.clone(),
        code_challenge: request.code_challenge.clone(),
        code_challenge_method: request.code_challenge_method.clone(),
    };
    state
        .storage
        .set_json(&code_key(&code), &record, Some(state.config.issuer.ttl.code))
        .await?;

    let mut redirect = Url::parse(&request.redirect_uri)?;
    {
        let mut pairs = redirect.query_pairs_mut();
        pairs.append_pair("code", &code);
        if let Some(client_state) = &request.state {
            pairs.append_pair("state", client_state);
        }
    }
    tracing::info!(
        provider = %identity.provider,
        client_id = %request.client_id,
        "Redirecting to: {}",
        redirect
    );

    let jar = jar.remove(Cookie::build(AUTHORIZATION_COOKIE).path("/"));
    Ok((jar, Redirect::to(redirect.as_str())).into_response())
}
