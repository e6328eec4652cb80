use std::collections::HashMap;

use authlab_core::{
    authorization_key, Error, Error400, Error404, GeneralProvider, GeneralStorage, ProviderStep,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    Form,
};
use axum_extra::extract::CookieJar;

use crate::{issuer, AppState};

async fn pending_authorization(state: &AppState, jar: &CookieJar) -> Result<String, Error> {
    let authorization_id = issuer::authorization_id(jar).ok_or(Error400::NoAuthorization)?;
    if state
        .storage
        .get(&authorization_key(&authorization_id))
        .await?
        .is_none()
    {
        return Err(Error404::AuthorizationNotFound { authorization_id }.into());
    }
    Ok(authorization_id)
}

async fn finish(state: &AppState, jar: CookieJar, step: ProviderStep) -> Result<Response, Error> {
    match step {
        ProviderStep::Respond(response) => Ok(response),
        ProviderStep::Complete {
            authorization_id,
            identity,
        } => issuer::complete(state, jar, &authorization_id, identity).await,
    }
}

pub async fn authorize(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    jar: CookieJar,
) -> Result<Response, Error> {
    let provider = state.providers.get(&provider)?;
    let authorization_id = pending_authorization(&state, &jar).await?;
    let step = provider.authorize(&state.storage, &authorization_id).await?;
    finish(&state, jar, step).await
}

pub async fn submit(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    jar: CookieJar,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response, Error> {
    let provider = state.providers.get(&provider)?;
    let authorization_id = pending_authorization(&state, &jar).await?;
    let step = provider
        .submit(&state.storage, &authorization_id, &form)
        .await?;
    finish(&state, jar, step).await
}

/// Upstream redirects land here; the pending authorization is found through
/// the provider's own state, not the cookie.
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    jar: CookieJar,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, Error> {
    let provider = state.providers.get(&provider)?;
    tracing::info!(provider = %provider.name(), "Callback params: {:?}", query.keys().collect::<Vec<_>>());
    let step = provider.callback(&state.storage, &query).await?;
    finish(&state, jar, step).await
}
