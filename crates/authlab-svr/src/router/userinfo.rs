use authlab_core::{Error, Subject};
use axum::{extract::State, Json};

use crate::{issuer::TokenIssuer, middlewares::BearerToken};

pub async fn handler(
    State(tokens): State<TokenIssuer>,
    BearerToken(token): BearerToken,
) -> Result<Json<Subject>, Error> {
    Ok(Json(tokens.verify_access(&token)?))
}
