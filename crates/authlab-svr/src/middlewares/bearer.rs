use authlab_core::{Error, Error400, Error401};
use axum::extract::FromRequestParts;
use http::{header, request::Parts};

/// Raw token from an `Authorization: Bearer <token>` header.
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
            return Err(Error401::InvalidAccessToken.into());
        };
        let value = value
            .to_str()
            .map_err(|_| Error400::InvalidHeaderString(header::AUTHORIZATION))?;
        match value.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => {
                Ok(Self(token.trim().to_string()))
            }
            Some((scheme, _)) => Err(Error400::BearerTokenExpected(scheme.to_string()).into()),
            None => Err(Error400::BearerTokenExpected(value.to_string()).into()),
        }
    }
}
