use std::fmt;

use axum::{body::Body, response::IntoResponse, Json};
use http::{header, Response, StatusCode};
use oauth2::ConfigurationError;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Normal Http Errors
    #[error("Bad Request: {0}")]
    BadRequest(#[from] Error400),

    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] Error401),

    #[error("Not Found: {0}")]
    NotFound(#[from] Error404),

    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),

    // Special Errors, expected 500
    #[error("Unable to process user: {0}")]
    UserNotFound(String),

    #[error("No Token Endpoint")]
    NoTokenEndpoint,

    #[error("Fatal error: {0}")]
    Fatal(#[from] FatalError),

    #[error("Reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Jwt error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Url error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Discovery error: {0}")]
    DiscoveryError(#[from] openidconnect::DiscoveryError<oauth2::HttpClientError<reqwest::Error>>),

    #[error("Configuration error: {0}")]
    ConfigurationError(#[from] ConfigurationError),

    #[error("Sqlx error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error400 {
    #[error("Invalid url")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Missing parameter `{0}`")]
    MissingParameter(&'static str),

    #[error("Invalid header string data {0}")]
    InvalidHeaderString(http::header::HeaderName),

    #[error("'Bearer' type expected, but got {0}")]
    BearerTokenExpected(String),

    #[error("Invalid token: {0}")]
    InvalidToken(&'static str),

    #[error("No authorization in progress")]
    NoAuthorization,

    #[error("Invalid callback: {0}")]
    InvalidCallback(&'static str),

    #[error("Upstream provider returned error: {0}")]
    UpstreamError(String),

    #[error("Upstream identity has no email")]
    MissingEmail,

    #[error("redirect_uri `{0}` is not allowed")]
    RedirectUriNotAllowed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error401 {
    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Invalid access token")]
    InvalidAccessToken,
}

#[derive(Debug, thiserror::Error)]
pub enum Error404 {
    #[error("Provider not found(provider={provider})")]
    ProviderNotFound { provider: String },

    #[error("Provider `{provider}` has no {step} step")]
    ProviderStepNotFound {
        provider: String,
        step: &'static str,
    },

    #[error("Authorization not found(authorization_id={authorization_id})")]
    AuthorizationNotFound { authorization_id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error("Token request error")]
    TokenRequestError,

    #[error("Userinfo request error")]
    UserinfoRequestError,

    #[error("No usable jwk for id token")]
    NoUsableJwk,
}

/// Error codes of RFC 6749 section 5.2 (and 4.1.2.1 for the authorize redirect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthErrorCode {
    InvalidRequest,
    InvalidClient,
    InvalidGrant,
    UnsupportedGrantType,
    UnsupportedResponseType,
    ServerError,
}

impl OAuthErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::InvalidGrant => "invalid_grant",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::ServerError => "server_error",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OAuthError {
    pub error: OAuthErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl OAuthError {
    pub fn new<D: Into<String>>(error: OAuthErrorCode, description: D) -> Self {
        Self {
            error,
            error_description: Some(description.into()),
        }
    }

    pub fn invalid_request<D: Into<String>>(description: D) -> Self {
        Self::new(OAuthErrorCode::InvalidRequest, description)
    }

    pub fn invalid_grant<D: Into<String>>(description: D) -> Self {
        Self::new(OAuthErrorCode::InvalidGrant, description)
    }

    pub fn unsupported_grant_type<D: Into<String>>(description: D) -> Self {
        Self::new(OAuthErrorCode::UnsupportedGrantType, description)
    }
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(description) => write!(f, "{}: {}", self.error.as_str(), description),
            None => f.write_str(self.error.as_str()),
        }
    }
}

impl std::error::Error for OAuthError {}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response<Body> {
        let status = match self.error {
            OAuthErrorCode::InvalidClient => StatusCode::UNAUTHORIZED,
            OAuthErrorCode::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        (status, [(header::CACHE_CONTROL, "no-store")], Json(self)).into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response<Body> {
        match self {
            Self::BadRequest(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            Self::Unauthorized(e) => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                e.to_string(),
            )
                .into_response(),
            Self::NotFound(e) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
            Self::OAuth(e) => e.into_response(),
            Self::Fatal(e) => {
                tracing::error!(error = %e, "fatal error");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
            err => {
                tracing::error!(error = %err, "internal error");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
