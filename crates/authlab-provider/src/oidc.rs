use std::{collections::HashMap, ops::Deref, sync::Arc, time::Duration};

use authlab_core::{
    Error, Error400, Error404, FatalError, GeneralProvider, GeneralStorage, Identity,
    OidcClientConfig, OidcProviderConfig, ProviderStep, ServerConfig,
};
use axum::response::{IntoResponse, Redirect};
use jsonwebtoken::{
    jwk::{AlgorithmParameters, EllipticCurve, Jwk, JwkSet},
    Algorithm, DecodingKey, Validation,
};
use oauth2::{
    basic::BasicClient, AuthUrl, ClientId, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, RedirectUrl, Scope,
};
use openidconnect::{core::CoreProviderMetadata, IssuerUrl};
use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use url::Url;

type AuthorizeClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet>;

/// Upstream OpenID Connect identity provider, authorization code flow with PKCE.
#[derive(Clone)]
pub struct OidcProvider(pub(crate) Arc<InnerOidc>);

impl Deref for OidcProvider {
    type Target = InnerOidc;

    fn deref(&self) -> &Self::Target {
        Arc::as_ref(&self.0)
    }
}

pub struct InnerOidc {
    pub(crate) name: String,
    pub(crate) issuer: String,
    pub(crate) oauth_client: AuthorizeClient,
    pub(crate) client: OidcClientConfig,
    pub(crate) redirect_uri: Url,
    pub(crate) token_endpoint: Url,
    pub(crate) userinfo_endpoint: Option<Url>,
    pub(crate) kid_map: HashMap<String, (DecodingKey, Algorithm)>,
    pub(crate) no_kid_keys: Vec<(DecodingKey, Algorithm)>,
    pub(crate) ttl: Duration,
    pub(crate) http: reqwest::Client,
}

/// Endpoints resolved from the upstream discovery document.
pub struct OidcEndpoints {
    pub issuer: String,
    pub authorization_endpoint: Url,
    pub token_endpoint: Url,
    pub userinfo_endpoint: Option<Url>,
    pub jwks: JwkSet,
}

/// Round-trip state kept between `/{name}/authorize` and `/{name}/callback`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcPending {
    pub authorization_id: String,
    pub nonce: String,
    pub pkce_verifier: String,
}

pub fn pending_key(csrf_state: &str) -> String {
    format!("oidc/{csrf_state}")
}

#[derive(Debug, Deserialize)]
struct UpstreamTokenResponse {
    access_token: String,
    id_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    pub email: Option<String>,
    pub nonce: Option<String>,
}

impl OidcProvider {
    pub async fn discover(
        name: impl Into<String>,
        config: &OidcProviderConfig,
        server: &ServerConfig,
        ttl: Duration,
        http: reqwest::Client,
    ) -> Result<Self, Error> {
        let issuer_url = IssuerUrl::new(config.issuer.clone())?;
        let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, &http)
            .await
            .map_err(
                |err: openidconnect::DiscoveryError<oauth2::HttpClientError<reqwest::Error>>| {
                    tracing::error!("Failed to discover OIDC metadata: {}", err);
                    err
                },
            )?;
        let Some(token_endpoint) = provider_metadata.token_endpoint() else {
            return Err(Error::NoTokenEndpoint);
        };
        tracing::info!(url = ?config.issuer, "OIDC Discovered");

        let jwks: JwkSet = http
            .get(provider_metadata.jwks_uri().to_string())
            .send()
            .await?
            .json()
            .await?;
        let endpoints = OidcEndpoints {
            issuer: provider_metadata.issuer().to_string(),
            authorization_endpoint: provider_metadata.authorization_endpoint().url().clone(),
            token_endpoint: token_endpoint.url().clone(),
            userinfo_endpoint: provider_metadata
                .userinfo_endpoint()
                .map(|userinfo| userinfo.url().clone()),
            jwks,
        };
        Ok(Self::from_endpoints(name, config, server, ttl, http, endpoints))
    }

    pub fn from_endpoints(
        name: impl Into<String>,
        config: &OidcProviderConfig,
        server: &ServerConfig,
        ttl: Duration,
        http: reqwest::Client,
        endpoints: OidcEndpoints,
    ) -> Self {
        let name = name.into();
        let mut kid_map = HashMap::new();
        let mut no_kid_keys = Vec::new();
        for key in &endpoints.jwks.keys {
            let decoding_key = match DecodingKey::from_jwk(key) {
                Ok(decoding_key) => decoding_key,
                Err(err) => {
                    tracing::warn!(error = ?err, kid = ?key.common.key_id, "skipping unusable jwk");
                    continue;
                }
            };
            let Some(algorithm) = jwk_algorithm(key) else {
                tracing::warn!(kid = ?key.common.key_id, "skipping jwk without a signing algorithm");
                continue;
            };
            if let Some(kid) = &key.common.key_id {
                kid_map.insert(kid.clone(), (decoding_key, algorithm));
            } else {
                no_kid_keys.push((decoding_key, algorithm));
            }
        }

        let redirect_uri = config
            .redirect_uri
            .clone()
            .unwrap_or_else(|| server.endpoint(&format!("/{name}/callback")));
        let oauth_client = BasicClient::new(ClientId::new(config.client.id.clone()))
            .set_auth_uri(AuthUrl::from_url(endpoints.authorization_endpoint))
            .set_redirect_uri(RedirectUrl::from_url(redirect_uri.clone()));

        OidcProvider(Arc::new(InnerOidc {
            name,
            issuer: endpoints.issuer,
            oauth_client,
            client: config.client.clone(),
            redirect_uri,
            token_endpoint: endpoints.token_endpoint,
            userinfo_endpoint: endpoints.userinfo_endpoint,
            kid_map,
            no_kid_keys,
            ttl,
            http,
        }))
    }
}

/// Algorithm a JWK is used with: its `alg` member, else the usual one for its key type.
fn jwk_algorithm(key: &Jwk) -> Option<Algorithm> {
    if let Some(key_algorithm) = &key.common.key_algorithm {
        return serde_json::to_value(key_algorithm)
            .ok()
            .and_then(|value| value.as_str().and_then(|alg| alg.parse().ok()));
    }
    match &key.algorithm {
        AlgorithmParameters::RSA(_) => Some(Algorithm::RS256),
        AlgorithmParameters::EllipticCurve(params) => match params.curve {
            EllipticCurve::P256 => Some(Algorithm::ES256),
            EllipticCurve::P384 => Some(Algorithm::ES384),
            _ => None,
        },
        AlgorithmParameters::OctetKeyPair(_) => Some(Algorithm::EdDSA),
        AlgorithmParameters::OctetKey(_) => Some(Algorithm::HS256),
    }
}

fn random_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

impl InnerOidc {
    fn scopes(&self) -> Vec<Scope> {
        self.client.scopes.iter().cloned().map(Scope::new).collect()
    }

    fn pick_jwtkey_by_jwtheader(
        &self,
        header: &jsonwebtoken::Header,
    ) -> Box<dyn Iterator<Item = &(DecodingKey, Algorithm)> + '_> {
        if let Some(kid) = &header.kid {
            if let Some(dec_key) = self.kid_map.get(kid) {
                return Box::new(std::iter::once(dec_key));
            }
        }
        Box::new(self.no_kid_keys.iter().chain(self.kid_map.values()))
    }

    pub(crate) fn verify_id_token(&self, id_token: &str, nonce: &str) -> Result<IdTokenClaims, Error> {
        if self.kid_map.is_empty() && self.no_kid_keys.is_empty() {
            return Err(FatalError::NoUsableJwk.into());
        }
        let header = jsonwebtoken::decode_header(id_token)
            .map_err(|_| Error400::InvalidToken("Invalid id token header"))?;

        let mut failures = Vec::new();
        for (key, algorithm) in self.pick_jwtkey_by_jwtheader(&header) {
            // the key decides the algorithm, the token header only has to agree
            let mut validation = Validation::new(*algorithm);
            validation.set_audience(&[&self.client.id]);
            validation.set_issuer(&[&self.issuer]);
            match jsonwebtoken::decode::<IdTokenClaims>(id_token, key, &validation) {
                Ok(data) => {
                    if data.claims.nonce.as_deref() != Some(nonce) {
                        return Err(Error400::InvalidToken("id token nonce mismatch").into());
                    }
                    return Ok(data.claims);
                }
                Err(e) => failures.push(e),
            }
        }
        tracing::info!("Failed to validate id token: {:#?}", &failures);
        Err(Error400::InvalidToken("No valid key for id token").into())
    }

    async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<UpstreamTokenResponse, Error> {
        let mut params: Vec<(&str, String)> = vec![
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
            ("redirect_uri", self.redirect_uri.to_string()),
            ("client_id", self.client.id.clone()),
            ("code_verifier", pkce_verifier.to_string()),
        ];
        if let Some(secret) = &self.client.secret {
            params.push(("client_secret", secret.expose_secret().to_string()));
        }

        let response = self
            .http
            .post(self.token_endpoint.clone())
            .form(&params)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body, "token request error");
            return Err(FatalError::TokenRequestError.into());
        }
        Ok(response.json::<UpstreamTokenResponse>().await?)
    }

    async fn fetch_userinfo_email(&self, access_token: &str) -> Result<Option<String>, Error> {
        let Some(userinfo_endpoint) = &self.userinfo_endpoint else {
            return Ok(None);
        };
        let response = self
            .http
            .get(userinfo_endpoint.clone())
            .bearer_auth(access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            tracing::error!(status = %response.status(), "userinfo request error");
            return Err(FatalError::UserinfoRequestError.into());
        }
        let userinfo: serde_json::Value = response.json().await?;
        Ok(userinfo
            .get("email")
            .and_then(|email| email.as_str())
            .map(str::to_string))
    }
}

impl GeneralProvider for OidcProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn authorize<S: GeneralStorage>(
        &self,
        storage: &S,
        authorization_id: &str,
    ) -> Result<ProviderStep, Error> {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let nonce = random_nonce();
        let (auth_url, csrf_token) = self
            .oauth_client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(self.scopes())
            .add_extra_param("nonce", nonce.clone())
            .set_pkce_challenge(pkce_challenge)
            .url();

        let pending = OidcPending {
            authorization_id: authorization_id.to_string(),
            nonce,
            pkce_verifier: pkce_verifier.secret().to_string(),
        };
        storage
            .set_json(&pending_key(csrf_token.secret()), &pending, Some(self.ttl))
            .await?;
        tracing::info!(provider = %self.name, "Redirecting to: {}", auth_url);
        Ok(ProviderStep::Respond(
            Redirect::to(auth_url.as_str()).into_response(),
        ))
    }

    async fn submit<S: GeneralStorage>(
        &self,
        _storage: &S,
        _authorization_id: &str,
        _form: &HashMap<String, String>,
    ) -> Result<ProviderStep, Error> {
        Err(Error404::ProviderStepNotFound {
            provider: self.name.clone(),
            step: "submit",
        }
        .into())
    }

    async fn callback<S: GeneralStorage>(
        &self,
        storage: &S,
        query: &HashMap<String, String>,
    ) -> Result<ProviderStep, Error> {
        if let Some(error) = query.get("error") {
            let description = query
                .get("error_description")
                .map(|description| format!("{error}: {description}"))
                .unwrap_or_else(|| error.clone());
            return Err(Error400::UpstreamError(description).into());
        }
        let code = query
            .get("code")
            .ok_or(Error400::MissingParameter("code"))?;
        let state = query
            .get("state")
            .ok_or(Error400::MissingParameter("state"))?;
        let pending = storage
            .take_json::<OidcPending>(&pending_key(state))
            .await?
            .ok_or(Error400::InvalidCallback("unknown or expired state"))?;

        let tokens = self.exchange_code(code, &pending.pkce_verifier).await?;
        let id_token = tokens
            .id_token
            .as_deref()
            .ok_or(Error400::InvalidCallback("token response has no id_token"))?;
        let claims = self.verify_id_token(id_token, &pending.nonce)?;
        let email = match claims.email {
            Some(email) => email,
            None => self
                .fetch_userinfo_email(&tokens.access_token)
                .await?
                .ok_or(Error400::MissingEmail)?,
        };
        tracing::info!(provider = %self.name, sub = %claims.sub, "OIDC identity verified");

        Ok(ProviderStep::Complete {
            authorization_id: pending.authorization_id,
            identity: Identity {
                provider: self.name.clone(),
                email,
            },
        })
    }
}
