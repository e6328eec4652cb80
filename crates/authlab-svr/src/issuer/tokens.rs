use std::{ops::Deref, sync::Arc, time::Duration};

use authlab_core::{
    refresh_key, Config, Error, Error401, GeneralStorage, RefreshToken, Subject, UserProperties,
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::random_token;

const ACCESS_MODE: &str = "access";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: UserProperties,
    pub mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Signs HS256 access tokens and keeps refresh tokens in storage.
#[derive(Clone)]
pub struct TokenIssuer(Arc<InnerTokenIssuer>);

impl Deref for TokenIssuer {
    type Target = InnerTokenIssuer;

    fn deref(&self) -> &Self::Target {
        Arc::as_ref(&self.0)
    }
}

pub struct InnerTokenIssuer {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &Config) -> Self {
        let secret = config.issuer.signing_secret.expose_secret().as_bytes();
        Self(Arc::new(InnerTokenIssuer {
            issuer: config.server.issuer(),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl: config.issuer.ttl.access,
            refresh_ttl: config.issuer.ttl.refresh,
        }))
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn issue_access(&self, client_id: &str, subject: &Subject) -> Result<String, Error> {
        let iat = jsonwebtoken::get_current_timestamp();
        let claims = AccessClaims {
            iss: self.issuer.clone(),
            sub: subject.subject_id(),
            aud: client_id.to_string(),
            iat,
            exp: iat + self.access_ttl.as_secs(),
            kind: subject.kind.clone(),
            properties: subject.properties.clone(),
            mode: ACCESS_MODE.to_string(),
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    pub fn verify_access(&self, token: &str) -> Result<Subject, Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_aud = false;

        let data = jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map_err(|err| {
                tracing::debug!(error = %err, "access token rejected");
                Error401::InvalidAccessToken
            })?;
        if data.claims.mode != ACCESS_MODE {
            return Err(Error401::InvalidAccessToken.into());
        }
        Ok(Subject {
            kind: data.claims.kind,
            properties: data.claims.properties,
        })
    }

    /// Issues an access token and a fresh refresh token for `subject`.
    pub async fn issue<S: GeneralStorage>(
        &self,
        storage: &S,
        client_id: &str,
        subject: &Subject,
        scope: Option<String>,
    ) -> Result<TokenResponse, Error> {
        let access_token = self.issue_access(client_id, subject)?;
        let refresh_token = random_token();
        let record = RefreshToken {
            client_id: client_id.to_string(),
            subject: subject.clone(),
            scope: scope.clone(),
        };
        storage
            .set_json(&refresh_key(&refresh_token), &record, Some(self.refresh_ttl))
            .await?;

        Ok(TokenResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl.as_secs(),
            scope,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authlab_storage::MemoryStorage;

    fn config(secret: &str) -> Config {
        serde_json::from_value(serde_json::json!({
            "server": { "addr": "127.0.0.1:9090", "hostname": "https://auth.example.com" },
            "entry": { "client_id": "demo" },
            "issuer": { "signing_secret": secret },
        }))
        .unwrap()
    }

    #[test]
    fn access_token_round_trips_subject() {
        let tokens = TokenIssuer::new(&config("secret-1"));
        let subject = Subject::user("abc123");
        let token = tokens.issue_access("client-1", &subject).unwrap();

        assert_eq!(tokens.verify_access(&token).unwrap(), subject);

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS256);
    }

    #[test]
    fn access_token_carries_issuer_claims() {
        let tokens = TokenIssuer::new(&config("secret-1"));
        let token = tokens.issue_access("client-1", &Subject::user("abc123")).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&["client-1"]);
        let claims = jsonwebtoken::decode::<AccessClaims>(
            &token,
            &DecodingKey::from_secret(b"secret-1"),
            &validation,
        )
        .unwrap()
        .claims;
        assert_eq!(claims.iss, "https://auth.example.com");
        assert_eq!(claims.sub, "user:abc123");
        assert_eq!(claims.mode, "access");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = TokenIssuer::new(&config("secret-1"))
            .issue_access("client-1", &Subject::user("abc123"))
            .unwrap();
        let err = TokenIssuer::new(&config("secret-2"))
            .verify_access(&token)
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(Error401::InvalidAccessToken)));
    }

    #[tokio::test]
    async fn issue_stores_refresh_token() {
        let tokens = TokenIssuer::new(&config("secret-1"));
        let storage = MemoryStorage::new();
        let response = tokens
            .issue(&storage, "client-1", &Subject::user("abc123"), Some("openid".to_string()))
            .await
            .unwrap();

        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 3600);
        let record = storage
            .get_json::<RefreshToken>(&refresh_key(&response.refresh_token))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.client_id, "client-1");
        assert_eq!(record.subject, Subject::user("abc123"));
    }
}
