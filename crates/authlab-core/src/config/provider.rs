use redact::Secret;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{formats::PreferOne, serde_as, OneOrMany};
use url::Url;

use super::entry::default_scopes;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ProviderConfig {
    #[serde(rename = "password")]
    Password(PasswordProviderConfig),
    #[serde(rename = "oidc")]
    Oidc(OidcProviderConfig),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PasswordProviderConfig {
    #[serde(
        default = "default_code_length",
        deserialize_with = "deserialize_code_length"
    )]
    pub code_length: usize,
    #[serde(default = "default_input_code")]
    pub input_code: String,
}

impl Default for PasswordProviderConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            input_code: default_input_code(),
        }
    }
}

/// Shorter codes are guessable within the attempt limit.
pub const MIN_CODE_LENGTH: usize = 4;

fn default_code_length() -> usize {
    6
}

fn deserialize_code_length<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let length = usize::deserialize(deserializer)?;
    if length < MIN_CODE_LENGTH {
        return Err(de::Error::custom(format!(
            "code_length must be at least {MIN_CODE_LENGTH}, got {length}"
        )));
    }
    Ok(length)
}

fn default_input_code() -> String {
    "Code (check logs)".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OidcProviderConfig {
    pub issuer: String,
    pub client: OidcClientConfig,
    /// Defaults to `{hostname}/{provider}/callback`.
    pub redirect_uri: Option<Url>,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OidcClientConfig {
    pub id: String,
    #[serde(default, serialize_with = "redact_optional_secret")]
    pub secret: Option<Secret<String>>,
    #[serde(default = "default_scopes")]
    #[serde_as(as = "OneOrMany<_, PreferOne>")]
    pub scopes: Vec<String>,
}

fn redact_optional_secret<S: Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(_) => serializer.serialize_some("[REDACTED]"),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_is_tagged_by_type() {
        let password: ProviderConfig =
            serde_json::from_value(serde_json::json!({"type": "password"})).unwrap();
        let ProviderConfig::Password(password) = password else {
            panic!("expected password provider");
        };
        assert_eq!(password.code_length, 6);
        assert_eq!(password.input_code, "Code (check logs)");

        let oidc: ProviderConfig = serde_json::from_value(serde_json::json!({
            "type": "oidc",
            "issuer": "https://idp.example.com/oauth2/default",
            "client": { "id": "client-1", "secret": "s3cr3t" }
        }))
        .unwrap();
        let ProviderConfig::Oidc(oidc) = oidc else {
            panic!("expected oidc provider");
        };
        assert_eq!(oidc.client.scopes, vec!["openid", "profile", "email"]);
        assert_eq!(
            oidc.client.secret.as_ref().map(|s| s.expose_secret().as_str()),
            Some("s3cr3t")
        );
    }

    #[test]
    fn short_code_length_is_rejected() {
        let err = serde_json::from_value::<ProviderConfig>(
            serde_json::json!({"type": "password", "code_length": 0}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("code_length must be at least 4"));

        let password: PasswordProviderConfig =
            serde_json::from_value(serde_json::json!({"code_length": 4})).unwrap();
        assert_eq!(password.code_length, 4);
    }

    #[test]
    fn client_secret_is_redacted_on_serialize() {
        let client: OidcClientConfig = serde_json::from_value(
            serde_json::json!({ "id": "client-1", "secret": "s3cr3t", "scopes": "openid" }),
        )
        .unwrap();
        let serialized = serde_json::to_value(&client).unwrap();
        assert_eq!(serialized["secret"], "[REDACTED]");
        assert_eq!(serialized["scopes"], "openid");
    }
}
