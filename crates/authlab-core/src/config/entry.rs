use serde::{Deserialize, Serialize};
use serde_with::{formats::PreferOne, serde_as, OneOrMany};
use url::Url;

/// Parameters forced onto the authorize request issued by `GET /`.
#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntryConfig {
    pub client_id: String,
    /// Defaults to `{hostname}/callback`.
    pub redirect_uri: Option<Url>,
    #[serde(default = "default_scopes")]
    #[serde_as(as = "OneOrMany<_, PreferOne>")]
    pub scopes: Vec<String>,
}

impl EntryConfig {
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }
}

pub(crate) fn default_scopes() -> Vec<String> {
    vec![
        "openid".to_string(),
        "profile".to_string(),
        "email".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_accept_one_or_many() {
        let one: EntryConfig =
            serde_json::from_value(serde_json::json!({"client_id": "c", "scopes": "openid"}))
                .unwrap();
        assert_eq!(one.scope(), "openid");

        let many: EntryConfig = serde_json::from_value(
            serde_json::json!({"client_id": "c", "scopes": ["openid", "email"]}),
        )
        .unwrap();
        assert_eq!(many.scope(), "openid email");
    }

    #[test]
    fn scopes_default_to_standard_oidc() {
        let config: EntryConfig =
            serde_json::from_value(serde_json::json!({"client_id": "c"})).unwrap();
        assert_eq!(config.scope(), "openid profile email");
        assert!(config.redirect_uri.is_none());
    }
}
