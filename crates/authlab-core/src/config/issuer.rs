use std::time::Duration;

use redact::Secret;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use url::Url;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IssuerConfig {
    /// HS256 key for access tokens.
    #[serde(serialize_with = "redact::serde::redact_secret")]
    pub signing_secret: Secret<String>,
    #[serde(default)]
    pub ttl: TtlConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    /// Extra hosts a client `redirect_uri` may point at. Localhost and the
    /// issuer's own domain are always accepted.
    #[serde(default)]
    pub allowed_redirect_hosts: Vec<String>,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TtlConfig {
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_authorization_ttl")]
    pub authorization: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_code_ttl")]
    pub code: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_access_ttl")]
    pub access: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_refresh_ttl")]
    pub refresh: Duration,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            authorization: default_authorization_ttl(),
            code: default_code_ttl(),
            access: default_access_ttl(),
            refresh: default_refresh_ttl(),
        }
    }
}

fn default_authorization_ttl() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_code_ttl() -> Duration {
    Duration::from_secs(60)
}

fn default_access_ttl() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_refresh_ttl() -> Duration {
    Duration::from_secs(30 * 24 * 60 * 60)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThemeConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_primary")]
    pub primary: String,
    pub favicon: Option<Url>,
    pub logo: Option<LogoConfig>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            primary: default_primary(),
            favicon: None,
            logo: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogoConfig {
    pub dark: Url,
    pub light: Url,
}

fn default_title() -> String {
    "authlab".to_string()
}

fn default_primary() -> String {
    "#0051c3".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_reads_seconds() {
        let ttl: TtlConfig =
            serde_json::from_value(serde_json::json!({"code": 30, "refresh": 120})).unwrap();
        assert_eq!(ttl.code, Duration::from_secs(30));
        assert_eq!(ttl.refresh, Duration::from_secs(120));
        assert_eq!(ttl.access, default_access_ttl());
    }

    #[test]
    fn signing_secret_is_redacted_on_serialize() {
        let config: IssuerConfig =
            serde_json::from_value(serde_json::json!({"signing_secret": "hunter2"})).unwrap();
        assert_eq!(config.signing_secret.expose_secret(), "hunter2");

        let serialized = serde_json::to_string(&config).unwrap();
        assert!(!serialized.contains("hunter2"));
        assert_eq!(config.theme.primary, "#0051c3");
        assert!(config.allowed_redirect_hosts.is_empty());
    }
}
