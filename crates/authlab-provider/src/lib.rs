mod oidc;
mod password;
pub mod ui;

use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use authlab_core::{
    Config, Error, Error404, GeneralProvider, GeneralStorage, ProviderConfig, ProviderStep,
};
pub use oidc::*;
pub use password::*;

#[derive(Clone)]
pub enum Provider {
    Password(PasswordProvider),
    Oidc(OidcProvider),
}

impl GeneralProvider for Provider {
    fn name(&self) -> &str {
        match self {
            Provider::Password(provider) => provider.name(),
            Provider::Oidc(provider) => provider.name(),
        }
    }

    async fn authorize<S: GeneralStorage>(
        &self,
        storage: &S,
        authorization_id: &str,
    ) -> Result<ProviderStep, Error> {
        match self {
            Provider::Password(provider) => provider.authorize(storage, authorization_id).await,
            Provider::Oidc(provider) => provider.authorize(storage, authorization_id).await,
        }
    }

    async fn submit<S: GeneralStorage>(
        &self,
        storage: &S,
        authorization_id: &str,
        form: &HashMap<String, String>,
    ) -> Result<ProviderStep, Error> {
        match self {
            Provider::Password(provider) => provider.submit(storage, authorization_id, form).await,
            Provider::Oidc(provider) => provider.submit(storage, authorization_id, form).await,
        }
    }

    async fn callback<S: GeneralStorage>(
        &self,
        storage: &S,
        query: &HashMap<String, String>,
    ) -> Result<ProviderStep, Error> {
        match self {
            Provider::Password(provider) => provider.callback(storage, query).await,
            Provider::Oidc(provider) => provider.callback(storage, query).await,
        }
    }
}

impl Provider {
    pub async fn new(
        name: &str,
        provider: &ProviderConfig,
        config: &Config,
        http: &reqwest::Client,
    ) -> Result<Self, Error> {
        match provider {
            ProviderConfig::Password(password) => Ok(Provider::Password(PasswordProvider::new(
                name,
                password.clone(),
                config.issuer.theme.clone(),
                config.issuer.ttl.authorization,
            ))),
            ProviderConfig::Oidc(oidc) => Ok(Provider::Oidc(
                OidcProvider::discover(
                    name,
                    oidc,
                    &config.server,
                    config.issuer.ttl.authorization,
                    http.clone(),
                )
                .await?,
            )),
        }
    }
}

/// Configured providers keyed by the name used in their routes.
#[derive(Clone, Default)]
pub struct Providers(Arc<BTreeMap<String, Provider>>);

impl Providers {
    pub async fn new(config: &Config, http: &reqwest::Client) -> Result<Self, Error> {
        let mut providers = BTreeMap::new();
        for (name, provider) in &config.providers {
            let provider = Provider::new(name, provider, config, http).await?;
            tracing::info!(provider = %name, "provider ready");
            providers.insert(name.clone(), provider);
        }
        if providers.is_empty() {
            tracing::warn!("No providers configured, every authorization will end on an empty selection page");
        }
        Ok(Self(Arc::new(providers)))
    }

    pub fn from_providers(providers: impl IntoIterator<Item = Provider>) -> Self {
        Self(Arc::new(
            providers
                .into_iter()
                .map(|provider| (provider.name().to_string(), provider))
                .collect(),
        ))
    }

    pub fn get(&self, name: &str) -> Result<&Provider, Error> {
        self.0.get(name).ok_or_else(|| {
            Error404::ProviderNotFound {
                provider: name.to_string(),
            }
            .into()
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authlab_core::{PasswordProviderConfig, ThemeConfig};
    use std::time::Duration;

    fn password(name: &str) -> Provider {
        Provider::Password(PasswordProvider::new(
            name,
            PasswordProviderConfig::default(),
            ThemeConfig::default(),
            Duration::from_secs(60),
        ))
    }

    #[test]
    fn providers_are_keyed_by_name() {
        let providers = Providers::from_providers([password("password"), password("backup")]);
        assert_eq!(providers.len(), 2);
        assert_eq!(providers.names().collect::<Vec<_>>(), vec!["backup", "password"]);
        assert_eq!(providers.get("backup").unwrap().name(), "backup");
    }

    #[test]
    fn unknown_provider_is_not_found() {
        let providers = Providers::from_providers([password("password")]);
        assert!(matches!(
            providers.get("github"),
            Err(Error::NotFound(Error404::ProviderNotFound { .. }))
        ));
    }
}
