pub mod application;
pub mod database;
pub mod entry;
pub mod issuer;
pub mod provider;
pub mod server;
pub mod storage;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use application::ApplicationConfig;
pub use database::DatabaseConfig;
pub use entry::EntryConfig;
pub use issuer::{IssuerConfig, LogoConfig, ThemeConfig, TtlConfig};
pub use provider::{OidcClientConfig, OidcProviderConfig, PasswordProviderConfig, ProviderConfig};
pub use server::ServerConfig;
pub use storage::StorageConfig;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub application: ApplicationConfig,
    pub server: ServerConfig,
    pub entry: EntryConfig,
    pub issuer: IssuerConfig,
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}
