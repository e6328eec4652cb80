use std::{sync::Arc, time::Duration};

use authlab_core::{Config, Error, GeneralStorage};
use authlab_provider::Providers;
use authlab_storage::{Storage, UserRepository};
use axum::extract::FromRef;
use tokio_util::sync::CancellationToken;

use crate::issuer::TokenIssuer;

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Storage,
    pub users: UserRepository,
    pub providers: Providers,
    pub tokens: TokenIssuer,
}

impl AppState {
    /// Connects the database, prepares the user table, resolves every provider
    /// and starts the background purge of expired storage entries.
    pub async fn new(cancel: CancellationToken, config: Config) -> Result<Self, Error> {
        let pool = authlab_storage::connect(&config.database).await?;
        let users = UserRepository::new(pool.clone());
        users.migrate().await?;
        let storage = Storage::new(&config.storage, pool).await?;
        let providers = Providers::new(&config, &reqwest::Client::new()).await?;

        let state = Self::from_parts(config, storage, users, providers);
        spawn_purge(cancel, state.storage.clone());
        Ok(state)
    }

    pub fn from_parts(
        config: Config,
        storage: Storage,
        users: UserRepository,
        providers: Providers,
    ) -> Self {
        let tokens = TokenIssuer::new(&config);
        Self {
            config: Arc::new(config),
            storage,
            users,
            providers,
            tokens,
        }
    }
}

fn spawn_purge(cancel: CancellationToken, storage: Storage) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => match storage.purge_expired().await {
                    Ok(0) => {}
                    Ok(purged) => tracing::debug!(purged, "purged expired entries"),
                    Err(err) => tracing::warn!(error = %err, "failed to purge expired entries"),
                },
            }
        }
    });
}

impl FromRef<AppState> for Arc<Config> {
    fn from_ref(input: &AppState) -> Self {
        input.config.clone()
    }
}

impl FromRef<AppState> for Storage {
    fn from_ref(input: &AppState) -> Self {
        input.storage.clone()
    }
}

impl FromRef<AppState> for UserRepository {
    fn from_ref(input: &AppState) -> Self {
        input.users.clone()
    }
}

impl FromRef<AppState> for Providers {
    fn from_ref(input: &AppState) -> Self {
        input.providers.clone()
    }
}

impl FromRef<AppState> for TokenIssuer {
    fn from_ref(input: &AppState) -> Self {
        input.tokens.clone()
    }
}
