use crate::{Error, ProviderStep};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{collections::HashMap, future::Future, time::Duration};

/// Key/value adapter the issuer keeps its transient records in.
pub trait GeneralStorage: Clone + Send + Sync + 'static {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>, Error>> + Send;

    fn set(
        &self,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), Error>> + Send;

    /// Reads and removes in one step; one-time records go through here.
    fn take(&self, key: &str) -> impl Future<Output = Result<Option<Value>, Error>> + Send;

    /// Drops expired entries, returns how many were removed.
    fn purge_expired(&self) -> impl Future<Output = Result<u64, Error>> + Send;

    fn get_json<T: DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<T>, Error>> + Send {
        async move {
            match self.get(key).await? {
                Some(value) => Ok(Some(serde_json::from_value(value)?)),
                None => Ok(None),
            }
        }
    }

    fn set_json<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<(), Error>> + Send {
        async move {
            let value = serde_json::to_value(value)?;
            self.set(key, value, ttl).await
        }
    }

    fn take_json<T: DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<T>, Error>> + Send {
        async move {
            match self.take(key).await? {
                Some(value) => Ok(Some(serde_json::from_value(value)?)),
                None => Ok(None),
            }
        }
    }
}

/// Upstream identity source. Every step is addressed as `/{name}/authorize` or
/// `/{name}/callback` by the issuer router.
pub trait GeneralProvider {
    fn name(&self) -> &str;

    /// `GET /{name}/authorize`
    fn authorize<S: GeneralStorage>(
        &self,
        storage: &S,
        authorization_id: &str,
    ) -> impl Future<Output = Result<ProviderStep, Error>> + Send;

    /// `POST /{name}/authorize`
    fn submit<S: GeneralStorage>(
        &self,
        storage: &S,
        authorization_id: &str,
        form: &HashMap<String, String>,
    ) -> impl Future<Output = Result<ProviderStep, Error>> + Send;

    /// `GET /{name}/callback`
    fn callback<S: GeneralStorage>(
        &self,
        storage: &S,
        query: &HashMap<String, String>,
    ) -> impl Future<Output = Result<ProviderStep, Error>> + Send;
}
