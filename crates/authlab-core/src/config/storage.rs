use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum StorageConfig {
    /// Process local, lost on restart. Single replica only.
    #[default]
    #[serde(rename = "memory")]
    Memory,
    /// Key/value table inside the configured database.
    #[serde(rename = "sqlite")]
    Sqlite,
}
