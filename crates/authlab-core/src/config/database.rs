use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Private in-memory database, gone with the process.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_url() -> String {
    "sqlite://authlab.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_database_survives_restarts() {
        let config: DatabaseConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(!config.is_in_memory());
        assert_eq!(config.url, "sqlite://authlab.db?mode=rwc");
    }

    #[test]
    fn in_memory_is_detected() {
        assert!(DatabaseConfig::in_memory().is_in_memory());
        assert!(DatabaseConfig {
            url: "sqlite:file:users?mode=memory&cache=shared".to_string(),
            max_connections: 1,
        }
        .is_in_memory());
    }
}
