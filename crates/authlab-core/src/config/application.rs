use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApplicationConfig {
    pub log_filter: Option<String>,
    #[serde(default)]
    pub prometheus: bool,
    #[serde(default = "default_health_check")]
    pub health_check: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_filter: None,
            prometheus: false,
            health_check: default_health_check(),
        }
    }
}

fn default_health_check() -> bool {
    true
}
