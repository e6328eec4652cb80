use axum::response::Response;
use serde::{Deserialize, Serialize};

/// Identity payload handed back to clients once authentication succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: UserProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProperties {
    pub id: String,
}

impl Subject {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            kind: "user".to_string(),
            properties: UserProperties { id: id.into() },
        }
    }

    /// Value used as the `sub` claim.
    pub fn subject_id(&self) -> String {
        format!("{}:{}", self.kind, self.properties.id)
    }
}

/// What an upstream provider proved about the end user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub provider: String,
    pub email: String,
}

/// Pending `/authorize` request of a client, kept until a provider completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub response_type: String,
    pub state: Option<String>,
    pub scope: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

/// Issued authorization code, exchanged exactly once at `/token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCode {
    pub client_id: String,
    pub redirect_uri: String,
    pub subject: Subject,
    pub scope: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    pub client_id: String,
    pub subject: Subject,
    pub scope: Option<String>,
}

/// Outcome of a single provider step.
pub enum ProviderStep {
    /// The provider needs another round trip with the browser (page or redirect).
    Respond(Response),
    Complete {
        authorization_id: String,
        identity: Identity,
    },
}

pub fn authorization_key(authorization_id: &str) -> String {
    format!("authorization/{authorization_id}")
}

pub fn code_key(code: &str) -> String {
    format!("code/{code}")
}

pub fn refresh_key(token: &str) -> String {
    format!("refresh/{token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_serializes_with_type_tag() {
        let subject = Subject::user("abc123");
        let value = serde_json::to_value(&subject).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "user", "properties": {"id": "abc123"}})
        );
        assert_eq!(subject.subject_id(), "user:abc123");
    }
}
