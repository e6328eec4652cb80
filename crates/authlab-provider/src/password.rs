use std::{collections::HashMap, ops::Deref, sync::Arc, time::Duration};

use authlab_core::{
    Error, Error400, Error404, GeneralProvider, GeneralStorage, Identity, PasswordProviderConfig,
    ProviderStep, ThemeConfig,
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::ui;

/// Email one-time-code login. Codes are written to the log instead of being mailed.
#[derive(Clone)]
pub struct PasswordProvider(pub(crate) Arc<InnerPassword>);

impl Deref for PasswordProvider {
    type Target = InnerPassword;

    fn deref(&self) -> &Self::Target {
        Arc::as_ref(&self.0)
    }
}

pub struct InnerPassword {
    pub(crate) name: String,
    pub(crate) config: PasswordProviderConfig,
    pub(crate) theme: ThemeConfig,
    pub(crate) ttl: Duration,
}

/// Wrong codes allowed before the challenge is dropped.
pub const MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordChallenge {
    pub email: String,
    pub code: String,
    #[serde(default)]
    pub attempts: u32,
}

pub fn challenge_key(authorization_id: &str) -> String {
    format!("password/{authorization_id}")
}

impl PasswordProvider {
    pub fn new(
        name: impl Into<String>,
        config: PasswordProviderConfig,
        theme: ThemeConfig,
        ttl: Duration,
    ) -> Self {
        Self(Arc::new(InnerPassword {
            name: name.into(),
            config,
            theme,
            ttl,
        }))
    }
}

impl InnerPassword {
    fn generate_code(&self) -> String {
        let mut rng = rand::rng();
        (0..self.config.code_length)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect()
    }

    fn send_code(&self, email: &str, code: &str) {
        tracing::info!(provider = %self.name, "Sending code {} to {}", code, email);
    }

    fn email_form(&self, status: StatusCode, error: Option<&str>) -> Response {
        let body = format!(
            r#"{error}<form method="post" action="/{name}/authorize">
<input type="hidden" name="action" value="send">
<input type="email" name="email" placeholder="Email" autofocus required>
<button type="submit">Continue</button>
</form>"#,
            error = ui::error_line(error),
            name = ui::escape(&self.name),
        );
        (status, ui::page(&self.theme, "Sign in", &body)).into_response()
    }

    fn code_form(&self, status: StatusCode, email: &str, error: Option<&str>) -> Response {
        let body = format!(
            r#"{error}<p>We sent a code to {email_text}</p>
<form method="post" action="/{name}/authorize">
<input type="hidden" name="action" value="verify">
<input type="text" name="code" placeholder="{input_code}" inputmode="numeric" autocomplete="one-time-code" autofocus required>
<button type="submit">Verify</button>
</form>
<form method="post" action="/{name}/authorize">
<input type="hidden" name="action" value="send">
<input type="hidden" name="email" value="{email_attr}">
<button type="submit" class="link">Resend code</button>
</form>"#,
            error = ui::error_line(error),
            email_text = ui::escape(email),
            email_attr = ui::escape(email),
            input_code = ui::escape(&self.config.input_code),
            name = ui::escape(&self.name),
        );
        (status, ui::page(&self.theme, "Enter code", &body)).into_response()
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

impl GeneralProvider for PasswordProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn authorize<S: GeneralStorage>(
        &self,
        _storage: &S,
        _authorization_id: &str,
    ) -> Result<ProviderStep, Error> {
        Ok(ProviderStep::Respond(self.email_form(StatusCode::OK, None)))
    }

    async fn submit<S: GeneralStorage>(
        &self,
        storage: &S,
        authorization_id: &str,
        form: &HashMap<String, String>,
    ) -> Result<ProviderStep, Error> {
        let key = challenge_key(authorization_id);
        match form.get("action").map(String::as_str) {
            Some("send") => {
                let email = form.get("email").map(|email| email.trim()).unwrap_or_default();
                if !looks_like_email(email) {
                    return Ok(ProviderStep::Respond(self.email_form(
                        StatusCode::BAD_REQUEST,
                        Some("Enter a valid email address"),
                    )));
                }
                let challenge = PasswordChallenge {
                    email: email.to_string(),
                    code: self.generate_code(),
                    attempts: 0,
                };
                storage.set_json(&key, &challenge, Some(self.ttl)).await?;
                self.send_code(&challenge.email, &challenge.code);
                Ok(ProviderStep::Respond(self.code_form(
                    StatusCode::OK,
                    &challenge.email,
                    None,
                )))
            }
            Some("verify") => {
                let Some(mut challenge) = storage.get_json::<PasswordChallenge>(&key).await? else {
                    return Ok(ProviderStep::Respond(self.email_form(
                        StatusCode::BAD_REQUEST,
                        Some("Your code expired, request a new one"),
                    )));
                };
                let code = form.get("code").map(|code| code.trim()).unwrap_or_default();
                let matches = !code.is_empty()
                    && code.as_bytes().ct_eq(challenge.code.as_bytes()).unwrap_u8() == 1;
                if !matches {
                    challenge.attempts += 1;
                    if challenge.attempts >= MAX_ATTEMPTS {
                        tracing::warn!(email = %challenge.email, "too many wrong codes, challenge dropped");
                        storage.remove(&key).await?;
                        return Ok(ProviderStep::Respond(self.email_form(
                            StatusCode::BAD_REQUEST,
                            Some("Too many attempts, request a new code"),
                        )));
                    }
                    storage.set_json(&key, &challenge, Some(self.ttl)).await?;
                    return Ok(ProviderStep::Respond(self.code_form(
                        StatusCode::BAD_REQUEST,
                        &challenge.email,
                        Some("Invalid code"),
                    )));
                }
                storage.remove(&key).await?;
                Ok(ProviderStep::Complete {
                    authorization_id: authorization_id.to_string(),
                    identity: Identity {
                        provider: self.name.clone(),
                        email: challenge.email,
                    },
                })
            }
            _ => Err(Error400::MissingParameter("action").into()),
        }
    }

    async fn callback<S: GeneralStorage>(
        &self,
        _storage: &S,
        _query: &HashMap<String, String>,
    ) -> Result<ProviderStep, Error> {
        Err(Error404::ProviderStepNotFound {
            provider: self.name.clone(),
            step: "callback",
        }
        .into())
    }
}
